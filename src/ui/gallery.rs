use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::constants::SUPPORTED_EXTENSIONS;
use crate::documents::{
    ActiveDocument, DeleteDocumentRequest, Gallery, GalleryWindow, OpenDocumentRequest,
    UploadStatus,
};
use crate::storage::StorageStatus;
use crate::theme::ui as colors;

use super::toolbar::UploadDialog;

fn supported_formats_hint() -> String {
    let formats: Vec<String> = SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_uppercase())
        .collect();
    format!("Supported formats: {}", formats.join(", "))
}

fn upload_status_ui(ui: &mut egui::Ui, status: &UploadStatus) {
    if let Some(name) = &status.in_flight {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Converting {}...", name));
            if status.queued_len() > 0 {
                ui.label(
                    egui::RichText::new(format!("{} more queued", status.queued_len()))
                        .color(colors::HINT_TEXT)
                        .size(11.0),
                );
            }
        });
    }
    if let Some(error) = &status.error {
        ui.colored_label(colors::ERROR_TEXT, error);
    }
}

/// Landing screen shown while the gallery is empty
pub fn upload_screen_ui(
    mut contexts: EguiContexts,
    gallery: Res<Gallery>,
    storage_status: Res<StorageStatus>,
    upload_status: Res<UploadStatus>,
    mut upload_dialog: ResMut<UploadDialog>,
) -> Result {
    if !gallery.is_empty() {
        // Conversions started from the toolbar still report progress
        if upload_status.is_loading() || upload_status.error.is_some() {
            egui::Window::new("Upload")
                .collapsible(false)
                .resizable(false)
                .title_bar(false)
                .anchor(egui::Align2::CENTER_TOP, [0.0, 96.0])
                .show(contexts.ctx_mut()?, |ui| {
                    upload_status_ui(ui, &upload_status);
                });
        }
        return Ok(());
    }

    // Nothing to offer until the stored library has been read
    if !storage_status.loaded {
        return Ok(());
    }

    egui::Area::new(egui::Id::new("upload_screen"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::Frame::popup(ui.style())
                .inner_margin(egui::Margin::same(24))
                .show(ui, |ui| {
                    ui.set_min_width(360.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("DocPresenter");
                        ui.add_space(8.0);
                        ui.label("Upload a document to start presenting.");
                        ui.label(
                            egui::RichText::new(supported_formats_hint())
                                .color(colors::HINT_TEXT)
                                .size(11.0),
                        );
                        ui.add_space(12.0);

                        let busy =
                            upload_status.is_loading() || upload_dialog.pending_browse.is_some();
                        if ui
                            .add_enabled(
                                !busy,
                                egui::Button::new("Choose File...").min_size(egui::vec2(160.0, 32.0)),
                            )
                            .clicked()
                        {
                            upload_dialog.open();
                        }
                        ui.label(
                            egui::RichText::new("or drop a file onto the window")
                                .color(colors::HINT_TEXT)
                                .size(11.0),
                        );

                        ui.add_space(8.0);
                        upload_status_ui(ui, &upload_status);
                    });
                });
        });

    Ok(())
}

/// Window listing every uploaded document
pub fn gallery_window_ui(
    mut contexts: EguiContexts,
    gallery: Res<Gallery>,
    active: Res<ActiveDocument>,
    mut window: ResMut<GalleryWindow>,
    mut open_events: MessageWriter<OpenDocumentRequest>,
    mut delete_events: MessageWriter<DeleteDocumentRequest>,
) -> Result {
    if !window.open || gallery.is_empty() {
        return Ok(());
    }

    let mut is_open = true;
    egui::Window::new("Gallery")
        .open(&mut is_open)
        .collapsible(false)
        .resizable(true)
        .default_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
                for item in gallery.items() {
                    ui.horizontal(|ui| {
                        let ext = item.kind.extension();
                        ui.label(
                            egui::RichText::new(ext.to_uppercase())
                                .strong()
                                .size(11.0)
                                .color(colors::kind::color_for(ext)),
                        );

                        let selected = active.is(&item.id);
                        if ui.selectable_label(selected, &item.name).clicked() {
                            open_events.write(OpenDocumentRequest {
                                id: item.id.clone(),
                            });
                        }

                        if let Some(pages) = item.page_count {
                            ui.label(
                                egui::RichText::new(format!("{} pages", pages))
                                    .color(colors::HINT_TEXT)
                                    .size(11.0),
                            );
                        }

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui
                                .small_button("Delete")
                                .on_hover_text("Remove the document and its highlights")
                                .clicked()
                            {
                                delete_events.write(DeleteDocumentRequest {
                                    id: item.id.clone(),
                                });
                            }
                        });
                    });
                }
            });
        });

    if !is_open {
        window.open = false;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_hint_lists_every_extension() {
        let hint = supported_formats_hint();
        for ext in SUPPORTED_EXTENSIONS {
            assert!(hint.contains(&ext.to_uppercase()));
        }
    }
}
