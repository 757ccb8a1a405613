use std::path::PathBuf;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;

use crate::annotations::ClearHighlightsRequest;
use crate::constants::{
    HIGHLIGHT_SIZES, HIGHLIGHT_SIZE_STEP, SPOTLIGHT_RADIUS_MAX, SPOTLIGHT_RADIUS_MIN,
    SUPPORTED_EXTENSIONS,
};
use crate::documents::{
    ActiveDocument, DeleteDocumentRequest, Gallery, GalleryWindow, UploadRequest, UploadStatus,
};
use crate::speech::{ReadAloud, ReadAloudCommand, ReadAloudState};
use crate::theme::{HIGHLIGHT_PALETTE, ui as colors};
use crate::viewer::tools::{Tool, ToolState};
use crate::viewer::{ThemeMode, ZoomLevel};

use super::ChromeState;

/// Pending native file picker for uploads
#[derive(Resource, Default)]
pub struct UploadDialog {
    pub pending_browse: Option<Task<Option<PathBuf>>>,
}

impl UploadDialog {
    pub fn open(&mut self) {
        if self.pending_browse.is_some() {
            return;
        }
        let task_pool = AsyncComputeTaskPool::get();
        self.pending_browse = Some(task_pool.spawn(async {
            rfd::AsyncFileDialog::new()
                .set_title("Upload Document")
                .add_filter("Documents", &SUPPORTED_EXTENSIONS)
                .pick_file()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }

    /// Poll the picker; yields the chosen path once.
    pub fn poll(&mut self) -> Option<PathBuf> {
        let task = self.pending_browse.as_mut()?;
        let result = future::block_on(future::poll_once(task))?;
        self.pending_browse = None;
        result
    }
}

/// Delete request for the open document, if any.
fn delete_current_request(active: &ActiveDocument) -> Option<DeleteDocumentRequest> {
    active
        .id()
        .map(|id| DeleteDocumentRequest { id: id.clone() })
}

fn tool_button_label(tool: &Tool) -> &'static str {
    match tool {
        Tool::Highlight => "H",
        Tool::Pointer => "P",
        Tool::Spotlight => "S",
        Tool::None => "-",
    }
}

/// Main toolbar: tools, zoom, theme, read aloud and document actions
#[allow(clippy::too_many_arguments)]
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    chrome: Res<ChromeState>,
    mut tools: ResMut<ToolState>,
    mut zoom: ResMut<ZoomLevel>,
    mut theme: ResMut<ThemeMode>,
    active: Res<ActiveDocument>,
    gallery: Res<Gallery>,
    mut gallery_window: ResMut<GalleryWindow>,
    mut upload_dialog: ResMut<UploadDialog>,
    upload_status: Res<UploadStatus>,
    read_aloud: Res<ReadAloud>,
    mut upload_events: MessageWriter<UploadRequest>,
    mut read_aloud_events: MessageWriter<ReadAloudCommand>,
    mut clear_events: MessageWriter<ClearHighlightsRequest>,
    mut delete_events: MessageWriter<DeleteDocumentRequest>,
) -> Result {
    // Poll before the early return so a picker finishing mid-stroke is not lost
    if let Some(path) = upload_dialog.poll() {
        upload_events.write(UploadRequest { path });
    }

    if chrome.suppressed {
        return Ok(());
    }

    let active_item = active.id().and_then(|id| gallery.get(id));

    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                for tool in Tool::all() {
                    let selected = tools.active() == *tool;
                    let button = egui::Button::new(
                        egui::RichText::new(tool_button_label(tool)).size(14.0).strong(),
                    )
                    .min_size(egui::vec2(28.0, 28.0))
                    .selected(selected);

                    let response = ui.add(button);
                    if response.clicked() {
                        tools.select(*tool);
                    }
                    response.on_hover_text(tool.display_name());
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                // Zoom
                if ui
                    .add_enabled(zoom.can_zoom_out(), egui::Button::new("-"))
                    .on_hover_text("Zoom out")
                    .clicked()
                {
                    zoom.zoom_out();
                }
                let percent = format!("{:.0}%", zoom.get() * 100.0);
                if ui
                    .add(egui::Button::new(percent).min_size(egui::vec2(52.0, 0.0)))
                    .on_hover_text("Reset zoom")
                    .clicked()
                {
                    zoom.reset();
                }
                if ui
                    .add_enabled(zoom.can_zoom_in(), egui::Button::new("+"))
                    .on_hover_text("Zoom in")
                    .clicked()
                {
                    zoom.zoom_in();
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let has_text = active_item.is_some_and(|item| !item.text_content.trim().is_empty());
                match read_aloud.state() {
                    ReadAloudState::Speaking => {
                        if ui.button("Pause").clicked() {
                            read_aloud_events.write(ReadAloudCommand::Pause);
                        }
                    }
                    state => {
                        let label = if state == ReadAloudState::Paused {
                            "Resume"
                        } else {
                            "Read Aloud"
                        };
                        if ui.add_enabled(has_text, egui::Button::new(label)).clicked() {
                            read_aloud_events.write(ReadAloudCommand::Play);
                        }
                    }
                }
                if ui
                    .add_enabled(
                        read_aloud.state() != ReadAloudState::Stopped,
                        egui::Button::new("Stop"),
                    )
                    .clicked()
                {
                    read_aloud_events.write(ReadAloudCommand::Stop);
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                if ui
                    .add_enabled(active_item.is_some(), egui::Button::new("Clear Highlights"))
                    .clicked()
                {
                    clear_events.write(ClearHighlightsRequest);
                }
                if ui
                    .add_enabled(active_item.is_some(), egui::Button::new("Delete Document"))
                    .on_hover_text("Remove the open document and its highlights")
                    .clicked()
                    && let Some(request) = delete_current_request(&active)
                {
                    delete_events.write(request);
                }

                if let Some(item) = active_item {
                    ui.add_space(12.0);
                    ui.label(egui::RichText::new(&item.name).color(colors::LABEL_TEXT));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_label = if theme.dark { "Light" } else { "Dark" };
                    if ui
                        .button(theme_label)
                        .on_hover_text("Toggle reader theme")
                        .clicked()
                    {
                        theme.toggle();
                    }

                    let busy = upload_status.is_loading() || upload_dialog.pending_browse.is_some();
                    if ui
                        .add_enabled(!busy, egui::Button::new("Upload"))
                        .clicked()
                    {
                        upload_dialog.open();
                    }

                    if ui
                        .add(
                            egui::Button::new(format!("Gallery ({})", gallery.len()))
                                .selected(gallery_window.open),
                        )
                        .clicked()
                    {
                        gallery_window.open = !gallery_window.open;
                    }
                });
            });
        });
    Ok(())
}

/// Secondary toolbar showing settings for the active tool
pub fn tool_settings_ui(
    mut contexts: EguiContexts,
    chrome: Res<ChromeState>,
    mut tools: ResMut<ToolState>,
) -> Result {
    if chrome.suppressed {
        return Ok(());
    }
    // Only show settings bar for tools that have settings
    if !matches!(tools.active(), Tool::Highlight | Tool::Spotlight) {
        return Ok(());
    }

    egui::TopBottomPanel::top("tool_settings")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 6))
                .fill(colors::PANEL_BACKGROUND),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;

                match tools.active() {
                    Tool::Highlight => {
                        ui.label(
                            egui::RichText::new("Highlighter Settings:").color(colors::LABEL_TEXT),
                        );
                        ui.add_space(8.0);

                        ui.label("Color:");
                        for (color, name) in HIGHLIGHT_PALETTE {
                            let is_selected = tools.color() == color;
                            let button = egui::Button::new("")
                                .fill(color.to_egui())
                                .min_size(egui::vec2(18.0, 18.0))
                                .stroke(if is_selected {
                                    egui::Stroke::new(2.0, colors::SELECTED_BORDER)
                                } else {
                                    egui::Stroke::new(1.0, colors::UNSELECTED_BORDER)
                                });
                            if ui.add(button).on_hover_text(name).clicked() {
                                tools.set_color(color);
                            }
                        }

                        ui.add_space(12.0);

                        let mut size = tools.size();
                        let range = HIGHLIGHT_SIZES[0]..=HIGHLIGHT_SIZES[HIGHLIGHT_SIZES.len() - 1];
                        if ui
                            .add(
                                egui::Slider::new(&mut size, range)
                                    .step_by(HIGHLIGHT_SIZE_STEP as f64)
                                    .text("Size"),
                            )
                            .changed()
                        {
                            tools.set_size(size);
                        }
                    }
                    Tool::Spotlight => {
                        ui.label(
                            egui::RichText::new("Spotlight Settings:").color(colors::LABEL_TEXT),
                        );
                        ui.add_space(8.0);

                        let mut radius = tools.spotlight_radius();
                        if ui
                            .add(
                                egui::Slider::new(
                                    &mut radius,
                                    SPOTLIGHT_RADIUS_MIN..=SPOTLIGHT_RADIUS_MAX,
                                )
                                .step_by(1.0)
                                .text("Radius"),
                            )
                            .changed()
                        {
                            tools.set_spotlight_radius(radius);
                        }
                    }
                    Tool::Pointer | Tool::None => {}
                }

                ui.add_space(12.0);
                ui.label(
                    egui::RichText::new("H/P/S: Switch tools, Esc: None")
                        .color(colors::HINT_TEXT)
                        .size(11.0),
                );
            });
        });
    Ok(())
}
