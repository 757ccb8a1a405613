use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::assistant::{AiStatus, Assistant, ToggleAssistant};
use crate::documents::ActiveDocument;
use crate::speech::{SpeechChannel, SpeechInput, TypedSpeechInput};
use crate::theme::ui as colors;

use super::ChromeState;

fn status_color(status: AiStatus) -> egui::Color32 {
    match status {
        AiStatus::Idle => colors::LABEL_TEXT,
        AiStatus::Listening | AiStatus::Thinking | AiStatus::Speaking => colors::ACCENT,
    }
}

/// Floating assistant button with status, error and the prompt box
pub fn assistant_panel_ui(
    mut contexts: EguiContexts,
    chrome: Res<ChromeState>,
    active: Res<ActiveDocument>,
    assistant: Res<Assistant>,
    mut input: ResMut<TypedSpeechInput>,
    mut toggle_events: MessageWriter<ToggleAssistant>,
) -> Result {
    // The assistant only answers questions about an open document
    if chrome.suppressed || active.id().is_none() {
        return Ok(());
    }

    let status = assistant.status();
    egui::Area::new(egui::Id::new("assistant_panel"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -16.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(320.0);

                if input.is_listening() {
                    ui.label(egui::RichText::new("Ask about this document").strong());
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut input.draft)
                            .hint_text("Type your question...")
                            .desired_width(280.0),
                    );
                    let entered =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let send = ui.button("Send").clicked();
                    if entered || send {
                        input.submit();
                    }
                    ui.add_space(6.0);
                }

                ui.horizontal(|ui| {
                    let label = if status == AiStatus::Idle {
                        status.label()
                    } else {
                        "Stop"
                    };
                    if ui
                        .add(egui::Button::new(label).selected(status != AiStatus::Idle))
                        .clicked()
                    {
                        toggle_events.write(ToggleAssistant);
                    }
                    if status != AiStatus::Idle {
                        ui.colored_label(status_color(status), status.label());
                    }
                });

                if let Some(error) = &assistant.error {
                    ui.colored_label(colors::ERROR_TEXT, error);
                }
            });
        });

    Ok(())
}

/// Caption strip for whatever the speech channel is saying
pub fn caption_ui(mut contexts: EguiContexts, speech: Res<SpeechChannel>) -> Result {
    let Some(caption) = speech.caption() else {
        return Ok(());
    };

    egui::Area::new(egui::Id::new("speech_caption"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -24.0])
        .interactable(false)
        .show(contexts.ctx_mut()?, |ui| {
            egui::Frame::popup(ui.style())
                .fill(colors::MODAL_OVERLAY)
                .inner_margin(egui::Margin::symmetric(16, 10))
                .show(ui, |ui| {
                    ui.set_max_width(640.0);
                    ui.label(egui::RichText::new(caption).size(15.0));
                    if speech.is_paused() {
                        ui.label(
                            egui::RichText::new("Paused")
                                .color(colors::HINT_TEXT)
                                .size(11.0),
                        );
                    }
                });
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_states_use_accent() {
        assert_eq!(status_color(AiStatus::Idle), colors::LABEL_TEXT);
        assert_eq!(status_color(AiStatus::Thinking), colors::ACCENT);
    }
}
