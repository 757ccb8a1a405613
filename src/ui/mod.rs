mod assistant_panel;
mod gallery;
mod notices;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::annotations::ChromeSignal;

/// Visibility of the chrome around the document.
///
/// The toolbar gets out of the way while a highlight is being drawn.
#[derive(Resource, Default)]
pub struct ChromeState {
    pub suppressed: bool,
}

impl ChromeState {
    pub fn apply(&mut self, signal: ChromeSignal) {
        self.suppressed = signal == ChromeSignal::Suppress;
    }
}

fn handle_chrome_signals(mut signals: MessageReader<ChromeSignal>, mut chrome: ResMut<ChromeState>) {
    for signal in signals.read() {
        chrome.apply(*signal);
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChromeState>()
            .init_resource::<toolbar::UploadDialog>()
            .add_systems(Update, handle_chrome_signals)
            .add_systems(
                EguiPrimaryContextPass,
                (toolbar::toolbar_ui, toolbar::tool_settings_ui).chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    gallery::upload_screen_ui,
                    gallery::gallery_window_ui,
                    assistant_panel::assistant_panel_ui,
                    assistant_panel::caption_ui,
                    notices::storage_error_banner_ui,
                    notices::config_reset_notification_ui,
                )
                    .after(toolbar::tool_settings_ui),
            );
    }
}
