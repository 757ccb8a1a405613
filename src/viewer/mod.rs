//! Document viewer: camera, zoom, reader theme and the content box.

mod camera;
mod content;
pub mod tools;
mod zoom;

pub use camera::{ContentFrameParams, ReaderCamera, ViewerScroll};
pub use content::{ContentExtent, ContentRoot};
pub use zoom::ZoomLevel;

use bevy::prelude::*;

use crate::annotations::AnnotationSet;
use crate::theme::{READER_BACKGROUND_DARK, READER_BACKGROUND_LIGHT};

/// Reader color scheme. Dark by default.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeMode {
    pub dark: bool,
}

impl Default for ThemeMode {
    fn default() -> Self {
        Self { dark: true }
    }
}

impl ThemeMode {
    pub fn toggle(&mut self) {
        self.dark = !self.dark;
    }

    pub fn background(&self) -> Color {
        if self.dark {
            READER_BACKGROUND_DARK
        } else {
            READER_BACKGROUND_LIGHT
        }
    }
}

fn sync_clear_color(theme: Res<ThemeMode>, mut clear_color: ResMut<ClearColor>) {
    if theme.is_changed() {
        clear_color.0 = theme.background();
    }
}

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<tools::ToolState>()
            .init_resource::<ZoomLevel>()
            .init_resource::<ThemeMode>()
            .init_resource::<ViewerScroll>()
            .insert_resource(ClearColor(ThemeMode::default().background()))
            .add_systems(Startup, camera::spawn_camera)
            .add_systems(
                Update,
                (
                    tools::handle_tool_shortcuts,
                    tools::update_cursor_icon,
                    sync_clear_color,
                    content::rebuild_content,
                    content::measure_text_content,
                    camera::reset_scroll_on_document_change,
                    camera::camera_pan,
                    camera::camera_scroll,
                    camera::apply_camera,
                )
                    .chain()
                    .before(AnnotationSet::Input),
            );
    }
}
