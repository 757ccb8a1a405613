//! Freehand highlight engine.
//!
//! Pointer input is mapped into document space, shaped into smoothed paths,
//! committed per document and re-rendered as vector meshes under the zoom.

pub mod coords;
mod draw_tool;
pub mod input;
pub mod overlay;
pub mod path;
mod rendering;
pub mod session;
mod store;
mod stroke;

pub use draw_tool::{ChromeSignal, ClearHighlightsRequest};
pub use input::PointerEvent;
pub use overlay::{ContentResizeObserver, OverlayLayout};
pub use session::DrawSession;
pub use store::StrokeStore;
pub use stroke::{Stroke, StrokeColor, StrokeId};

use bevy::prelude::*;

/// Ordering of the annotation pipeline within a frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationSet {
    Input,
    Draw,
    Render,
}

pub struct AnnotationPlugin;

impl Plugin for AnnotationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StrokeStore>()
            .init_resource::<DrawSession>()
            .init_resource::<input::PointerTracker>()
            .init_resource::<ContentResizeObserver>()
            .init_resource::<OverlayLayout>()
            .add_message::<PointerEvent>()
            .add_message::<ChromeSignal>()
            .add_message::<ClearHighlightsRequest>()
            .configure_sets(
                Update,
                (AnnotationSet::Input, AnnotationSet::Draw, AnnotationSet::Render).chain(),
            )
            .add_systems(
                Update,
                (
                    input::collect_pointer_events,
                    overlay::observe_content_roots,
                    overlay::measure_content,
                    overlay::apply_resize_records,
                )
                    .chain()
                    .in_set(AnnotationSet::Input),
            )
            .add_systems(
                Update,
                (
                    draw_tool::abort_on_context_change,
                    draw_tool::handle_draw,
                    draw_tool::clear_highlights.run_if(on_message::<ClearHighlightsRequest>),
                )
                    .chain()
                    .in_set(AnnotationSet::Draw),
            )
            .add_systems(
                Update,
                (
                    rendering::render_committed_strokes,
                    rendering::render_preview_stroke,
                )
                    .chain()
                    .in_set(AnnotationSet::Render),
            );
    }
}
