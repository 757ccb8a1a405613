//! Laser pointer and spotlight presentation aids.
//!
//! Both aids follow the latest pointer position in window coordinates, 1:1
//! with no easing, and are painted on the egui foreground layer without
//! taking input. Nothing here is persisted.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};

use crate::annotations::PointerEvent;
use crate::theme::{POINTER_CORE, POINTER_GLOW_INNER, POINTER_GLOW_OUTER, SPOTLIGHT_MASK};
use crate::viewer::tools::{Tool, ToolState};

/// Radii of the laser pointer rings, outermost first.
const POINTER_RADII: [f32; 3] = [14.0, 9.0, 4.0];

/// Where the aids are drawn before the pointer first moves.
const OFF_SCREEN: Vec2 = Vec2::new(-10_000.0, -10_000.0);

/// Latest pointer position in window coordinates.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct AidPosition(pub Vec2);

impl Default for AidPosition {
    fn default() -> Self {
        Self(OFF_SCREEN)
    }
}

/// Geometry of the spotlight mask as one thick ring.
///
/// The ring's inner edge is the cutout; it is wide enough that its outer edge
/// clears every corner of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotlightRing {
    pub center: Vec2,
    pub radius: f32,
    pub width: f32,
}

impl SpotlightRing {
    pub fn new(center: Vec2, cutout: f32, viewport: Vec2) -> Self {
        let far_corner = [
            Vec2::ZERO,
            Vec2::new(viewport.x, 0.0),
            Vec2::new(0.0, viewport.y),
            viewport,
        ]
        .into_iter()
        .map(|corner| corner.distance(center))
        .fold(0.0, f32::max);
        let width = (far_corner - cutout).max(0.0) + 2.0;
        Self {
            center,
            radius: cutout + width * 0.5,
            width,
        }
    }

    pub fn inner_radius(&self) -> f32 {
        self.radius - self.width * 0.5
    }

    pub fn outer_radius(&self) -> f32 {
        self.radius + self.width * 0.5
    }
}

fn track_pointer(mut events: MessageReader<PointerEvent>, mut position: ResMut<AidPosition>) {
    if let Some(last) = events.read().last() {
        position.0 = last.position;
    }
}

fn draw_presentation_aids(
    mut contexts: EguiContexts,
    tools: Res<ToolState>,
    position: Res<AidPosition>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) -> Result {
    let tool = tools.active();
    if !tool.is_presentation_aid() {
        return Ok(());
    }

    let ctx = contexts.ctx_mut()?;
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("presentation_aids"),
    ));
    let center = egui::pos2(position.0.x, position.0.y);

    match tool {
        Tool::Pointer => {
            let colors = [POINTER_GLOW_OUTER, POINTER_GLOW_INNER, POINTER_CORE];
            for (radius, color) in POINTER_RADII.into_iter().zip(colors) {
                painter.circle_filled(center, radius, color);
            }
        }
        Tool::Spotlight => {
            let Ok(window) = window_query.single() else {
                return Ok(());
            };
            let ring = SpotlightRing::new(position.0, tools.spotlight_radius(), window.size());
            painter.circle_stroke(
                center,
                ring.radius,
                egui::Stroke::new(ring.width, SPOTLIGHT_MASK),
            );
        }
        Tool::Highlight | Tool::None => {}
    }
    Ok(())
}

pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AidPosition>()
            .add_systems(Update, track_pointer)
            .add_systems(EguiPrimaryContextPass, draw_presentation_aids);
    }
}
