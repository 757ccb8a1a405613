//! Highlight stroke data types.

use bevy::prelude::*;
use bevy_egui::egui;
use serde::{Deserialize, Serialize};

/// Unique identifier of a committed stroke.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeId(pub String);

impl StrokeId {
    pub fn generate() -> Self {
        Self(format!("path-{}", uuid::Uuid::new_v4()))
    }
}

/// Straight sRGBA color token stored with each stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeColor(pub [f32; 4]);

impl StrokeColor {
    pub const fn srgba(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self([red, green, blue, alpha])
    }

    pub fn to_color(self) -> Color {
        let [r, g, b, a] = self.0;
        Color::srgba(r, g, b, a)
    }

    pub fn to_egui(self) -> egui::Color32 {
        let [r, g, b, a] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

/// A committed freehand highlight.
///
/// Points are in document space: relative to the top-left corner of the
/// unscaled content box, y growing downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub points: Vec<Vec2>,
    pub color: StrokeColor,
    pub size: f32,
}

impl Stroke {
    pub fn start(point: Vec2, color: StrokeColor, size: f32) -> Self {
        Self {
            id: StrokeId::generate(),
            points: vec![point],
            color,
            size,
        }
    }
}
