//! Screen to document-space coordinate mapping.
//!
//! The content box is drawn scaled by the zoom factor with its top-left corner
//! at `origin` in window coordinates (logical pixels, y down). Document space
//! is the same box before scaling, so a mapped point stays valid across zoom
//! changes and viewport resizes.

use bevy::prelude::*;

/// One active touch contact reported by the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
}

/// Raw pointer input before any transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPointer<'a> {
    Mouse { position: Vec2 },
    Touch { touches: &'a [TouchPoint] },
}

impl RawPointer<'_> {
    /// Screen position of the pointer. For touch input only the first contact
    /// counts; further contacts are ignored.
    pub fn primary_position(&self) -> Option<Vec2> {
        match self {
            RawPointer::Mouse { position } => Some(*position),
            RawPointer::Touch { touches } => touches.first().map(|t| t.position),
        }
    }
}

/// Placement of the zoomed content box on screen, sampled per event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentFrame {
    /// Top-left corner of the content box in window coordinates.
    pub origin: Vec2,
    pub zoom: f32,
}

impl ContentFrame {
    pub fn new(origin: Vec2, zoom: f32) -> Self {
        Self { origin, zoom }
    }

    pub fn to_document(&self, screen: Vec2) -> Vec2 {
        (screen - self.origin) / self.zoom
    }

    pub fn to_screen(&self, document: Vec2) -> Vec2 {
        document * self.zoom + self.origin
    }
}

/// Map a raw pointer event into document space.
pub fn map_pointer(raw: &RawPointer, frame: &ContentFrame) -> Option<Vec2> {
    raw.primary_position().map(|p| frame.to_document(p))
}
