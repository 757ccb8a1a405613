use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};

/// Content zoom factor, clamped to `ZOOM_MIN..=ZOOM_MAX`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoomLevel(f32);

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(1.0)
    }
}

impl ZoomLevel {
    pub fn new(value: f32) -> Self {
        if !value.is_finite() {
            return Self::default();
        }
        Self(value.clamp(ZOOM_MIN, ZOOM_MAX))
    }

    pub fn get(&self) -> f32 {
        self.0
    }

    pub fn zoom_in(&mut self) {
        *self = Self::new(self.0 + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        *self = Self::new(self.0 - ZOOM_STEP);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn can_zoom_in(&self) -> bool {
        self.0 < ZOOM_MAX
    }

    pub fn can_zoom_out(&self) -> bool {
        self.0 > ZOOM_MIN
    }

    pub fn percent(&self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_and_bounds() {
        let mut zoom = ZoomLevel::default();
        zoom.zoom_in();
        assert_eq!(zoom.get(), 1.25);
        for _ in 0..20 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.get(), ZOOM_MAX);
        assert!(!zoom.can_zoom_in());
        for _ in 0..20 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.get(), ZOOM_MIN);
        assert!(!zoom.can_zoom_out());
        zoom.reset();
        assert_eq!(zoom.get(), 1.0);
    }

    #[test]
    fn test_percent() {
        assert_eq!(ZoomLevel::new(0.25).percent(), 25);
        assert_eq!(ZoomLevel::new(2.75).percent(), 275);
    }

    #[test]
    fn test_invalid_values_are_repaired() {
        assert_eq!(ZoomLevel::new(f32::NAN).get(), 1.0);
        assert_eq!(ZoomLevel::new(-4.0).get(), ZOOM_MIN);
        assert_eq!(ZoomLevel::new(12.0).get(), ZOOM_MAX);
    }
}
