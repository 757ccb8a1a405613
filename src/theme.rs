//! Centralized color theme for the application.
//!
//! This module provides all colors used by the reader, the presentation aids
//! and the egui chrome. Modify values here to change the color scheme.

use bevy::prelude::Color;
use bevy_egui::egui;

use crate::annotations::StrokeColor;

// ============================================================================
// Highlighter
// ============================================================================

/// Neon highlighter palette offered by the toolbar, at 50% alpha
pub const HIGHLIGHT_PALETTE: [(StrokeColor, &str); 4] = [
    (StrokeColor::srgba(1.0, 1.0, 0.2, 0.5), "Yellow"),
    (StrokeColor::srgba(0.2, 1.0, 0.2, 0.5), "Green"),
    (StrokeColor::srgba(0.2, 1.0, 1.0, 0.5), "Cyan"),
    (StrokeColor::srgba(1.0, 0.2, 1.0, 0.5), "Magenta"),
];

// ============================================================================
// Presentation Aids
// ============================================================================

/// Outer glow of the laser pointer dot
pub const POINTER_GLOW_OUTER: egui::Color32 = egui::Color32::from_rgba_premultiplied(120, 34, 34, 128);

/// Inner glow of the laser pointer dot
pub const POINTER_GLOW_INNER: egui::Color32 = egui::Color32::from_rgba_premultiplied(167, 48, 48, 179);

/// White center of the laser pointer dot
pub const POINTER_CORE: egui::Color32 = egui::Color32::WHITE;

/// Dark mask drawn around the spotlight cutout
pub const SPOTLIGHT_MASK: egui::Color32 = egui::Color32::from_rgba_premultiplied(0, 0, 0, 217);

// ============================================================================
// Reader
// ============================================================================

/// Window background behind the content box
pub const READER_BACKGROUND_DARK: Color = Color::srgb(0.067, 0.094, 0.153);
pub const READER_BACKGROUND_LIGHT: Color = Color::srgb(0.953, 0.957, 0.965);

/// Paper color of text documents
pub const PAPER_DARK: Color = Color::srgb(0.122, 0.161, 0.216);
pub const PAPER_LIGHT: Color = Color::WHITE;

/// Body text color of text documents
pub const TEXT_DARK: Color = Color::srgb(0.898, 0.906, 0.922);
pub const TEXT_LIGHT: Color = Color::srgb(0.067, 0.094, 0.153);

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Dark grey panel background (toolbar)
    pub const PANEL_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(45, 45, 48);

    /// Light grey for label text
    pub const LABEL_TEXT: egui::Color32 = egui::Color32::LIGHT_GRAY;

    /// Grey for help/hint text
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// White for selected button borders
    pub const SELECTED_BORDER: egui::Color32 = egui::Color32::WHITE;

    /// Dark grey for unselected button borders
    pub const UNSELECTED_BORDER: egui::Color32 = egui::Color32::DARK_GRAY;

    /// Red for error messages
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::RED;

    /// Amber for warning banners
    pub const WARNING_TEXT: egui::Color32 = egui::Color32::from_rgb(240, 180, 60);

    /// Blue accent for the active tool and assistant status
    pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);

    /// Semi-transparent black overlay for modal dialogs
    pub const MODAL_OVERLAY: egui::Color32 = egui::Color32::from_black_alpha(100);

    /// Document kind badge colors
    pub mod kind {
        use bevy_egui::egui;

        pub const PDF: egui::Color32 = egui::Color32::from_rgb(200, 80, 80);
        pub const DOCX: egui::Color32 = egui::Color32::from_rgb(80, 140, 200);
        pub const PPTX: egui::Color32 = egui::Color32::from_rgb(200, 140, 80);
        pub const XLSX: egui::Color32 = egui::Color32::from_rgb(80, 200, 140);
        pub const EPUB: egui::Color32 = egui::Color32::from_rgb(140, 80, 200);
        pub const DEFAULT: egui::Color32 = egui::Color32::from_rgb(128, 128, 128);

        /// Get badge color for a document kind extension
        pub fn color_for(ext: &str) -> egui::Color32 {
            match ext.to_lowercase().as_str() {
                "pdf" => PDF,
                "docx" => DOCX,
                "pptx" => PPTX,
                "xlsx" => XLSX,
                "epub" => EPUB,
                _ => DEFAULT,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_half_transparent() {
        for (color, name) in HIGHLIGHT_PALETTE {
            assert_eq!(color.0[3], 0.5, "{} should be 50% alpha", name);
        }
    }

    #[test]
    fn test_kind_colors_are_case_insensitive() {
        assert_eq!(ui::kind::color_for("PDF"), ui::kind::PDF);
        assert_eq!(ui::kind::color_for("txt"), ui::kind::DEFAULT);
    }
}
