//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1280.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Smallest zoom factor reachable from the toolbar
pub const ZOOM_MIN: f32 = 0.25;

/// Largest zoom factor reachable from the toolbar
pub const ZOOM_MAX: f32 = 3.0;

/// Zoom increment per toolbar click or ctrl+wheel notch
pub const ZOOM_STEP: f32 = 0.25;

/// Highlighter stroke widths offered by the toolbar (document units)
pub const HIGHLIGHT_SIZES: [f32; 4] = [16.0, 24.0, 32.0, 40.0];

/// Slider step between highlighter sizes
pub const HIGHLIGHT_SIZE_STEP: f32 = 8.0;

/// Spotlight radius range in screen pixels
pub const SPOTLIGHT_RADIUS_MIN: f32 = 20.0;
pub const SPOTLIGHT_RADIUS_MAX: f32 = 400.0;

/// Default spotlight radius in screen pixels
pub const SPOTLIGHT_RADIUS_DEFAULT: f32 = 100.0;

/// Natural width of the content box; pages are scaled to fit it
pub const CONTENT_WIDTH: f32 = 896.0;

/// Padding around text documents inside the content box
pub const TEXT_PADDING: f32 = 48.0;

/// Font size for text documents
pub const TEXT_FONT_SIZE: f32 = 18.0;

/// Blank space above the content box in screen pixels
pub const CONTENT_TOP_MARGIN: f32 = 32.0;

/// Scale at which PDF pages are rasterized
pub const PDF_RENDER_SCALE: f32 = 1.5;

/// Reading speed used to estimate how long an utterance lasts
pub const SPEECH_WORDS_PER_MINUTE: f32 = 150.0;

/// Shortest time an utterance is considered to take, in seconds
pub const SPEECH_MIN_SECONDS: f32 = 1.0;

/// Model used for assistant queries
pub const AI_MODEL: &str = "gemini-2.5-flash";

/// File extensions accepted by the uploader
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["pdf", "docx", "txt", "pptx", "xlsx", "epub"];

/// Vertical gap between rendered pages (document units)
pub const PAGE_GAP: f32 = 16.0;

/// Document units scrolled per mouse wheel line
pub const SCROLL_LINE_STEP: f32 = 48.0;
