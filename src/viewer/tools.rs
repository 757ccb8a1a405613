use bevy::prelude::*;
use bevy::window::{CursorIcon, CursorOptions, PrimaryWindow, SystemCursorIcon};
use bevy_egui::EguiContexts;
use serde::{Deserialize, Serialize};

use crate::annotations::StrokeColor;
use crate::constants::{
    HIGHLIGHT_SIZES, SPOTLIGHT_RADIUS_DEFAULT, SPOTLIGHT_RADIUS_MAX, SPOTLIGHT_RADIUS_MIN,
};
use crate::theme::HIGHLIGHT_PALETTE;

use super::zoom::ZoomLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Highlight,
    Pointer,
    Spotlight,
    #[default]
    None,
}

impl Tool {
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Highlight => "Highlighter (H)",
            Tool::Pointer => "Laser Pointer (P)",
            Tool::Spotlight => "Spotlight (S)",
            Tool::None => "None (Esc)",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Tool::Highlight => CursorIcon::System(SystemCursorIcon::Crosshair),
            Tool::Pointer | Tool::Spotlight | Tool::None => {
                CursorIcon::System(SystemCursorIcon::Default)
            }
        }
    }

    /// Tools with a toolbar button.
    pub fn all() -> &'static [Tool] {
        &[Tool::Highlight, Tool::Pointer, Tool::Spotlight]
    }

    pub fn is_presentation_aid(&self) -> bool {
        matches!(self, Tool::Pointer | Tool::Spotlight)
    }
}

/// Active tool plus the highlighter and spotlight settings.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolState {
    active: Tool,
    color: StrokeColor,
    size: f32,
    spotlight_radius: f32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            active: Tool::None,
            color: HIGHLIGHT_PALETTE[0].0,
            size: HIGHLIGHT_SIZES[1],
            spotlight_radius: SPOTLIGHT_RADIUS_DEFAULT,
        }
    }
}

impl ToolState {
    pub fn active(&self) -> Tool {
        self.active
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn spotlight_radius(&self) -> f32 {
        self.spotlight_radius
    }

    /// Select a tool; selecting the active one toggles back to `Tool::None`.
    pub fn select(&mut self, tool: Tool) {
        self.active = if self.active == tool { Tool::None } else { tool };
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }

    /// Snap to the closest offered highlighter size.
    pub fn set_size(&mut self, size: f32) {
        self.size = HIGHLIGHT_SIZES
            .iter()
            .copied()
            .min_by(|a, b| (a - size).abs().total_cmp(&(b - size).abs()))
            .unwrap_or(HIGHLIGHT_SIZES[1]);
    }

    pub fn set_spotlight_radius(&mut self, radius: f32) {
        self.spotlight_radius = radius
            .round()
            .clamp(SPOTLIGHT_RADIUS_MIN, SPOTLIGHT_RADIUS_MAX);
    }

    /// Re-apply setters to values read from disk.
    pub fn sanitized(mut self) -> Self {
        self.set_size(self.size);
        self.set_spotlight_radius(self.spotlight_radius);
        self
    }
}

pub fn handle_tool_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut tools: ResMut<ToolState>,
    mut zoom: ResMut<ZoomLevel>,
    mut contexts: EguiContexts,
) {
    // Don't change tools if typing in a text field
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }

    if keyboard.just_pressed(KeyCode::KeyH) {
        tools.select(Tool::Highlight);
    } else if keyboard.just_pressed(KeyCode::KeyP) {
        tools.select(Tool::Pointer);
    } else if keyboard.just_pressed(KeyCode::KeyS) {
        tools.select(Tool::Spotlight);
    } else if keyboard.just_pressed(KeyCode::Escape) && tools.active() != Tool::None {
        let current = tools.active();
        tools.select(current);
    }

    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    if ctrl && (keyboard.just_pressed(KeyCode::Equal) || keyboard.just_pressed(KeyCode::NumpadAdd)) {
        zoom.zoom_in();
    } else if ctrl
        && (keyboard.just_pressed(KeyCode::Minus) || keyboard.just_pressed(KeyCode::NumpadSubtract))
    {
        zoom.zoom_out();
    } else if ctrl && keyboard.just_pressed(KeyCode::Digit0) {
        zoom.reset();
    }
}

pub fn update_cursor_icon(
    tools: Res<ToolState>,
    mut window_query: Query<(Entity, &mut CursorOptions), With<PrimaryWindow>>,
    mut commands: Commands,
    mut contexts: EguiContexts,
) {
    let Ok((entity, mut cursor_options)) = window_query.single_mut() else {
        return;
    };

    // Use default cursor over UI, tool cursor over the document
    let over_ui = contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false);

    // The presentation aids replace the system cursor
    let visible = over_ui || !tools.active().is_presentation_aid();
    if cursor_options.visible != visible {
        cursor_options.visible = visible;
    }

    if over_ui {
        commands
            .entity(entity)
            .insert(CursorIcon::System(SystemCursorIcon::Default));
        return;
    }

    commands.entity(entity).insert(tools.active().cursor_icon());
}
