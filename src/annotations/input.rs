//! Ordered pointer event stream built from raw window input.
//!
//! Mouse and touch input are merged into a single [`PointerEvent`] stream in
//! arrival order. Only the first active touch contact drives the stream.

use bevy::input::ButtonState;
use bevy::input::mouse::MouseButton;
use bevy::input::touch::TouchPhase;
use bevy::prelude::*;
use bevy::window::WindowEvent;

use super::coords::{RawPointer, TouchPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch,
}

/// Pointer event in window coordinates (logical pixels, y down).
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Vec2,
    pub source: PointerSource,
}

/// Window input relevant to pointer tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    CursorMoved(Vec2),
    PrimaryButton { pressed: bool },
    Touch {
        id: u64,
        phase: TouchPhase,
        position: Vec2,
    },
}

/// Tracks cursor position and active touches between window events.
#[derive(Resource, Debug, Default)]
pub struct PointerTracker {
    cursor: Option<Vec2>,
    touches: Vec<TouchPoint>,
}

impl PointerTracker {
    pub fn translate(&mut self, input: RawInput) -> Option<PointerEvent> {
        match input {
            RawInput::CursorMoved(position) => {
                self.cursor = Some(position);
                Some(PointerEvent {
                    phase: PointerPhase::Move,
                    position,
                    source: PointerSource::Mouse,
                })
            }
            RawInput::PrimaryButton { pressed } => {
                let position = RawPointer::Mouse {
                    position: self.cursor?,
                }
                .primary_position()?;
                Some(PointerEvent {
                    phase: if pressed {
                        PointerPhase::Down
                    } else {
                        PointerPhase::Up
                    },
                    position,
                    source: PointerSource::Mouse,
                })
            }
            RawInput::Touch {
                id,
                phase,
                position,
            } => self.translate_touch(id, phase, position),
        }
    }

    fn translate_touch(&mut self, id: u64, phase: TouchPhase, position: Vec2) -> Option<PointerEvent> {
        let primary = self.touches.first().map(|t| t.id);
        let event = |phase| PointerEvent {
            phase,
            position,
            source: PointerSource::Touch,
        };

        match phase {
            TouchPhase::Started => {
                self.touches.push(TouchPoint { id, position });
                primary.is_none().then(|| event(PointerPhase::Down))
            }
            TouchPhase::Moved => {
                if let Some(touch) = self.touches.iter_mut().find(|t| t.id == id) {
                    touch.position = position;
                }
                if primary != Some(id) {
                    return None;
                }
                let position = RawPointer::Touch {
                    touches: &self.touches,
                }
                .primary_position()?;
                Some(PointerEvent {
                    phase: PointerPhase::Move,
                    position,
                    source: PointerSource::Touch,
                })
            }
            TouchPhase::Ended | TouchPhase::Canceled => {
                self.touches.retain(|t| t.id != id);
                (primary == Some(id)).then(|| event(PointerPhase::Up))
            }
        }
    }
}

/// Convert window events into pointer events, preserving arrival order.
pub fn collect_pointer_events(
    mut window_events: MessageReader<WindowEvent>,
    mut tracker: ResMut<PointerTracker>,
    mut pointer_events: MessageWriter<PointerEvent>,
) {
    for event in window_events.read() {
        let raw = match event {
            WindowEvent::CursorMoved(moved) => RawInput::CursorMoved(moved.position),
            WindowEvent::MouseButtonInput(input) if input.button == MouseButton::Left => {
                RawInput::PrimaryButton {
                    pressed: input.state == ButtonState::Pressed,
                }
            }
            WindowEvent::TouchInput(touch) => RawInput::Touch {
                id: touch.id,
                phase: touch.phase,
                position: touch.position,
            },
            _ => continue,
        };

        if let Some(pointer) = tracker.translate(raw) {
            pointer_events.write(pointer);
        }
    }
}
