//! Highlighter tool: feeds pointer events to the draw session.

use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::documents::ActiveDocument;
use crate::storage::StorageCommand;
use crate::viewer::tools::ToolState;
use crate::viewer::{ContentFrameParams, ZoomLevel};

use super::input::{PointerEvent, PointerPhase};
use super::overlay::OverlayLayout;
use super::session::{DrawContext, DrawEffect, DrawSession};
use super::store::StrokeStore;

/// Request to hide or restore the chrome around the document.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeSignal {
    Suppress,
    Restore,
}

/// Request to remove every highlight of the active document.
#[derive(Message, Debug, Clone, Copy)]
pub struct ClearHighlightsRequest;

fn apply_effects(
    effects: Vec<DrawEffect>,
    chrome: &mut MessageWriter<ChromeSignal>,
    storage: &mut MessageWriter<StorageCommand>,
) {
    for effect in effects {
        match effect {
            DrawEffect::SuppressChrome => {
                chrome.write(ChromeSignal::Suppress);
            }
            DrawEffect::RestoreChrome => {
                chrome.write(ChromeSignal::Restore);
            }
            DrawEffect::Persist { document, strokes } => {
                debug!("Committed stroke on {} ({} total)", document, strokes.len());
                storage.write(StorageCommand::PutHighlights { document, strokes });
            }
        }
    }
}

/// Feed one pointer event to the session. The store is only marked changed
/// when a stroke commits, so idle cursor moves leave the rendered strokes alone.
fn feed_event(
    session: &mut DrawSession,
    event: &PointerEvent,
    ctx: &DrawContext,
    store: &mut impl DetectChangesMut<Inner = StrokeStore>,
) -> Vec<DrawEffect> {
    let effects = session.handle(event, ctx, store.bypass_change_detection());
    if effects
        .iter()
        .any(|effect| matches!(effect, DrawEffect::Persist { .. }))
    {
        store.set_changed();
    }
    effects
}

#[allow(clippy::too_many_arguments)]
pub fn handle_draw(
    mut pointer_events: MessageReader<PointerEvent>,
    mut session: ResMut<DrawSession>,
    mut store: ResMut<StrokeStore>,
    tools: Res<ToolState>,
    zoom: Res<ZoomLevel>,
    active: Res<ActiveDocument>,
    layout: Res<OverlayLayout>,
    frame_params: ContentFrameParams,
    mut contexts: EguiContexts,
    mut chrome: MessageWriter<ChromeSignal>,
    mut storage: MessageWriter<StorageCommand>,
) {
    let over_ui = contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false);

    for event in pointer_events.read() {
        // Clicks on the chrome never start a stroke
        if event.phase == PointerPhase::Down && over_ui {
            continue;
        }
        // The frame is sampled per event; scrolling may move it mid-gesture
        let Some(frame) = frame_params.frame(zoom.get()) else {
            continue;
        };

        let ctx = DrawContext {
            tools: &tools,
            frame,
            document: active.id(),
            content_size: layout.size,
        };
        let effects = feed_event(&mut session, event, &ctx, &mut store);
        apply_effects(effects, &mut chrome, &mut storage);
    }
}

/// Abort an in-progress stroke when the tool or the document changes under it.
pub fn abort_on_context_change(
    tools: Res<ToolState>,
    active: Res<ActiveDocument>,
    mut session: ResMut<DrawSession>,
    mut chrome: MessageWriter<ChromeSignal>,
    mut storage: MessageWriter<StorageCommand>,
) {
    if !session.is_active() {
        return;
    }

    let mut effects = Vec::new();
    if tools.is_changed() {
        effects = session.on_tool_changed(tools.active());
    }
    if active.is_changed() && session.document() != active.id() {
        info!("Active document changed mid-stroke, discarding it");
        effects.extend(session.abort());
    }
    apply_effects(effects, &mut chrome, &mut storage);
}

pub fn clear_highlights(
    mut events: MessageReader<ClearHighlightsRequest>,
    active: Res<ActiveDocument>,
    mut store: ResMut<StrokeStore>,
    mut storage: MessageWriter<StorageCommand>,
) {
    for _ in events.read() {
        let Some(document) = active.id() else {
            continue;
        };
        info!("Clearing highlights of {}", document);
        store.replace_all(document, Vec::new());
        storage.write(StorageCommand::PutHighlights {
            document: document.clone(),
            strokes: Vec::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::coords::ContentFrame;
    use crate::annotations::input::PointerSource;
    use crate::documents::DocumentId;
    use crate::viewer::tools::Tool;

    fn event(phase: PointerPhase, x: f32, y: f32) -> PointerEvent {
        PointerEvent {
            phase,
            position: Vec2::new(x, y),
            source: PointerSource::Mouse,
        }
    }

    fn world_with_store(doc: &DocumentId) -> World {
        let mut world = World::new();
        let mut store = StrokeStore::default();
        store.ensure(doc);
        world.insert_resource(store);
        world.clear_trackers();
        world
    }

    fn feed(
        world: &mut World,
        session: &mut DrawSession,
        tools: &ToolState,
        doc: &DocumentId,
        events: &[PointerEvent],
    ) {
        let ctx = DrawContext {
            tools,
            frame: ContentFrame::new(Vec2::ZERO, 1.0),
            document: Some(doc),
            content_size: Vec2::new(896.0, 1200.0),
        };
        let mut store = world.resource_mut::<StrokeStore>();
        for e in events {
            feed_event(session, e, &ctx, &mut store);
        }
    }

    #[test]
    fn test_idle_cursor_moves_leave_store_unchanged() {
        let doc = DocumentId("file-1-a.txt".to_string());
        let mut world = world_with_store(&doc);
        let mut session = DrawSession::default();
        let tools = ToolState::default();

        feed(
            &mut world,
            &mut session,
            &tools,
            &doc,
            &[
                event(PointerPhase::Move, 10.0, 10.0),
                event(PointerPhase::Move, 20.0, 20.0),
            ],
        );

        assert!(!world.is_resource_changed::<StrokeStore>());
    }

    #[test]
    fn test_discarded_click_leaves_store_unchanged() {
        let doc = DocumentId("file-1-a.txt".to_string());
        let mut world = world_with_store(&doc);
        let mut session = DrawSession::default();
        let mut tools = ToolState::default();
        tools.select(Tool::Highlight);

        feed(
            &mut world,
            &mut session,
            &tools,
            &doc,
            &[
                event(PointerPhase::Down, 10.0, 10.0),
                event(PointerPhase::Up, 10.0, 10.0),
            ],
        );

        assert!(!world.is_resource_changed::<StrokeStore>());
    }

    #[test]
    fn test_committed_stroke_marks_store_changed() {
        let doc = DocumentId("file-1-a.txt".to_string());
        let mut world = world_with_store(&doc);
        let mut session = DrawSession::default();
        let mut tools = ToolState::default();
        tools.select(Tool::Highlight);

        feed(
            &mut world,
            &mut session,
            &tools,
            &doc,
            &[
                event(PointerPhase::Down, 10.0, 10.0),
                event(PointerPhase::Move, 30.0, 30.0),
                event(PointerPhase::Up, 30.0, 30.0),
            ],
        );

        assert!(world.is_resource_changed::<StrokeStore>());
        assert_eq!(world.resource::<StrokeStore>().strokes(&doc).len(), 1);
    }
}
