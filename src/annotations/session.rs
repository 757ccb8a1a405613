//! Draw session state machine.
//!
//! One stroke at a time: pointer-down starts it (highlighter only), every move
//! appends a mapped point, pointer-up commits or discards it. The machine is a
//! plain struct; the Bevy glue in `draw_tool` feeds it events and applies the
//! returned effects.

use bevy::prelude::*;

use crate::documents::DocumentId;
use crate::viewer::tools::{Tool, ToolState};

use super::coords::ContentFrame;
use super::input::{PointerEvent, PointerPhase};
use super::store::StrokeStore;
use super::stroke::Stroke;

/// Everything the session reads from the world for one event.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    pub tools: &'a ToolState,
    pub frame: ContentFrame,
    pub document: Option<&'a DocumentId>,
    /// Natural size of the content box in document units.
    pub content_size: Vec2,
}

/// Side effects requested by a transition, applied in order by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEffect {
    SuppressChrome,
    RestoreChrome,
    Persist {
        document: DocumentId,
        strokes: Vec<Stroke>,
    },
}

#[derive(Resource, Debug, Default)]
pub struct DrawSession {
    in_progress: Option<Stroke>,
    document: Option<DocumentId>,
}

impl DrawSession {
    pub fn is_active(&self) -> bool {
        self.in_progress.is_some()
    }

    pub fn in_progress(&self) -> Option<&Stroke> {
        self.in_progress.as_ref()
    }

    /// Document the active session draws on.
    pub fn document(&self) -> Option<&DocumentId> {
        self.document.as_ref()
    }

    pub fn handle(
        &mut self,
        event: &PointerEvent,
        ctx: &DrawContext,
        store: &mut StrokeStore,
    ) -> Vec<DrawEffect> {
        match event.phase {
            PointerPhase::Down => self.begin(event.position, ctx),
            PointerPhase::Move => {
                if let Some(stroke) = self.in_progress.as_mut() {
                    stroke.points.push(ctx.frame.to_document(event.position));
                }
                Vec::new()
            }
            PointerPhase::Up => self.finish(store),
        }
    }

    fn begin(&mut self, screen: Vec2, ctx: &DrawContext) -> Vec<DrawEffect> {
        if self.is_active() || ctx.tools.active() != Tool::Highlight {
            return Vec::new();
        }
        let Some(document) = ctx.document else {
            return Vec::new();
        };

        let start = ctx.frame.to_document(screen);
        let inside = start.x >= 0.0
            && start.y >= 0.0
            && start.x <= ctx.content_size.x
            && start.y <= ctx.content_size.y;
        if !inside {
            return Vec::new();
        }

        self.in_progress = Some(Stroke::start(start, ctx.tools.color(), ctx.tools.size()));
        self.document = Some(document.clone());
        vec![DrawEffect::SuppressChrome]
    }

    fn finish(&mut self, store: &mut StrokeStore) -> Vec<DrawEffect> {
        let Some(stroke) = self.in_progress.as_ref() else {
            return Vec::new();
        };
        let mut effects = vec![DrawEffect::RestoreChrome];

        if let Some(document) = self.document.as_ref()
            && stroke.points.len() > 1
            && store.contains(document)
        {
            store.append(document, stroke.clone());
            effects.push(DrawEffect::Persist {
                document: document.clone(),
                strokes: store.strokes(document).to_vec(),
            });
        }

        self.in_progress = None;
        self.document = None;
        effects
    }

    /// Drop the in-progress stroke without committing it.
    pub fn abort(&mut self) -> Vec<DrawEffect> {
        if self.in_progress.take().is_none() {
            return Vec::new();
        }
        self.document = None;
        vec![DrawEffect::RestoreChrome]
    }

    /// Switching away from the highlighter mid-gesture aborts the stroke.
    pub fn on_tool_changed(&mut self, tool: Tool) -> Vec<DrawEffect> {
        if tool == Tool::Highlight {
            return Vec::new();
        }
        self.abort()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::input::PointerSource;

    fn event(phase: PointerPhase, x: f32, y: f32) -> PointerEvent {
        PointerEvent {
            phase,
            position: Vec2::new(x, y),
            source: PointerSource::Mouse,
        }
    }

    fn highlighter() -> ToolState {
        let mut tools = ToolState::default();
        tools.select(Tool::Highlight);
        tools
    }

    struct Fixture {
        session: DrawSession,
        store: StrokeStore,
        tools: ToolState,
        doc: DocumentId,
        frame: ContentFrame,
    }

    impl Fixture {
        fn new(frame: ContentFrame) -> Self {
            let doc = DocumentId("file-1-a.txt".to_string());
            let mut store = StrokeStore::default();
            store.ensure(&doc);
            Self {
                session: DrawSession::default(),
                store,
                tools: highlighter(),
                doc,
                frame,
            }
        }

        fn send(&mut self, phase: PointerPhase, x: f32, y: f32) -> Vec<DrawEffect> {
            let ctx = DrawContext {
                tools: &self.tools,
                frame: self.frame,
                document: Some(&self.doc),
                content_size: Vec2::new(896.0, 1200.0),
            };
            self.session
                .handle(&event(phase, x, y), &ctx, &mut self.store)
        }
    }

    #[test]
    fn test_click_without_moves_commits_nothing() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        assert_eq!(f.send(PointerPhase::Down, 10.0, 10.0), vec![DrawEffect::SuppressChrome]);
        assert!(f.session.is_active());

        let effects = f.send(PointerPhase::Up, 10.0, 10.0);

        assert_eq!(effects, vec![DrawEffect::RestoreChrome]);
        assert!(!f.session.is_active());
        assert!(f.store.strokes(&f.doc).is_empty());
    }

    #[test]
    fn test_stroke_has_one_point_per_move_plus_start() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        f.send(PointerPhase::Down, 0.0, 0.0);
        for i in 1..=5 {
            f.send(PointerPhase::Move, i as f32, i as f32);
        }
        let effects = f.send(PointerPhase::Up, 5.0, 5.0);

        let strokes = f.store.strokes(&f.doc);
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].points.len(), 6);
        assert_eq!(strokes[0].color, f.tools.color());
        assert_eq!(strokes[0].size, f.tools.size());
        assert!(matches!(effects.last(), Some(DrawEffect::Persist { .. })));
    }

    #[test]
    fn test_zoomed_stroke_is_stored_in_document_space() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::new(100.0, 50.0), 2.0));
        f.send(PointerPhase::Down, 150.0, 150.0);
        f.send(PointerPhase::Move, 170.0, 190.0);
        let effects = f.send(PointerPhase::Up, 170.0, 190.0);

        let strokes = f.store.strokes(&f.doc).to_vec();
        assert_eq!(strokes.len(), 1);
        assert_eq!(
            strokes[0].points,
            vec![Vec2::new(25.0, 50.0), Vec2::new(35.0, 70.0)]
        );
        assert_eq!(
            effects,
            vec![
                DrawEffect::RestoreChrome,
                DrawEffect::Persist {
                    document: f.doc.clone(),
                    strokes,
                },
            ]
        );
    }

    #[test]
    fn test_persist_carries_full_sequence() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        for offset in [0.0, 100.0] {
            f.send(PointerPhase::Down, offset, 10.0);
            f.send(PointerPhase::Move, offset + 5.0, 12.0);
            f.send(PointerPhase::Up, offset + 5.0, 12.0);
        }
        let effects = {
            f.send(PointerPhase::Down, 300.0, 10.0);
            f.send(PointerPhase::Move, 310.0, 10.0);
            f.send(PointerPhase::Up, 310.0, 10.0)
        };
        let Some(DrawEffect::Persist { strokes, .. }) = effects.last() else {
            panic!("expected persist effect");
        };
        assert_eq!(strokes.len(), 3);
        assert_eq!(strokes[0].points[0], Vec2::new(0.0, 10.0));
        assert_eq!(strokes[2].points[0], Vec2::new(300.0, 10.0));
    }

    #[test]
    fn test_second_down_while_drawing_is_ignored() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        f.send(PointerPhase::Down, 1.0, 1.0);
        assert!(f.send(PointerPhase::Down, 50.0, 50.0).is_empty());
        assert_eq!(f.session.in_progress().map(|s| s.points.len()), Some(1));
        assert_eq!(f.session.in_progress().map(|s| s.points[0]), Some(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_other_tools_never_start_a_session() {
        for tool in [Tool::Pointer, Tool::Spotlight, Tool::None] {
            let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
            f.tools = ToolState::default();
            f.tools.select(tool);
            assert!(f.send(PointerPhase::Down, 1.0, 1.0).is_empty());
            f.send(PointerPhase::Move, 2.0, 2.0);
            assert!(f.send(PointerPhase::Up, 2.0, 2.0).is_empty());
            assert!(f.store.strokes(&f.doc).is_empty());
        }
    }

    #[test]
    fn test_moves_and_ups_without_session_are_ignored() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        assert!(f.send(PointerPhase::Move, 2.0, 2.0).is_empty());
        assert!(f.send(PointerPhase::Up, 2.0, 2.0).is_empty());
    }

    #[test]
    fn test_no_session_without_active_document() {
        let mut session = DrawSession::default();
        let mut store = StrokeStore::default();
        let tools = highlighter();
        let ctx = DrawContext {
            tools: &tools,
            frame: ContentFrame::new(Vec2::ZERO, 1.0),
            document: None,
            content_size: Vec2::new(896.0, 1200.0),
        };
        let effects = session.handle(&event(PointerPhase::Down, 5.0, 5.0), &ctx, &mut store);
        assert!(effects.is_empty());
        assert!(!session.is_active());
    }

    #[test]
    fn test_press_outside_content_does_not_start() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::new(200.0, 0.0), 1.0));
        assert!(f.send(PointerPhase::Down, 100.0, 10.0).is_empty());
        assert!(!f.session.is_active());
    }

    #[test]
    fn test_release_outside_content_still_commits() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        f.send(PointerPhase::Down, 10.0, 10.0);
        f.send(PointerPhase::Move, 2000.0, 10.0);
        f.send(PointerPhase::Up, 2000.0, 10.0);
        assert_eq!(f.store.strokes(&f.doc).len(), 1);
    }

    #[test]
    fn test_tool_switch_mid_gesture_aborts() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        f.send(PointerPhase::Down, 10.0, 10.0);
        f.send(PointerPhase::Move, 20.0, 20.0);

        assert_eq!(f.session.on_tool_changed(Tool::Pointer), vec![DrawEffect::RestoreChrome]);
        assert!(!f.session.is_active());
        assert!(f.send(PointerPhase::Up, 20.0, 20.0).is_empty());
        assert!(f.store.strokes(&f.doc).is_empty());
    }

    #[test]
    fn test_reselecting_highlighter_keeps_session() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        f.send(PointerPhase::Down, 10.0, 10.0);
        assert!(f.session.on_tool_changed(Tool::Highlight).is_empty());
        assert!(f.session.is_active());
    }

    #[test]
    fn test_document_removed_mid_gesture_discards_stroke() {
        let mut f = Fixture::new(ContentFrame::new(Vec2::ZERO, 1.0));
        f.send(PointerPhase::Down, 10.0, 10.0);
        f.send(PointerPhase::Move, 20.0, 20.0);
        f.store.remove(&f.doc);

        let effects = f.send(PointerPhase::Up, 20.0, 20.0);

        assert_eq!(effects, vec![DrawEffect::RestoreChrome]);
        assert!(!f.store.contains(&f.doc));
    }
}
