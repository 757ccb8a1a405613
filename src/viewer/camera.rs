use bevy::ecs::system::SystemParam;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::annotations::OverlayLayout;
use crate::annotations::coords::ContentFrame;
use crate::constants::{CONTENT_TOP_MARGIN, SCROLL_LINE_STEP};
use crate::documents::ActiveDocument;

use super::content::ContentRoot;
use super::zoom::ZoomLevel;

#[derive(Component)]
pub struct ReaderCamera;

/// Scroll position in document units.
///
/// `y` is the document row shown just below the top margin, `x` the
/// horizontal pan of the content center.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ViewerScroll {
    pub offset: Vec2,
}

impl ViewerScroll {
    /// Keep at least part of the content on screen.
    pub fn clamp_to(&mut self, content_size: Vec2) {
        let half_width = content_size.x * 0.5;
        self.offset.x = self.offset.x.clamp(-half_width, half_width);
        self.offset.y = self.offset.y.clamp(0.0, content_size.y.max(0.0));
    }
}

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        ReaderCamera,
        Transform::from_translation(Vec3::new(0.0, 0.0, 1000.0)),
    ));
}

/// Camera translation that puts `scroll` at the top of a viewport of `viewport_height` pixels.
pub fn camera_translation(scroll: Vec2, viewport_height: f32, zoom: f32) -> Vec2 {
    let scale = 1.0 / zoom;
    Vec2::new(
        scroll.x,
        -scroll.y + (CONTENT_TOP_MARGIN - viewport_height * 0.5) * scale,
    )
}

/// Top-left corner of the content box in window coordinates.
///
/// `root` and `camera` are world positions; world y grows up, window y down.
pub fn content_origin(window_size: Vec2, camera: Vec2, root: Vec2, zoom: f32) -> Vec2 {
    let offset = (root - camera) * zoom;
    Vec2::new(window_size.x * 0.5 + offset.x, window_size.y * 0.5 - offset.y)
}

/// Everything needed to place the zoomed content box on screen.
#[derive(SystemParam)]
pub struct ContentFrameParams<'w, 's> {
    window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    camera: Query<'w, 's, &'static Transform, With<ReaderCamera>>,
    root: Query<'w, 's, &'static Transform, (With<ContentRoot>, Without<ReaderCamera>)>,
}

impl ContentFrameParams<'_, '_> {
    pub fn frame(&self, zoom: f32) -> Option<ContentFrame> {
        let window = self.window.single().ok()?;
        let camera = self.camera.single().ok()?;
        let root = self.root.single().ok()?;
        let origin = content_origin(
            window.size(),
            camera.translation.truncate(),
            root.translation.truncate(),
            zoom,
        );
        Some(ContentFrame::new(origin, zoom))
    }
}

pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    zoom: Res<ZoomLevel>,
    mut scroll: ResMut<ViewerScroll>,
) {
    if !mouse_button.pressed(MouseButton::Middle) {
        mouse_motion.clear();
        return;
    }

    for event in mouse_motion.read() {
        let delta = event.delta / zoom.get();
        scroll.offset.x -= delta.x;
        scroll.offset.y -= delta.y;
    }
}

/// Wheel scrolls the document; ctrl+wheel steps the zoom.
pub fn camera_scroll(
    mut scroll_events: MessageReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut zoom: ResMut<ZoomLevel>,
    mut scroll: ResMut<ViewerScroll>,
    mut contexts: EguiContexts,
) {
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.is_pointer_over_area()
    {
        scroll_events.clear();
        return;
    }

    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    for event in scroll_events.read() {
        let lines = match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / SCROLL_LINE_STEP,
        };

        if ctrl {
            if lines > 0.0 {
                zoom.zoom_in();
            } else if lines < 0.0 {
                zoom.zoom_out();
            }
        } else {
            scroll.offset.y -= lines * SCROLL_LINE_STEP / zoom.get();
        }
    }
}

pub fn reset_scroll_on_document_change(
    active: Res<ActiveDocument>,
    mut scroll: ResMut<ViewerScroll>,
) {
    if active.is_changed() {
        *scroll = ViewerScroll::default();
    }
}

pub fn apply_camera(
    window_query: Query<&Window, With<PrimaryWindow>>,
    zoom: Res<ZoomLevel>,
    layout: Res<OverlayLayout>,
    mut scroll: ResMut<ViewerScroll>,
    mut camera_query: Query<(&mut Transform, &mut Projection), With<ReaderCamera>>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((mut transform, mut projection)) = camera_query.single_mut() else {
        return;
    };

    scroll.clamp_to(layout.size);

    if let Projection::Orthographic(ref mut ortho) = *projection {
        let scale = 1.0 / zoom.get();
        if ortho.scale != scale {
            ortho.scale = scale;
        }
    }

    let target = camera_translation(scroll.offset, window.height(), zoom.get());
    if transform.translation.truncate() != target {
        transform.translation.x = target.x;
        transform.translation.y = target.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CONTENT_WIDTH;

    /// Content root position used by the viewer: top-left corner at (-W/2, 0).
    fn root() -> Vec2 {
        Vec2::new(-CONTENT_WIDTH * 0.5, 0.0)
    }

    #[test]
    fn test_unscrolled_content_sits_below_top_margin() {
        let window = Vec2::new(1280.0, 900.0);
        for zoom in [0.5, 1.0, 2.0] {
            let camera = camera_translation(Vec2::ZERO, window.y, zoom);
            let origin = content_origin(window, camera, root(), zoom);
            assert!((origin.y - CONTENT_TOP_MARGIN).abs() < 1e-3, "zoom {}", zoom);
            let expected_x = window.x * 0.5 - CONTENT_WIDTH * 0.5 * zoom;
            assert!((origin.x - expected_x).abs() < 1e-3);
        }
    }

    #[test]
    fn test_scrolling_moves_origin_up_by_zoomed_amount() {
        let window = Vec2::new(800.0, 600.0);
        let zoom = 2.0;
        let camera = camera_translation(Vec2::new(0.0, 100.0), window.y, zoom);
        let origin = content_origin(window, camera, root(), zoom);
        assert!((origin.y - (CONTENT_TOP_MARGIN - 200.0)).abs() < 1e-3);
    }

    #[test]
    fn test_frame_maps_window_points_into_document() {
        let window = Vec2::new(1280.0, 900.0);
        let zoom = 1.5;
        let camera = camera_translation(Vec2::new(0.0, 40.0), window.y, zoom);
        let frame = ContentFrame::new(content_origin(window, camera, root(), zoom), zoom);

        // The top-left content corner is document (0, 0)
        let corner = frame.to_screen(Vec2::ZERO);
        assert!(frame.to_document(corner).length() < 1e-3);
        // The row at the top margin is the scrolled-to row
        let doc = frame.to_document(Vec2::new(corner.x, CONTENT_TOP_MARGIN));
        assert!((doc.y - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_scroll_clamps_to_content() {
        let mut scroll = ViewerScroll {
            offset: Vec2::new(-5000.0, -30.0),
        };
        scroll.clamp_to(Vec2::new(896.0, 1200.0));
        assert_eq!(scroll.offset, Vec2::new(-448.0, 0.0));

        scroll.offset.y = 9000.0;
        scroll.clamp_to(Vec2::new(896.0, 1200.0));
        assert_eq!(scroll.offset.y, 1200.0);
    }
}
