//! Content box of the active document.
//!
//! The root entity sits at the content box's top-left corner. Children are
//! laid out in document space (x right, y down) mapped to local `(x, -y)`, so
//! page sprites, text and highlight meshes share one coordinate system.

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::sprite::Anchor;
use bevy::text::{TextBounds, TextLayoutInfo};

use crate::constants::{CONTENT_WIDTH, PAGE_GAP, TEXT_FONT_SIZE, TEXT_PADDING};
use crate::documents::convert::markup::html_to_text;
use crate::documents::{ActiveDocument, DocumentBody, DocumentId, Gallery, GalleryItem, PageImage};
use crate::theme::{PAPER_DARK, PAPER_LIGHT, TEXT_DARK, TEXT_LIGHT};

use super::ThemeMode;

#[derive(Component, Debug)]
pub struct ContentRoot {
    pub document: DocumentId,
}

/// Natural (unscaled) size of the content box in document units.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct ContentExtent(pub Vec2);

#[derive(Component)]
pub struct DocumentText;

#[derive(Component)]
pub struct PaperBackground;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// Distance from the content top to the page top.
    pub top: f32,
    pub size: Vec2,
}

/// Stack pages vertically, each scaled to the content width.
pub fn layout_pages(pages: &[PageImage]) -> (Vec<PagePlacement>, Vec2) {
    let mut top = 0.0;
    let mut placements = Vec::with_capacity(pages.len());
    for page in pages {
        let scale = if page.width == 0 {
            0.0
        } else {
            CONTENT_WIDTH / page.width as f32
        };
        let size = Vec2::new(CONTENT_WIDTH, page.height as f32 * scale);
        placements.push(PagePlacement { top, size });
        top += size.y + PAGE_GAP;
    }
    let height = (top - PAGE_GAP).max(0.0);
    (placements, Vec2::new(CONTENT_WIDTH, height))
}

/// Local translation of a centered sprite covering `size` at document `top`.
fn centered_at(top: f32, size: Vec2, z: f32) -> Vec3 {
    Vec3::new(size.x * 0.5, -(top + size.y * 0.5), z)
}

/// Upload a page as a texture. Dark mode inverts the page colors.
pub fn page_to_image(page: &PageImage, invert: bool) -> Image {
    let mut data = page.rgba.clone();
    if invert {
        for px in data.chunks_exact_mut(4) {
            px[0] = u8::MAX - px[0];
            px[1] = u8::MAX - px[1];
            px[2] = u8::MAX - px[2];
        }
    }
    Image::new(
        Extent3d {
            width: page.width,
            height: page.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        default(),
    )
}

fn content_root_position() -> Vec3 {
    Vec3::new(-CONTENT_WIDTH * 0.5, 0.0, 0.0)
}

fn spawn_pages(
    commands: &mut Commands,
    root: Entity,
    pages: &[PageImage],
    dark: bool,
    images: &mut Assets<Image>,
) -> Vec2 {
    let (placements, extent) = layout_pages(pages);
    for (page, placement) in pages.iter().zip(placements) {
        let handle = images.add(page_to_image(page, dark));
        commands.spawn((
            Sprite {
                image: handle,
                custom_size: Some(placement.size),
                ..default()
            },
            Transform::from_translation(centered_at(placement.top, placement.size, 0.0)),
            ChildOf(root),
        ));
    }
    extent
}

fn spawn_text(commands: &mut Commands, root: Entity, html: &str, dark: bool) -> Vec2 {
    let height = TEXT_PADDING * 2.0;
    let size = Vec2::new(CONTENT_WIDTH, height);
    commands.spawn((
        Sprite {
            color: if dark { PAPER_DARK } else { PAPER_LIGHT },
            custom_size: Some(size),
            ..default()
        },
        Transform::from_translation(centered_at(0.0, size, 0.0)),
        PaperBackground,
        ChildOf(root),
    ));
    commands.spawn((
        Text2d::new(html_to_text(html)),
        TextFont {
            font_size: TEXT_FONT_SIZE,
            ..default()
        },
        TextColor(if dark { TEXT_DARK } else { TEXT_LIGHT }),
        TextBounds::new_horizontal(CONTENT_WIDTH - TEXT_PADDING * 2.0),
        Anchor::TOP_LEFT,
        Transform::from_translation(Vec3::new(TEXT_PADDING, -TEXT_PADDING, 1.0)),
        DocumentText,
        ChildOf(root),
    ));
    size
}

fn spawn_content(
    commands: &mut Commands,
    item: &GalleryItem,
    dark: bool,
    images: &mut Assets<Image>,
) {
    let root = commands
        .spawn((
            ContentRoot {
                document: item.id.clone(),
            },
            Transform::from_translation(content_root_position()),
            Visibility::default(),
        ))
        .id();

    let extent = match &item.body {
        DocumentBody::Pages(pages) => spawn_pages(commands, root, pages, dark, images),
        DocumentBody::Html(html) => spawn_text(commands, root, html, dark),
    };
    commands.entity(root).insert(ContentExtent(extent));
    info!("Showing {} ({:?}, {}x{})", item.name, item.kind, extent.x, extent.y);
}

/// Respawn the content box when the document or theme changes.
pub fn rebuild_content(
    mut commands: Commands,
    active: Res<ActiveDocument>,
    gallery: Res<Gallery>,
    theme: Res<ThemeMode>,
    roots: Query<(Entity, &ContentRoot)>,
    mut images: ResMut<Assets<Image>>,
) {
    let shown = roots.iter().next().map(|(_, root)| &root.document);
    let stale = shown != active.id() || theme.is_changed();
    if !stale {
        return;
    }

    let item = active.id().and_then(|id| gallery.get(id));
    // The active document may not be loaded yet
    if active.id().is_some() && item.is_none() && shown.is_none() {
        return;
    }

    for (entity, _) in roots.iter() {
        commands.entity(entity).despawn();
    }
    if let Some(item) = item {
        spawn_content(&mut commands, item, theme.dark, &mut images);
    }
}

/// Grow the paper and content extent to the laid out text.
pub fn measure_text_content(
    texts: Query<(&TextLayoutInfo, &ChildOf), (With<DocumentText>, Changed<TextLayoutInfo>)>,
    mut roots: Query<&mut ContentExtent, With<ContentRoot>>,
    mut papers: Query<(&ChildOf, &mut Sprite, &mut Transform), With<PaperBackground>>,
) {
    for (layout, child_of) in texts.iter() {
        let size = Vec2::new(CONTENT_WIDTH, layout.size.y + TEXT_PADDING * 2.0);

        if let Ok(mut extent) = roots.get_mut(child_of.parent())
            && extent.0 != size
        {
            extent.0 = size;
        }

        for (paper_parent, mut sprite, mut transform) in papers.iter_mut() {
            if paper_parent.parent() == child_of.parent() {
                sprite.custom_size = Some(size);
                transform.translation = centered_at(0.0, size, 0.0);
            }
        }
    }
}
