//! Highlight rendering as tessellated vector meshes.
//!
//! Stroke meshes are built in document space and parented to the content
//! root, so the camera applies the zoom once and strokes stay sharp at every
//! zoom level. Committed strokes are stacked by commit order; the stroke being
//! drawn sits above all of them.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use lyon_tessellation::math::point;
use lyon_tessellation::path::Path;
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, LineCap, LineJoin, StrokeOptions,
    StrokeTessellator, StrokeVertex, TessellationError, VertexBuffers,
};

use crate::documents::ActiveDocument;
use crate::viewer::ContentRoot;

use super::path::{PathCommand, StrokePath, build_path};
use super::session::DrawSession;
use super::store::StrokeStore;
use super::stroke::{Stroke, StrokeColor};

/// Z offset of the highlight layer above the document content.
const HIGHLIGHT_LAYER_Z: f32 = 10.0;
const STROKE_Z_STEP: f32 = 0.001;

/// Marker for a committed stroke mesh, with its stacking index.
#[derive(Component)]
pub struct CommittedStrokeMesh(pub usize);

/// Marker for the mesh of the stroke currently being drawn.
#[derive(Component)]
pub struct PreviewStrokeMesh;

type Geometry = VertexBuffers<[f32; 2], u32>;

fn to_lyon_path(path: &StrokePath) -> Path {
    let mut builder = Path::builder();
    let mut open = false;
    for command in path.commands() {
        match *command {
            PathCommand::MoveTo(p) => {
                if open {
                    builder.end(false);
                }
                builder.begin(point(p.x, p.y));
                open = true;
            }
            PathCommand::QuadTo { ctrl, to } => {
                builder.quadratic_bezier_to(point(ctrl.x, ctrl.y), point(to.x, to.y));
            }
            PathCommand::LineTo(p) => {
                builder.line_to(point(p.x, p.y));
            }
        }
    }
    if open {
        builder.end(false);
    }
    builder.build()
}

/// Tessellate a stroke path with round caps and joins.
///
/// A tap (every command on one point) renders as a dot of the stroke width.
pub fn tessellate_stroke(path: &StrokePath, width: f32) -> Result<Geometry, TessellationError> {
    let mut geometry = Geometry::new();
    let Some(start) = path.start() else {
        return Ok(geometry);
    };

    if path.is_degenerate() {
        FillTessellator::new().tessellate_circle(
            point(start.x, start.y),
            width * 0.5,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut geometry, |v: FillVertex| v.position().to_array()),
        )?;
        return Ok(geometry);
    }

    let options = StrokeOptions::default()
        .with_line_width(width)
        .with_line_cap(LineCap::Round)
        .with_line_join(LineJoin::Round);
    StrokeTessellator::new().tessellate_path(
        &to_lyon_path(path),
        &options,
        &mut BuffersBuilder::new(&mut geometry, |v: StrokeVertex| v.position().to_array()),
    )?;
    Ok(geometry)
}

/// Mesh in content-root local space: document y grows down, world y grows up.
fn geometry_to_mesh(geometry: Geometry) -> Mesh {
    let positions: Vec<[f32; 3]> = geometry
        .vertices
        .iter()
        .map(|[x, y]| [*x, -*y, 0.0])
        .collect();
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_indices(Indices::U32(geometry.indices))
}

fn stroke_mesh(stroke: &Stroke) -> Option<Mesh> {
    let path = build_path(&stroke.points);
    match tessellate_stroke(&path, stroke.size) {
        Ok(geometry) if !geometry.indices.is_empty() => Some(geometry_to_mesh(geometry)),
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to tessellate stroke {}: {:?}", stroke.id.0, e);
            None
        }
    }
}

fn stroke_z(index: usize) -> f32 {
    HIGHLIGHT_LAYER_Z + index as f32 * STROKE_Z_STEP
}

fn spawn_stroke_mesh(
    commands: &mut Commands,
    root: Entity,
    mesh: Mesh,
    color: StrokeColor,
    z: f32,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    marker: impl Bundle,
) {
    commands.spawn((
        Mesh2d(meshes.add(mesh)),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(color.to_color()))),
        Transform::from_translation(Vec3::new(0.0, 0.0, z)),
        ChildOf(root),
        marker,
    ));
}

/// Rebuild committed stroke meshes when the active collection changes.
#[allow(clippy::too_many_arguments)]
pub fn render_committed_strokes(
    mut commands: Commands,
    store: Res<StrokeStore>,
    active: Res<ActiveDocument>,
    roots: Query<Entity, With<ContentRoot>>,
    added_roots: Query<(), Added<ContentRoot>>,
    existing: Query<Entity, With<CommittedStrokeMesh>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if !(store.is_changed() || active.is_changed() || !added_roots.is_empty()) {
        return;
    }

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    let (Some(document), Ok(root)) = (active.id(), roots.single()) else {
        return;
    };

    for (index, stroke) in store.strokes(document).iter().enumerate() {
        if let Some(mesh) = stroke_mesh(stroke) {
            spawn_stroke_mesh(
                &mut commands,
                root,
                mesh,
                stroke.color,
                stroke_z(index),
                &mut meshes,
                &mut materials,
                CommittedStrokeMesh(index),
            );
        }
    }
}

/// Redraw the in-progress stroke on every change to the session.
#[allow(clippy::too_many_arguments)]
pub fn render_preview_stroke(
    mut commands: Commands,
    session: Res<DrawSession>,
    store: Res<StrokeStore>,
    active: Res<ActiveDocument>,
    roots: Query<Entity, With<ContentRoot>>,
    existing: Query<Entity, With<PreviewStrokeMesh>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if !session.is_changed() {
        return;
    }

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    let (Some(stroke), Ok(root)) = (session.in_progress(), roots.single()) else {
        return;
    };
    // A session for another document is never shown over this one.
    if session.document() != active.id() {
        return;
    }

    if let Some(mesh) = stroke_mesh(stroke) {
        let count = session
            .document()
            .map(|doc| store.strokes(doc).len())
            .unwrap_or(0);
        spawn_stroke_mesh(
            &mut commands,
            root,
            mesh,
            stroke.color,
            stroke_z(count + 1),
            &mut meshes,
            &mut materials,
            PreviewStrokeMesh,
        );
    }
}
