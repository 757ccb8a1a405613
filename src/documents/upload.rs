//! Upload, open and delete flows for the gallery.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy::window::FileDragAndDrop;
use futures_lite::future;

use crate::annotations::StrokeStore;
use crate::storage::StorageCommand;

use super::convert::{DecodeError, FormatRegistry};
use super::gallery::{ActiveDocument, DocumentId, DocumentKind, Gallery, GalleryItem, GalleryWindow};

#[derive(Message)]
pub struct UploadRequest {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct OpenDocumentRequest {
    pub id: DocumentId,
}

#[derive(Message)]
pub struct DeleteDocumentRequest {
    pub id: DocumentId,
}

/// Upload progress and the last failure, shown on the upload screen.
///
/// Files are converted one at a time; the rest wait in `queued`.
#[derive(Resource, Default)]
pub struct UploadStatus {
    /// File name being converted
    pub in_flight: Option<String>,
    pub error: Option<String>,
    queued: VecDeque<PathBuf>,
}

impl UploadStatus {
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn enqueue(&mut self, path: PathBuf) {
        self.queued.push_back(path);
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Next file to convert, once the current conversion has finished.
    fn next_upload(&mut self) -> Option<PathBuf> {
        if self.is_loading() {
            return None;
        }
        self.queued.pop_front()
    }
}

#[derive(Component)]
pub struct ConversionTask(pub Task<Result<GalleryItem, DecodeError>>);

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Read and convert a file into a gallery item.
pub fn convert_file(
    registry: &FormatRegistry,
    path: &Path,
    id: DocumentId,
    kind: DocumentKind,
) -> Result<GalleryItem, DecodeError> {
    let bytes = std::fs::read(path)?;
    let converted = registry.convert(&bytes, kind)?;
    Ok(GalleryItem {
        id,
        name: file_name(path),
        kind,
        body: converted.body,
        text_content: converted.text_content,
        page_count: converted.page_count,
    })
}

/// Add a converted document: empty highlight set, active, gallery closed.
pub fn apply_upload(
    item: GalleryItem,
    gallery: &mut Gallery,
    strokes: &mut StrokeStore,
    active: &mut ActiveDocument,
    window: &mut GalleryWindow,
) -> [StorageCommand; 2] {
    let id = item.id.clone();
    let item = Arc::new(item);
    strokes.replace_all(&id, Vec::new());
    gallery.insert(item.clone());
    active.set(id.clone());
    window.open = false;
    [
        StorageCommand::PutDocument(item),
        StorageCommand::PutHighlights {
            document: id,
            strokes: Vec::new(),
        },
    ]
}

/// Remove a document everywhere. Returns false when it was not in the gallery.
pub fn apply_delete(
    id: &DocumentId,
    gallery: &mut Gallery,
    strokes: &mut StrokeStore,
    active: &mut ActiveDocument,
    window: &mut GalleryWindow,
) -> bool {
    if gallery.remove(id).is_none() {
        return false;
    }
    strokes.remove(id);
    if active.is(id) {
        active.clear();
        if !gallery.is_empty() {
            window.open = true;
        }
    }
    true
}

/// The gallery opens itself when nothing is shown but documents exist.
pub fn should_open_gallery(active: &ActiveDocument, gallery: &Gallery) -> bool {
    active.id().is_none() && !gallery.is_empty()
}

pub fn start_uploads(
    mut commands: Commands,
    mut events: MessageReader<UploadRequest>,
    registry: Res<FormatRegistry>,
    mut status: ResMut<UploadStatus>,
) {
    for event in events.read() {
        status.enqueue(event.path.clone());
    }

    while let Some(path) = status.next_upload() {
        let name = file_name(&path);
        let Some(kind) = DocumentKind::from_path(&path) else {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let error = DecodeError::Unsupported(ext);
            warn!("Rejected {}: {}", name, error);
            status.error = Some(error.to_string());
            continue;
        };

        info!("Converting {} as {:?}", name, kind);
        status.error = None;
        status.in_flight = Some(name.clone());

        let id = DocumentId::for_upload(&name, chrono::Utc::now().timestamp_millis());
        let registry = registry.clone();
        let task = AsyncComputeTaskPool::get()
            .spawn(async move { convert_file(&registry, &path, id, kind) });
        commands.spawn(ConversionTask(task));
    }
}

#[allow(clippy::too_many_arguments)]
pub fn poll_conversion_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut ConversionTask)>,
    mut status: ResMut<UploadStatus>,
    mut gallery: ResMut<Gallery>,
    mut strokes: ResMut<StrokeStore>,
    mut active: ResMut<ActiveDocument>,
    mut window: ResMut<GalleryWindow>,
    mut storage: MessageWriter<StorageCommand>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        let name = status.in_flight.take().unwrap_or_default();

        match result {
            Ok(item) => {
                info!("Added {} ({})", item.name, item.id);
                status.error = None;
                let writes = apply_upload(item, &mut gallery, &mut strokes, &mut active, &mut window);
                storage.write_batch(writes);
            }
            Err(e) => {
                error!("Failed to process {}: {}", name, e);
                status.error = Some(format!("Failed to process {}: {}", name, e));
            }
        }
    }
}

pub fn handle_dropped_files(
    mut drops: MessageReader<FileDragAndDrop>,
    mut uploads: MessageWriter<UploadRequest>,
) {
    for drop in drops.read() {
        if let FileDragAndDrop::DroppedFile { path_buf, .. } = drop {
            uploads.write(UploadRequest {
                path: path_buf.clone(),
            });
        }
    }
}

pub fn open_document_system(
    mut events: MessageReader<OpenDocumentRequest>,
    gallery: Res<Gallery>,
    mut active: ResMut<ActiveDocument>,
    mut window: ResMut<GalleryWindow>,
) {
    for event in events.read() {
        if !gallery.contains(&event.id) {
            warn!("Cannot open unknown document {}", event.id);
            continue;
        }
        if !active.is(&event.id) {
            active.set(event.id.clone());
        }
        window.open = false;
    }
}

pub fn delete_document_system(
    mut events: MessageReader<DeleteDocumentRequest>,
    mut gallery: ResMut<Gallery>,
    mut strokes: ResMut<StrokeStore>,
    mut active: ResMut<ActiveDocument>,
    mut window: ResMut<GalleryWindow>,
    mut storage: MessageWriter<StorageCommand>,
) {
    for event in events.read() {
        if apply_delete(&event.id, &mut gallery, &mut strokes, &mut active, &mut window) {
            info!("Deleted document {}", event.id);
            storage.write(StorageCommand::Delete(event.id.clone()));
        }
    }
}

pub fn auto_open_gallery(
    active: Res<ActiveDocument>,
    gallery: Res<Gallery>,
    mut window: ResMut<GalleryWindow>,
) {
    if !(active.is_changed() || gallery.is_changed()) {
        return;
    }
    if should_open_gallery(&active, &gallery) && !window.open {
        window.open = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Stroke, StrokeColor};
    use crate::documents::DocumentBody;

    fn item(id: &str) -> GalleryItem {
        GalleryItem {
            id: DocumentId(id.to_string()),
            name: format!("{}.txt", id),
            kind: DocumentKind::Txt,
            body: DocumentBody::Html(String::new()),
            text_content: String::new(),
            page_count: None,
        }
    }

    struct World {
        gallery: Gallery,
        strokes: StrokeStore,
        active: ActiveDocument,
        window: GalleryWindow,
    }

    impl World {
        fn new() -> Self {
            Self {
                gallery: Gallery::default(),
                strokes: StrokeStore::default(),
                active: ActiveDocument::default(),
                window: GalleryWindow { open: true },
            }
        }

        fn upload(&mut self, id: &str) -> [StorageCommand; 2] {
            apply_upload(
                item(id),
                &mut self.gallery,
                &mut self.strokes,
                &mut self.active,
                &mut self.window,
            )
        }

        fn delete(&mut self, id: &str) -> bool {
            apply_delete(
                &DocumentId(id.to_string()),
                &mut self.gallery,
                &mut self.strokes,
                &mut self.active,
                &mut self.window,
            )
        }
    }

    #[test]
    fn test_upload_activates_and_persists_empty_highlights() {
        let mut world = World::new();
        let writes = world.upload("a");

        let id = DocumentId("a".to_string());
        assert!(world.active.is(&id));
        assert!(!world.window.open);
        assert!(world.strokes.contains(&id));
        assert!(matches!(&writes[0], StorageCommand::PutDocument(item) if item.id == id));
        assert!(matches!(
            &writes[1],
            StorageCommand::PutHighlights { document, strokes } if document == &id && strokes.is_empty()
        ));
    }

    #[test]
    fn test_delete_active_opens_gallery_when_others_remain() {
        let mut world = World::new();
        world.upload("a");
        world.upload("b");

        assert!(world.delete("b"));

        assert!(world.active.id().is_none());
        assert!(world.window.open);
        assert!(!world.strokes.contains(&DocumentId("b".to_string())));
    }

    #[test]
    fn test_delete_last_document_leaves_gallery_closed() {
        let mut world = World::new();
        world.upload("a");
        assert!(world.delete("a"));
        assert!(world.active.id().is_none());
        assert!(!world.window.open);
        assert!(world.gallery.is_empty());
    }

    #[test]
    fn test_delete_inactive_keeps_selection() {
        let mut world = World::new();
        world.upload("a");
        world.upload("b");
        assert!(world.delete("a"));
        assert!(world.active.is(&DocumentId("b".to_string())));
        assert!(!world.window.open);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut world = World::new();
        assert!(!world.delete("ghost"));
    }

    #[test]
    fn test_readded_document_starts_without_highlights() {
        let mut world = World::new();
        world.upload("a");
        let id = DocumentId("a".to_string());
        let mut stroke = Stroke::start(Vec2::ZERO, StrokeColor::srgba(1.0, 1.0, 0.2, 0.5), 16.0);
        stroke.points.push(Vec2::ONE);
        world.strokes.append(&id, stroke);

        world.delete("a");
        world.upload("a");

        assert!(world.strokes.strokes(&id).is_empty());
    }

    #[test]
    fn test_should_open_gallery() {
        let mut world = World::new();
        assert!(!should_open_gallery(&world.active, &world.gallery));
        world.upload("a");
        assert!(!should_open_gallery(&world.active, &world.gallery));
        world.active.clear();
        assert!(should_open_gallery(&world.active, &world.gallery));
    }

    #[test]
    fn test_queued_uploads_wait_for_current_conversion() {
        let mut status = UploadStatus::default();
        status.enqueue(PathBuf::from("a.txt"));
        status.enqueue(PathBuf::from("b.txt"));

        assert_eq!(status.next_upload(), Some(PathBuf::from("a.txt")));
        status.in_flight = Some("a.txt".to_string());
        assert_eq!(status.next_upload(), None);
        assert_eq!(status.queued_len(), 1);

        status.in_flight = None;
        assert_eq!(status.next_upload(), Some(PathBuf::from("b.txt")));
        assert_eq!(status.queued_len(), 0);
    }

    #[test]
    fn test_files_dropped_together_are_all_kept() {
        use bevy::ecs::message::Messages;
        use bevy::ecs::system::RunSystemOnce;
        use bevy::tasks::TaskPool;

        AsyncComputeTaskPool::get_or_init(TaskPool::new);
        let mut ecs = bevy::ecs::world::World::new();
        ecs.init_resource::<FormatRegistry>();
        ecs.init_resource::<UploadStatus>();
        ecs.init_resource::<Messages<UploadRequest>>();
        for name in ["first.txt", "notes.exe", "second.txt"] {
            ecs.write_message(UploadRequest {
                path: PathBuf::from(name),
            });
        }

        ecs.run_system_once(start_uploads).unwrap();

        let status = ecs.resource::<UploadStatus>();
        assert_eq!(status.in_flight.as_deref(), Some("first.txt"));
        assert_eq!(status.queued_len(), 2);
        let tasks = ecs
            .query::<&ConversionTask>()
            .iter(&ecs)
            .count();
        assert_eq!(tasks, 1);
    }

    #[test]
    fn test_convert_file_reads_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let item = convert_file(
            &FormatRegistry::with_builtin(),
            &path,
            DocumentId("file-1-notes.txt".to_string()),
            DocumentKind::Txt,
        )
        .unwrap();

        assert_eq!(item.name, "notes.txt");
        assert_eq!(item.text_content, "hello");
    }

    #[test]
    fn test_convert_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_file(
            &FormatRegistry::with_builtin(),
            &dir.path().join("gone.txt"),
            DocumentId("x".to_string()),
            DocumentKind::Txt,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }
}
