//! Document and highlight persistence.
//!
//! The library is loaded once at startup on the I/O pool. Writes are queued
//! as [`StorageCommand`] messages and executed one at a time, in order, so a
//! delete can never overtake the put it follows. Write failures are logged
//! and not retried; the in-memory state stays authoritative. On exit the queue
//! is flushed on the main thread so the last committed stroke is not lost.

mod store;

pub use store::{JsonFileStore, PersistenceStore, StorageError};

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task};
use futures_lite::future;

use crate::annotations::{Stroke, StrokeStore};
use crate::documents::{ActiveDocument, DocumentId, Gallery, GalleryItem};

/// A queued write against the persistence store.
#[derive(Message, Debug, Clone)]
pub enum StorageCommand {
    PutDocument(Arc<GalleryItem>),
    PutHighlights {
        document: DocumentId,
        strokes: Vec<Stroke>,
    },
    Delete(DocumentId),
}

impl StorageCommand {
    fn run(&self, store: &dyn PersistenceStore) -> Result<(), StorageError> {
        match self {
            StorageCommand::PutDocument(item) => store.put(item),
            StorageCommand::PutHighlights { document, strokes } => {
                store.put_highlights(document, strokes)
            }
            StorageCommand::Delete(id) => store.delete(id),
        }
    }

    fn describe(&self) -> String {
        match self {
            StorageCommand::PutDocument(item) => format!("save document {}", item.id),
            StorageCommand::PutHighlights { document, strokes } => {
                format!("save {} highlights of {}", strokes.len(), document)
            }
            StorageCommand::Delete(id) => format!("delete document {}", id),
        }
    }
}

#[derive(Resource, Clone)]
pub struct Storage(pub Arc<dyn PersistenceStore>);

impl Default for Storage {
    fn default() -> Self {
        Self(Arc::new(JsonFileStore::new(crate::paths::store_dir())))
    }
}

/// Result of the startup load, shown by the chrome.
#[derive(Resource, Default)]
pub struct StorageStatus {
    pub loaded: bool,
    /// Set when the saved library could not be read; documents are unavailable
    pub load_error: Option<String>,
}

/// FIFO of pending writes with at most one in flight.
#[derive(Resource, Default)]
pub struct WriteQueue {
    pending: VecDeque<StorageCommand>,
    in_flight: Option<(String, Task<Result<(), StorageError>>)>,
}

impl WriteQueue {
    pub fn push(&mut self, command: StorageCommand) {
        self.pending.push_back(command);
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_none()
    }

    fn next(&mut self) -> Option<StorageCommand> {
        if self.in_flight.is_some() {
            return None;
        }
        self.pending.pop_front()
    }

    /// Wait for the in-flight write, then run everything still pending here.
    pub fn flush(&mut self, store: &dyn PersistenceStore) {
        if let Some((description, task)) = self.in_flight.take() {
            log_write(&description, future::block_on(task));
        }
        while let Some(command) = self.pending.pop_front() {
            log_write(&command.describe(), command.run(store));
        }
    }
}

fn log_write(description: &str, result: Result<(), StorageError>) {
    match result {
        Ok(()) => debug!("Storage: {} done", description),
        Err(e) => error!("Storage: failed to {}: {}", description, e),
    }
}

pub struct LoadedDocument {
    pub item: GalleryItem,
    pub strokes: Vec<Stroke>,
}

#[derive(Component)]
pub struct LibraryLoadTask(pub Task<Result<Vec<LoadedDocument>, StorageError>>);

/// Read every document and its highlight set.
///
/// A document whose highlights cannot be read still loads, with none.
pub fn load_library(store: &dyn PersistenceStore) -> Result<Vec<LoadedDocument>, StorageError> {
    let items = store.load_all()?;
    Ok(items
        .into_iter()
        .map(|item| {
            let strokes = store.load_highlights(&item.id).unwrap_or_else(|e| {
                warn!("Failed to load highlights of {}: {}", item.id, e);
                Vec::new()
            });
            LoadedDocument { item, strokes }
        })
        .collect())
}

fn start_library_load(mut commands: Commands, storage: Res<Storage>) {
    let store = storage.0.clone();
    let task = IoTaskPool::get().spawn(async move { load_library(store.as_ref()) });
    commands.spawn(LibraryLoadTask(task));
}

fn poll_library_load(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LibraryLoadTask)>,
    mut status: ResMut<StorageStatus>,
    mut gallery: ResMut<Gallery>,
    mut strokes: ResMut<StrokeStore>,
    mut active: ResMut<ActiveDocument>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        status.loaded = true;

        match result {
            Ok(documents) => {
                info!("Loaded {} stored documents", documents.len());
                for LoadedDocument { item, strokes: saved } in documents {
                    strokes.replace_all(&item.id, saved);
                    gallery.insert(Arc::new(item));
                }
                strokes.retain_documents(gallery.ids());
            }
            Err(e) => {
                error!("Failed to load stored documents: {}", e);
                status.load_error = Some(format!("Saved documents could not be loaded: {}", e));
            }
        }

        // The remembered document may have been deleted since last run
        if let Some(id) = active.id()
            && !gallery.contains(id)
        {
            info!("Remembered document {} is gone", id);
            active.clear();
        }
    }
}

fn queue_storage_commands(mut events: MessageReader<StorageCommand>, mut queue: ResMut<WriteQueue>) {
    for command in events.read() {
        queue.push(command.clone());
    }
}

fn drive_write_queue(storage: Res<Storage>, mut queue: ResMut<WriteQueue>) {
    if let Some((_, task)) = queue.in_flight.as_mut()
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        if let Some((description, _)) = queue.in_flight.take() {
            log_write(&description, result);
        }
    }

    if let Some(command) = queue.next() {
        let store = storage.0.clone();
        let description = command.describe();
        let task = IoTaskPool::get().spawn(async move { command.run(store.as_ref()) });
        queue.in_flight = Some((description, task));
    }
}

fn flush_on_exit(storage: Res<Storage>, mut queue: ResMut<WriteQueue>) {
    if queue.is_idle() {
        return;
    }
    info!("Flushing pending writes before exit");
    queue.flush(storage.0.as_ref());
}

pub struct StoragePlugin;

impl Plugin for StoragePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Storage>()
            .init_resource::<StorageStatus>()
            .init_resource::<WriteQueue>()
            .add_message::<StorageCommand>()
            .add_systems(
                Startup,
                start_library_load.after(crate::config::ConfigLoaded),
            )
            .add_systems(Update, (poll_library_load, drive_write_queue).chain())
            // Last, so commands written anywhere this frame are queued before an exit flush
            .add_systems(
                Last,
                (
                    queue_storage_commands,
                    flush_on_exit.run_if(on_message::<AppExit>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bevy::ecs::system::RunSystemOnce;
    use bevy::tasks::TaskPool;

    use super::*;
    use crate::documents::{DocumentBody, DocumentKind};

    #[derive(Default)]
    struct RecordingStore {
        log: Mutex<Vec<String>>,
        fail_highlights: bool,
    }

    impl PersistenceStore for RecordingStore {
        fn load_all(&self) -> Result<Vec<GalleryItem>, StorageError> {
            Ok(vec![GalleryItem {
                id: DocumentId("file-1-a.txt".to_string()),
                name: "a.txt".to_string(),
                kind: DocumentKind::Txt,
                body: DocumentBody::Html(String::new()),
                text_content: String::new(),
                page_count: None,
            }])
        }

        fn load_highlights(&self, _id: &DocumentId) -> Result<Vec<Stroke>, StorageError> {
            if self.fail_highlights {
                return Err(StorageError::Corrupt("bad".to_string()));
            }
            Ok(Vec::new())
        }

        fn put(&self, item: &GalleryItem) -> Result<(), StorageError> {
            self.log.lock().unwrap().push(format!("put {}", item.id));
            Ok(())
        }

        fn put_highlights(&self, id: &DocumentId, strokes: &[Stroke]) -> Result<(), StorageError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("highlights {} {}", id, strokes.len()));
            Ok(())
        }

        fn delete(&self, id: &DocumentId) -> Result<(), StorageError> {
            self.log.lock().unwrap().push(format!("delete {}", id));
            Err(StorageError::Corrupt("delete failed".to_string()))
        }
    }

    #[test]
    fn test_commands_dispatch_to_store() {
        let store = RecordingStore::default();
        let id = DocumentId("file-1-a.txt".to_string());

        StorageCommand::PutHighlights {
            document: id.clone(),
            strokes: Vec::new(),
        }
        .run(&store)
        .unwrap();
        assert!(StorageCommand::Delete(id).run(&store).is_err());

        assert_eq!(
            *store.log.lock().unwrap(),
            vec!["highlights file-1-a.txt 0", "delete file-1-a.txt"]
        );
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = WriteQueue::default();
        assert!(queue.is_idle());
        queue.push(StorageCommand::Delete(DocumentId("a".to_string())));
        queue.push(StorageCommand::Delete(DocumentId("b".to_string())));

        let first = queue.next();
        assert!(matches!(first, Some(StorageCommand::Delete(ref id)) if id.as_str() == "a"));
        assert!(!queue.is_idle());
    }

    #[test]
    fn test_highlight_failure_does_not_drop_document() {
        let store = RecordingStore {
            fail_highlights: true,
            ..Default::default()
        };
        let loaded = load_library(&store).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].strokes.is_empty());
    }

    #[test]
    fn test_exit_flush_runs_in_flight_and_pending_writes() {
        let store = Arc::new(RecordingStore::default());
        let id = DocumentId("file-1-a.txt".to_string());

        let mut queue = WriteQueue::default();
        let first = StorageCommand::PutHighlights {
            document: id.clone(),
            strokes: Vec::new(),
        };
        let background = store.clone();
        queue.in_flight = Some((
            first.describe(),
            IoTaskPool::get_or_init(TaskPool::new).spawn(async move { first.run(background.as_ref()) }),
        ));
        queue.push(StorageCommand::Delete(id.clone()));
        queue.push(StorageCommand::PutHighlights {
            document: id,
            strokes: Vec::new(),
        });

        let mut world = World::new();
        world.insert_resource(Storage(store.clone()));
        world.insert_resource(queue);
        world.run_system_once(flush_on_exit).unwrap();

        // The failed delete is logged and the flush carries on
        assert!(world.resource::<WriteQueue>().is_idle());
        assert_eq!(
            *store.log.lock().unwrap(),
            vec![
                "highlights file-1-a.txt 0",
                "delete file-1-a.txt",
                "highlights file-1-a.txt 0"
            ]
        );
    }
}
