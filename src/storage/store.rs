//! Persistence collaborator: documents and their highlight sets.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bevy::log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotations::Stroke;
use crate::documents::{DocumentBody, DocumentId, DocumentKind, GalleryItem, PageImage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Corrupt record {0}")]
    Corrupt(String),
}

pub trait PersistenceStore: Send + Sync {
    /// Every stored document, ordered by id.
    fn load_all(&self) -> Result<Vec<GalleryItem>, StorageError>;

    /// Highlights of one document; empty when none were saved.
    fn load_highlights(&self, id: &DocumentId) -> Result<Vec<Stroke>, StorageError>;

    fn put(&self, item: &GalleryItem) -> Result<(), StorageError>;

    fn put_highlights(&self, id: &DocumentId, strokes: &[Stroke]) -> Result<(), StorageError>;

    /// Remove a document together with its highlights.
    fn delete(&self, id: &DocumentId) -> Result<(), StorageError>;
}

/// On-disk manifest of a stored document. Page images live next to it.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    id: DocumentId,
    name: String,
    kind: DocumentKind,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    page_files: Vec<String>,
    #[serde(default)]
    text_content: String,
    #[serde(default)]
    page_count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HighlightRecord {
    file_id: DocumentId,
    highlights: Vec<Stroke>,
}

const DOCUMENT_FILE: &str = "document.json";

/// JSON files under a root directory:
/// `documents/<key>/document.json`, `documents/<key>/page-NNNN.png`
/// and `highlights/<key>.json`.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File-system safe encoding of a document id.
    pub fn key(id: &DocumentId) -> String {
        let mut key = String::with_capacity(id.as_str().len());
        for byte in id.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                key.push(byte as char);
            } else {
                key.push_str(&format!("%{:02X}", byte));
            }
        }
        key
    }

    fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    fn document_dir(&self, id: &DocumentId) -> PathBuf {
        self.documents_dir().join(Self::key(id))
    }

    fn highlights_file(&self, id: &DocumentId) -> PathBuf {
        self.root
            .join("highlights")
            .join(format!("{}.json", Self::key(id)))
    }

    fn read_document(&self, dir: &Path) -> Result<GalleryItem, StorageError> {
        let json = fs::read_to_string(dir.join(DOCUMENT_FILE))?;
        let record: DocumentRecord = serde_json::from_str(&json)?;

        let body = match record.html {
            Some(html) => DocumentBody::Html(html),
            None => {
                let mut pages = Vec::with_capacity(record.page_files.len());
                for file in &record.page_files {
                    let image = image::open(dir.join(file))?.to_rgba8();
                    pages.push(PageImage {
                        width: image.width(),
                        height: image.height(),
                        rgba: image.into_raw(),
                    });
                }
                DocumentBody::Pages(pages)
            }
        };

        Ok(GalleryItem {
            id: record.id,
            name: record.name,
            kind: record.kind,
            body,
            text_content: record.text_content,
            page_count: record.page_count,
        })
    }
}

/// Write through a sibling temp file so a crash never leaves a half-written record.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(result: std::io::Result<()>) -> Result<(), StorageError> {
    match result {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

impl PersistenceStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<GalleryItem>, StorageError> {
        let dir = self.documents_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.join(DOCUMENT_FILE).is_file() {
                continue;
            }
            match self.read_document(&path) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping unreadable document {:?}: {}", path, e),
            }
        }
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    fn load_highlights(&self, id: &DocumentId) -> Result<Vec<Stroke>, StorageError> {
        let path = self.highlights_file(id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let record: HighlightRecord = serde_json::from_str(&json)?;
        if &record.file_id != id {
            return Err(StorageError::Corrupt(format!(
                "{:?} holds highlights of {}",
                path, record.file_id
            )));
        }
        Ok(record.highlights)
    }

    fn put(&self, item: &GalleryItem) -> Result<(), StorageError> {
        let dir = self.document_dir(&item.id);
        remove_if_exists(fs::remove_dir_all(&dir))?;
        fs::create_dir_all(&dir)?;

        let (html, page_files) = match &item.body {
            DocumentBody::Html(html) => (Some(html.clone()), Vec::new()),
            DocumentBody::Pages(pages) => {
                let mut files = Vec::with_capacity(pages.len());
                for (index, page) in pages.iter().enumerate() {
                    let file = format!("page-{:04}.png", index + 1);
                    let image = image::RgbaImage::from_raw(page.width, page.height, page.rgba.clone())
                        .ok_or_else(|| {
                            StorageError::Corrupt(format!("page {} of {} has a bad size", index + 1, item.id))
                        })?;
                    image.save(dir.join(&file))?;
                    files.push(file);
                }
                (None, files)
            }
        };

        let record = DocumentRecord {
            id: item.id.clone(),
            name: item.name.clone(),
            kind: item.kind,
            html,
            page_files,
            text_content: item.text_content.clone(),
            page_count: item.page_count,
        };
        // Manifest last: a directory without it is an interrupted write
        write_atomic(&dir.join(DOCUMENT_FILE), &serde_json::to_string_pretty(&record)?)?;
        Ok(())
    }

    fn put_highlights(&self, id: &DocumentId, strokes: &[Stroke]) -> Result<(), StorageError> {
        let path = self.highlights_file(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let record = HighlightRecord {
            file_id: id.clone(),
            highlights: strokes.to_vec(),
        };
        write_atomic(&path, &serde_json::to_string_pretty(&record)?)?;
        Ok(())
    }

    fn delete(&self, id: &DocumentId) -> Result<(), StorageError> {
        remove_if_exists(fs::remove_dir_all(self.document_dir(id)))?;
        remove_if_exists(fs::remove_file(self.highlights_file(id)))
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::Vec2;

    use super::*;
    use crate::annotations::StrokeColor;

    fn text_item(id: &str) -> GalleryItem {
        GalleryItem {
            id: DocumentId(id.to_string()),
            name: "notes.txt".to_string(),
            kind: DocumentKind::Txt,
            body: DocumentBody::Html("<pre>hello</pre>".to_string()),
            text_content: "hello".to_string(),
            page_count: None,
        }
    }

    fn stroke() -> Stroke {
        let mut s = Stroke::start(Vec2::new(25.0, 50.0), StrokeColor::srgba(1.0, 1.0, 0.2, 0.5), 24.0);
        s.points.push(Vec2::new(35.0, 70.0));
        s
    }

    #[test]
    fn test_key_is_file_system_safe() {
        let key = JsonFileStore::key(&DocumentId("file-17-my notes/../v1.txt".to_string()));
        assert_eq!(key, "file-17-my%20notes%2F%2E%2E%2Fv1%2Etxt");
    }

    #[test]
    fn test_text_document_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let item = text_item("file-2-b.txt");

        store.put(&item).unwrap();
        store.put(&text_item("file-1-a.txt")).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id.as_str(), "file-1-a.txt");
        assert_eq!(loaded[1], item);
    }

    #[test]
    fn test_page_images_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let item = GalleryItem {
            id: DocumentId("file-3-deck.pdf".to_string()),
            name: "deck.pdf".to_string(),
            kind: DocumentKind::Pdf,
            body: DocumentBody::Pages(vec![PageImage {
                width: 2,
                height: 1,
                rgba: vec![255, 0, 0, 255, 0, 0, 255, 255],
            }]),
            text_content: "deck".to_string(),
            page_count: Some(1),
        };

        store.put(&item).unwrap();

        assert_eq!(store.load_all().unwrap(), vec![item]);
    }

    #[test]
    fn test_bad_page_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut item = text_item("file-4-x.pdf");
        item.body = DocumentBody::Pages(vec![PageImage {
            width: 10,
            height: 10,
            rgba: vec![0; 4],
        }]);
        assert!(matches!(store.put(&item), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_highlights_round_trip_and_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let id = DocumentId("file-1-a.txt".to_string());

        assert!(store.load_highlights(&id).unwrap().is_empty());

        let strokes = vec![stroke(), stroke()];
        store.put_highlights(&id, &strokes).unwrap();
        assert_eq!(store.load_highlights(&id).unwrap(), strokes);

        store.put_highlights(&id, &[]).unwrap();
        assert!(store.load_highlights(&id).unwrap().is_empty());
    }

    #[test]
    fn test_highlight_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let id = DocumentId("file-1-a.txt".to_string());
        store.put_highlights(&id, &[stroke()]).unwrap();

        let json = fs::read_to_string(store.highlights_file(&id)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["file_id"], "file-1-a.txt");
        assert_eq!(value["highlights"][0]["points"][1], serde_json::json!([35.0, 70.0]));
    }

    #[test]
    fn test_delete_removes_document_and_highlights() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let item = text_item("file-1-a.txt");
        store.put(&item).unwrap();
        store.put_highlights(&item.id, &[stroke()]).unwrap();

        store.delete(&item.id).unwrap();

        assert!(store.load_all().unwrap().is_empty());
        assert!(store.load_highlights(&item.id).unwrap().is_empty());
        // Deleting again is not an error
        store.delete(&item.id).unwrap();
    }

    #[test]
    fn test_interrupted_write_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::create_dir_all(dir.path().join("documents").join("half-written")).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_manifest_skips_only_that_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.put(&text_item("file-1-a.txt")).unwrap();
        store.put(&text_item("file-3-c.txt")).unwrap();
        let doc_dir = dir.path().join("documents").join("broken");
        fs::create_dir_all(&doc_dir).unwrap();
        fs::write(doc_dir.join(DOCUMENT_FILE), "{ not json").unwrap();

        let loaded = store.load_all().unwrap();

        let ids: Vec<&str> = loaded.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["file-1-a.txt", "file-3-c.txt"]);
    }

    #[test]
    fn test_writes_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let item = text_item("file-1-a.txt");
        store.put(&item).unwrap();
        store.put_highlights(&item.id, &[stroke()]).unwrap();

        let doc_files: Vec<_> = fs::read_dir(store.document_dir(&item.id))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(doc_files, vec![std::ffi::OsString::from(DOCUMENT_FILE)]);
        assert!(!store.highlights_file(&item.id).with_extension("json.tmp").exists());
    }
}
