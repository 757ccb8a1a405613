//! Uploaded documents and the active document selection.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Id for a freshly uploaded file: `file-<unix millis>-<file name>`.
    pub fn for_upload(file_name: &str, unix_millis: i64) -> Self {
        Self(format!("file-{}-{}", unix_millis, file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
    Pptx,
    Xlsx,
    Epub,
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
            Self::Epub => "epub",
        }
    }
}

/// One rasterized page, tightly packed RGBA8.
#[derive(Clone, PartialEq)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    Pages(Vec<PageImage>),
    Html(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub id: DocumentId,
    pub name: String,
    pub kind: DocumentKind,
    pub body: DocumentBody,
    /// Plain text used for read-aloud and as assistant context.
    pub text_content: String,
    pub page_count: Option<u32>,
}

/// Every uploaded document, in upload order.
#[derive(Resource, Debug, Default)]
pub struct Gallery {
    items: Vec<Arc<GalleryItem>>,
}

impl Gallery {
    pub fn items(&self) -> &[Arc<GalleryItem>] {
        &self.items
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Arc<GalleryItem>> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.get(id).is_some()
    }

    /// Add an item, replacing any item with the same id in place.
    pub fn insert(&mut self, item: Arc<GalleryItem>) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, id: &DocumentId) -> Option<Arc<GalleryItem>> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.items.iter().map(|item| &item.id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// The document shown in the viewer.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct ActiveDocument {
    id: Option<DocumentId>,
}

impl ActiveDocument {
    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    pub fn is(&self, id: &DocumentId) -> bool {
        self.id.as_ref() == Some(id)
    }

    pub fn set(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    pub fn clear(&mut self) {
        self.id = None;
    }
}

/// Visibility of the gallery window.
#[derive(Resource, Debug, Default)]
pub struct GalleryWindow {
    pub open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Arc<GalleryItem> {
        Arc::new(GalleryItem {
            id: DocumentId(id.to_string()),
            name: format!("{}.txt", id),
            kind: DocumentKind::Txt,
            body: DocumentBody::Html("<pre>hi</pre>".to_string()),
            text_content: "hi".to_string(),
            page_count: None,
        })
    }

    #[test]
    fn test_upload_id_format() {
        let id = DocumentId::for_upload("notes.txt", 1_700_000_000_123);
        assert_eq!(id.as_str(), "file-1700000000123-notes.txt");
    }

    #[test]
    fn test_kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_extension("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::from_path(Path::new("/tmp/deck.PptX")),
            Some(DocumentKind::Pptx)
        );
        assert_eq!(DocumentKind::from_extension("doc"), None);
        assert_eq!(DocumentKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_every_supported_extension_round_trips() {
        for ext in crate::constants::SUPPORTED_EXTENSIONS {
            let kind = DocumentKind::from_extension(ext);
            assert_eq!(kind.map(|k| k.extension()), Some(ext));
        }
    }

    #[test]
    fn test_gallery_insert_replaces_same_id() {
        let mut gallery = Gallery::default();
        gallery.insert(item("a"));
        gallery.insert(item("b"));
        let mut replacement = (*item("a")).clone();
        replacement.name = "renamed.txt".to_string();
        gallery.insert(Arc::new(replacement));

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.items()[0].name, "renamed.txt");
    }

    #[test]
    fn test_gallery_remove() {
        let mut gallery = Gallery::default();
        gallery.insert(item("a"));
        let id = DocumentId("a".to_string());
        assert!(gallery.remove(&id).is_some());
        assert!(gallery.remove(&id).is_none());
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_active_document() {
        let mut active = ActiveDocument::default();
        let id = DocumentId("a".to_string());
        assert!(active.id().is_none());
        active.set(id.clone());
        assert!(active.is(&id));
        active.clear();
        assert!(!active.is(&id));
    }
}
