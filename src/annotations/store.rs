//! In-memory authoritative set of committed strokes per document.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::documents::DocumentId;

use super::stroke::Stroke;

#[derive(Resource, Debug, Default)]
pub struct StrokeStore {
    collections: HashMap<DocumentId, Vec<Stroke>>,
}

impl StrokeStore {
    /// Create an empty collection for a document if it has none yet.
    pub fn ensure(&mut self, document: &DocumentId) {
        self.collections.entry(document.clone()).or_default();
    }

    /// Append a stroke on top of the document's existing strokes.
    ///
    /// No duplicate detection: callers must not append the same stroke twice.
    pub fn append(&mut self, document: &DocumentId, stroke: Stroke) {
        self.collections
            .entry(document.clone())
            .or_default()
            .push(stroke);
    }

    pub fn replace_all(&mut self, document: &DocumentId, strokes: Vec<Stroke>) {
        self.collections.insert(document.clone(), strokes);
    }

    pub fn remove(&mut self, document: &DocumentId) -> Option<Vec<Stroke>> {
        self.collections.remove(document)
    }

    pub fn strokes(&self, document: &DocumentId) -> &[Stroke] {
        self.collections
            .get(document)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, document: &DocumentId) -> bool {
        self.collections.contains_key(document)
    }

    pub fn document_count(&self) -> usize {
        self.collections.len()
    }

    /// Drop collections whose document is no longer in the gallery.
    pub fn retain_documents<'a>(&mut self, documents: impl IntoIterator<Item = &'a DocumentId>) {
        let keep: Vec<&DocumentId> = documents.into_iter().collect();
        self.collections.retain(|id, _| keep.contains(&id));
        for id in keep {
            self.ensure(id);
        }
    }
}
