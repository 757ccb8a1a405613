//! Format registry turning uploaded bytes into renderable documents.
//!
//! Each supported format implements [`DocumentConverter`]; the
//! [`FormatRegistry`] resource picks the converter by [`DocumentKind`] and is
//! cheap to clone into a conversion task.

mod epub;
pub mod markup;
mod office;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use bevy::prelude::*;
use thiserror::Error;
use zip::ZipArchive;

use super::gallery::{DocumentBody, DocumentKind};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported file type: .{0}")]
    Unsupported(String),
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Missing archive entry: {0}")]
    MissingEntry(String),
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[cfg(feature = "pdf")]
    #[error("Failed to render PDF: {0}")]
    Pdf(#[from] mupdf::error::Error),
}

/// Output of a converter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedDocument {
    pub body: DocumentBody,
    pub text_content: String,
    pub page_count: Option<u32>,
}

pub trait DocumentConverter: Send + Sync {
    fn kind(&self) -> DocumentKind;

    fn convert(&self, bytes: &[u8]) -> Result<ConvertedDocument, DecodeError>;
}

#[derive(Resource, Clone)]
pub struct FormatRegistry {
    converters: HashMap<DocumentKind, Arc<dyn DocumentConverter>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(text::PlainTextConverter);
        registry.register(office::DocxConverter);
        registry.register(office::PptxConverter);
        registry.register(office::XlsxConverter);
        registry.register(epub::EpubConverter);
        #[cfg(feature = "pdf")]
        registry.register(pdf::PdfConverter);
        registry
    }

    /// Register a converter, replacing any previous one for the same kind.
    pub fn register(&mut self, converter: impl DocumentConverter + 'static) {
        self.converters.insert(converter.kind(), Arc::new(converter));
    }

    pub fn supports(&self, kind: DocumentKind) -> bool {
        self.converters.contains_key(&kind)
    }

    pub fn convert(&self, bytes: &[u8], kind: DocumentKind) -> Result<ConvertedDocument, DecodeError> {
        let converter = self
            .converters
            .get(&kind)
            .ok_or_else(|| DecodeError::Unsupported(kind.extension().to_string()))?;
        converter.convert(bytes)
    }
}

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, DecodeError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read a UTF-8 entry from an archive.
fn read_entry(archive: &mut Archive<'_>, name: &str) -> Result<String, DecodeError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(DecodeError::MissingEntry(name.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let mut raw = Vec::new();
    entry.read_to_end(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Read an entry that may be absent.
fn read_optional_entry(archive: &mut Archive<'_>, name: &str) -> Result<Option<String>, DecodeError> {
    match read_entry(archive, name) {
        Ok(text) => Ok(Some(text)),
        Err(DecodeError::MissingEntry(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Entries named `<prefix><N><suffix>`, sorted by N.
fn numbered_entries(archive: &Archive<'_>, prefix: &str, suffix: &str) -> Vec<(u32, String)> {
    let mut entries: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
            number.parse::<u32>().ok().map(|n| (n, name.to_string()))
        })
        .collect();
    entries.sort();
    entries
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Write};

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Build an in-memory zip archive from `(name, contents)` pairs.
    pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, contents) in entries {
            zip.start_file(name.to_string(), options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}
