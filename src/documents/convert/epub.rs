//! EPUB converter: container -> package document -> spine sections.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::documents::gallery::{DocumentBody, DocumentKind};

use super::markup::{attribute, html_to_text, tag_attributes};
use super::{ConvertedDocument, DecodeError, DocumentConverter, open_archive, read_entry};

static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").expect("body regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(img|image|svg)\b[^>]*/?>").expect("image regex"));

pub struct EpubConverter;

/// Resolve an href relative to the directory of the package document.
fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href).replace("%20", " ");
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Body markup of one XHTML section, with images removed.
fn section_body(xhtml: &str) -> String {
    let body = BODY
        .captures(xhtml)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(xhtml);
    IMAGE.replace_all(body, "").into_owned()
}

impl DocumentConverter for EpubConverter {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Epub
    }

    fn convert(&self, bytes: &[u8]) -> Result<ConvertedDocument, DecodeError> {
        let mut archive = open_archive(bytes)?;

        let container = read_entry(&mut archive, "META-INF/container.xml")?;
        let package_path = tag_attributes(&container, "rootfile")
            .into_iter()
            .find_map(|attrs| attribute(attrs, "full-path"))
            .ok_or_else(|| DecodeError::Malformed("container has no rootfile".to_string()))?;
        let base_dir = package_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();

        let package = read_entry(&mut archive, &package_path)?;
        let manifest: HashMap<String, String> = tag_attributes(&package, "item")
            .into_iter()
            .filter_map(|attrs| Some((attribute(attrs, "id")?, attribute(attrs, "href")?)))
            .collect();
        let spine: Vec<String> = tag_attributes(&package, "itemref")
            .into_iter()
            .filter_map(|attrs| attribute(attrs, "idref"))
            .collect();
        if spine.is_empty() {
            return Err(DecodeError::Malformed("package has an empty spine".to_string()));
        }

        let mut html = String::new();
        for idref in &spine {
            let href = manifest
                .get(idref)
                .ok_or_else(|| DecodeError::Malformed(format!("spine item {} not in manifest", idref)))?;
            let section = read_entry(&mut archive, &resolve_href(&base_dir, href))?;
            html.push_str(&section_body(&section));
        }

        Ok(ConvertedDocument {
            text_content: html_to_text(&html),
            body: DocumentBody::Html(html),
            page_count: Some(spine.len() as u32),
        })
    }
}
