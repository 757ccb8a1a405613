//! PDF rasterization through MuPDF.

use mupdf::{Colorspace, Document, Matrix, Pixmap, TextPageFlags};

use crate::constants::PDF_RENDER_SCALE;
use crate::documents::gallery::{DocumentBody, DocumentKind, PageImage};

use super::{ConvertedDocument, DecodeError, DocumentConverter};

pub struct PdfConverter;

/// Repack pixmap samples (RGB or RGBA, padded rows) into tight RGBA8.
fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<PageImage, DecodeError> {
    let n = pixmap.n() as usize;
    if n != 3 && n != 4 {
        return Err(DecodeError::Malformed(format!(
            "unsupported pixmap format: {} channels",
            n
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(DecodeError::Malformed("pixmap buffer size mismatch".to_string()));
    }

    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        for px in row.chunks_exact(n) {
            rgba.extend_from_slice(&px[..3]);
            rgba.push(if n == 4 { px[3] } else { u8::MAX });
        }
    }

    Ok(PageImage {
        width: width as u32,
        height: height as u32,
        rgba,
    })
}

impl DocumentConverter for PdfConverter {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn convert(&self, bytes: &[u8]) -> Result<ConvertedDocument, DecodeError> {
        let doc = Document::from_bytes(bytes, "application/pdf")?;
        let page_count = doc.page_count()?;
        let transform = Matrix::new_scale(PDF_RENDER_SCALE, PDF_RENDER_SCALE);
        let rgb = Colorspace::device_rgb();

        let mut pages = Vec::with_capacity(page_count.max(0) as usize);
        let mut text = String::new();
        for index in 0..page_count {
            let page = doc.load_page(index)?;
            let pixmap = page.to_pixmap(&transform, &rgb, false, false)?;
            pages.push(pixmap_to_rgba(&pixmap)?);

            let text_page = page.to_text_page(TextPageFlags::empty())?;
            let mut words: Vec<String> = Vec::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line.chars().filter_map(|ch| ch.char()).collect();
                    if !line_text.trim().is_empty() {
                        words.push(line_text);
                    }
                }
            }
            text.push_str(&words.join(" "));
        }

        Ok(ConvertedDocument {
            body: DocumentBody::Pages(pages),
            text_content: text,
            page_count: Some(page_count.max(0) as u32),
        })
    }
}
