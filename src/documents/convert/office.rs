//! Office Open XML converters (DOCX, PPTX, XLSX).

use std::sync::LazyLock;

use regex::Regex;

use crate::documents::gallery::{DocumentBody, DocumentKind};

use super::markup::{attribute, element_blocks, element_texts, escape_html, tag_attributes};
use super::{
    ConvertedDocument, DecodeError, DocumentConverter, numbered_entries, open_archive, read_entry,
    read_optional_entry,
};

static CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<c(\s[^>]*?)?(?:/>|>(.*?)</c>)").expect("cell regex")
});

/// Concatenated run text of one paragraph.
fn paragraph_text(paragraph: &str, run_tag: &str) -> String {
    element_texts(paragraph, run_tag).concat()
}

pub struct DocxConverter;

impl DocumentConverter for DocxConverter {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Docx
    }

    fn convert(&self, bytes: &[u8]) -> Result<ConvertedDocument, DecodeError> {
        let mut archive = open_archive(bytes)?;
        let document = read_entry(&mut archive, "word/document.xml")?;

        let paragraphs: Vec<String> = element_blocks(&document, "w:p")
            .into_iter()
            .map(|p| paragraph_text(p, "w:t"))
            .collect();

        let html = paragraphs
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| format!("<p>{}</p>", escape_html(p)))
            .collect::<String>();

        Ok(ConvertedDocument {
            body: DocumentBody::Html(html),
            text_content: paragraphs.join("\n"),
            page_count: None,
        })
    }
}

pub struct PptxConverter;

impl DocumentConverter for PptxConverter {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pptx
    }

    fn convert(&self, bytes: &[u8]) -> Result<ConvertedDocument, DecodeError> {
        let mut archive = open_archive(bytes)?;
        let slides = numbered_entries(&archive, "ppt/slides/slide", ".xml");
        if slides.is_empty() {
            return Err(DecodeError::Malformed("presentation has no slides".to_string()));
        }

        let mut html = String::new();
        let mut texts = Vec::with_capacity(slides.len());
        for (position, (_, name)) in slides.iter().enumerate() {
            let xml = read_entry(&mut archive, name)?;
            let paragraphs: Vec<String> = element_blocks(&xml, "a:p")
                .into_iter()
                .map(|p| paragraph_text(p, "a:t"))
                .filter(|p| !p.trim().is_empty())
                .collect();

            html.push_str(&format!("<section><h2>Slide {}</h2>", position + 1));
            for paragraph in &paragraphs {
                html.push_str(&format!("<p>{}</p>", escape_html(paragraph)));
            }
            html.push_str("</section>");
            texts.push(paragraphs.join("\n"));
        }

        Ok(ConvertedDocument {
            body: DocumentBody::Html(html),
            text_content: texts.join("\n\n"),
            page_count: Some(slides.len() as u32),
        })
    }
}

pub struct XlsxConverter;

/// Columns in a worksheet, `A` through `XFD`.
const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index of a cell reference such as `AB12`.
fn column_index(reference: &str) -> Result<Option<usize>, DecodeError> {
    let mut index = 0usize;
    for c in reference.chars().take_while(|c| c.is_ascii_alphabetic()) {
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        index = index * 26 + digit;
        if index > MAX_COLUMNS {
            return Err(DecodeError::Malformed(format!(
                "cell reference {} is past the last column",
                reference
            )));
        }
    }
    Ok(index.checked_sub(1))
}

fn shared_strings(xml: &str) -> Vec<String> {
    element_blocks(xml, "si")
        .into_iter()
        .map(|si| element_texts(si, "t").concat())
        .collect()
}

fn sheet_rows(xml: &str, strings: &[String]) -> Result<Vec<Vec<String>>, DecodeError> {
    element_blocks(xml, "row")
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = Vec::new();
            for caps in CELL.captures_iter(row) {
                let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let body = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                let value = cell_value(attrs, body, strings);

                let referenced = match attribute(attrs, "r") {
                    Some(r) => column_index(&r)?,
                    None => None,
                };
                let column = referenced.unwrap_or(cells.len());
                if column >= MAX_COLUMNS {
                    return Err(DecodeError::Malformed("row has too many cells".to_string()));
                }
                if column >= cells.len() {
                    cells.resize(column + 1, String::new());
                }
                cells[column] = value;
            }
            Ok(cells)
        })
        .collect()
}

fn cell_value(attrs: &str, body: &str, strings: &[String]) -> String {
    let raw = element_texts(body, "v").into_iter().next();
    match attribute(attrs, "t").as_deref() {
        Some("s") => raw
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| strings.get(i).cloned())
            .unwrap_or_default(),
        Some("inlineStr") => element_texts(body, "t").concat(),
        Some("b") => match raw.as_deref().map(str::trim) {
            Some("1") => "TRUE".to_string(),
            Some(_) => "FALSE".to_string(),
            None => String::new(),
        },
        _ => raw.unwrap_or_default(),
    }
}

impl DocumentConverter for XlsxConverter {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Xlsx
    }

    fn convert(&self, bytes: &[u8]) -> Result<ConvertedDocument, DecodeError> {
        let mut archive = open_archive(bytes)?;
        let strings = read_optional_entry(&mut archive, "xl/sharedStrings.xml")?
            .map(|xml| shared_strings(&xml))
            .unwrap_or_default();
        let sheet_names: Vec<String> = read_optional_entry(&mut archive, "xl/workbook.xml")?
            .map(|xml| {
                tag_attributes(&xml, "sheet")
                    .into_iter()
                    .filter_map(|attrs| attribute(attrs, "name"))
                    .collect()
            })
            .unwrap_or_default();

        let sheets = numbered_entries(&archive, "xl/worksheets/sheet", ".xml");
        if sheets.is_empty() {
            return Err(DecodeError::Malformed("workbook has no sheets".to_string()));
        }

        let mut html = String::new();
        let mut texts = Vec::with_capacity(sheets.len());
        for (position, (number, entry)) in sheets.iter().enumerate() {
            let xml = read_entry(&mut archive, entry)?;
            let rows = sheet_rows(&xml, &strings)?;
            let name = sheet_names
                .get(position)
                .cloned()
                .unwrap_or_else(|| format!("Sheet{}", number));

            html.push_str(&format!("<h2>{}</h2><table>", escape_html(&name)));
            for row in &rows {
                html.push_str("<tr>");
                for cell in row {
                    html.push_str(&format!("<td>{}</td>", escape_html(cell)));
                }
                html.push_str("</tr>");
            }
            html.push_str("</table>");

            let sheet_text: Vec<String> = rows.iter().map(|row| row.join("\t")).collect();
            texts.push(sheet_text.join("\n").trim_matches('\n').to_string());
        }

        Ok(ConvertedDocument {
            body: DocumentBody::Html(html),
            text_content: texts.join("\n\n"),
            page_count: None,
        })
    }
}
