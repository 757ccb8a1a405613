use crate::documents::gallery::{DocumentBody, DocumentKind};

use super::markup::escape_html;
use super::{ConvertedDocument, DecodeError, DocumentConverter};

pub struct PlainTextConverter;

impl DocumentConverter for PlainTextConverter {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Txt
    }

    fn convert(&self, bytes: &[u8]) -> Result<ConvertedDocument, DecodeError> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        Ok(ConvertedDocument {
            body: DocumentBody::Html(format!("<pre>{}</pre>", escape_html(&text))),
            text_content: text,
            page_count: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::convert::markup::html_to_text;

    #[test]
    fn test_text_is_wrapped_in_pre() {
        let doc = PlainTextConverter.convert(b"line one\n<b>two</b>").unwrap();
        assert_eq!(
            doc.body,
            DocumentBody::Html("<pre>line one\n&lt;b&gt;two&lt;/b&gt;</pre>".to_string())
        );
        assert_eq!(doc.text_content, "line one\n<b>two</b>");
        assert_eq!(doc.page_count, None);
    }

    #[test]
    fn test_displayed_text_matches_source() {
        let source = "  a\n\n\tb & c";
        let doc = PlainTextConverter.convert(source.as_bytes()).unwrap();
        let DocumentBody::Html(html) = doc.body else {
            panic!("expected html body");
        };
        assert_eq!(html_to_text(&html), source);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let doc = PlainTextConverter.convert(&[b'o', b'k', 0xff]).unwrap();
        assert_eq!(doc.text_content, "ok\u{fffd}");
    }
}
