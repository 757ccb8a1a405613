//! Small HTML/XML helpers shared by the converters.
//!
//! Office and EPUB payloads are well-formed XML produced by tools, so regex
//! extraction of a handful of known elements is enough here.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static PRE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").expect("pre block regex"));
static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|head)[^>]*>.*?</(script|style|head)>")
        .expect("script/style regex")
});
static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|section|table|blockquote)>")
        .expect("block break regex")
});
static CELL_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</t[dh]>").expect("cell break regex"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("blank lines regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex")
});

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the named XML entities plus numeric character references.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Readable plain text for an HTML fragment.
///
/// Whitespace outside `<pre>` collapses like a browser would; block elements
/// end lines and table cells are tab-separated.
pub fn html_to_text(html: &str) -> String {
    let html = SCRIPT_STYLE.replace_all(html, "");
    let mut out = String::new();
    let mut last = 0;
    for caps in PRE_BLOCK.captures_iter(&html) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&flow_to_text(&html[last..whole.start()]));
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&decode_entities(&ANY_TAG.replace_all(inner.as_str(), "")));
        out.push('\n');
        last = whole.end();
    }
    out.push_str(&flow_to_text(&html[last..]));
    out.trim_matches('\n').to_string()
}

fn flow_to_text(html: &str) -> String {
    let collapsed = WHITESPACE.replace_all(html, " ");
    let cells = CELL_BREAK.replace_all(&collapsed, "\t");
    let breaks = BLOCK_BREAK.replace_all(&cells, "\n");
    let stripped = ANY_TAG.replace_all(&breaks, "");
    let decoded = decode_entities(&stripped);
    let lines: Vec<&str> = decoded
        .split('\n')
        .map(|line| line.trim_matches(|c| c == ' ' || c == '\t'))
        .collect();
    BLANK_LINES
        .replace_all(lines.join("\n").trim(), "\n\n")
        .into_owned()
}

/// Decoded text of every `<tag ...>text</tag>` element, in document order.
pub fn element_texts(xml: &str, tag: &str) -> Vec<String> {
    let pattern = format!(r"(?s)<{tag}(?:\s[^>]*)?>(.*?)</{tag}>", tag = regex::escape(tag));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
        .collect()
}

/// Inner XML of every `<tag ...>...</tag>` block, in document order.
///
/// Self-closing `<tag/>` elements are skipped.
pub fn element_blocks<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let pattern = format!(r"(?s)<{tag}(?:\s[^>]*)?>(.*?)</{tag}>", tag = regex::escape(tag));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Value of `name="..."` inside a single tag's attribute text.
pub fn attribute(tag_text: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?:^|\s){}\s*=\s*["']([^"']*)["']"#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag_text)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
}

/// Attribute text of every opening or self-closing `<tag ...>`.
pub fn tag_attributes<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let pattern = format!(r"(?s)<{}(\s[^>]*?)?/?>", regex::escape(tag));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .map(|caps| caps.get(1).map(|m| m.as_str()).unwrap_or(""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&lt;a&gt; &amp;&#65;&#x42; &bogus;"), "<a> &AB &bogus;");
    }

    #[test]
    fn test_html_to_text_blocks_and_whitespace() {
        let html = "<h1>Title</h1>\n   <p>First   line</p><p>Second<br/>third</p>";
        assert_eq!(html_to_text(html), "Title\nFirst line\nSecond\nthird");
    }

    #[test]
    fn test_html_to_text_keeps_pre_whitespace() {
        let html = format!("<pre>{}</pre>", escape_html("  indented\n\n<tag> & more"));
        assert_eq!(html_to_text(&html), "  indented\n\n<tag> & more");
    }

    #[test]
    fn test_html_to_text_drops_scripts_and_tabs_cells() {
        let html = "<style>p{}</style><table><tr><td>a</td><td>b</td></tr></table>";
        assert_eq!(html_to_text(html), "a\tb");
    }

    #[test]
    fn test_element_texts_with_attributes() {
        let xml = r#"<w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world &amp; co</w:t></w:r><w:tab/>"#;
        assert_eq!(element_texts(xml, "w:t"), vec!["Hello", " world & co"]);
    }

    #[test]
    fn test_element_blocks_do_not_match_longer_names() {
        let xml = "<w:p><w:pPr><w:jc/></w:pPr><w:t>x</w:t></w:p><w:p/>";
        let blocks = element_blocks(xml, "w:p");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("<w:t>x</w:t>"));
    }

    #[test]
    fn test_attributes() {
        let tags = tag_attributes(
            r#"<item id="c1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/><itemref idref="c1"/>"#,
            "item",
        );
        assert_eq!(tags.len(), 1);
        assert_eq!(attribute(tags[0], "href").as_deref(), Some("text/ch1.xhtml"));
        assert_eq!(attribute(tags[0], "id").as_deref(), Some("c1"));
        assert_eq!(attribute(tags[0], "missing"), None);
    }
}
