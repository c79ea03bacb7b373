//! Front-matter header encoding and decoding.
//!
//! Every content file this crate emits is a header block followed by a body:
//!
//! ```text
//! ---
//! layout: "layouts/base.njk"
//! permalink: "about.html"
//! head_styles: |
//!   <style>
//!   body { margin: 0 }
//!   </style>
//! other_slugs:
//!   - "spring-tour"
//! ---
//! <section class="hero">…</section>
//! ```
//!
//! ## Value kinds
//!
//! | Kind | Rendering |
//! |------|-----------|
//! | Scalar without line breaks | `key: "value"`, `\` and `"` backslash-escaped |
//! | Scalar with line breaks | `key: \|` then each line indented two spaces, verbatim |
//! | List | `key:` then one `  - "item"` line per element |
//!
//! Line endings inside multi-line scalars are normalized to `\n` on insert,
//! so `\r\n` values render as plain block lines and parse back unchanged.
//!
//! Absent values are omitted entirely, so a page without a stylesheet link has
//! no `css_href` line rather than `css_href: ""`.
//!
//! ## Ordering
//!
//! Keys render in insertion order. Templates look fields up by key, but stable
//! order keeps repeated builds byte-identical.

use thiserror::Error;

/// Delimiter line bounding the header.
pub const DELIMITER: &str = "---";

const INDENT: &str = "  ";

#[derive(Error, Debug, PartialEq)]
pub enum FrontMatterError {
    #[error("document does not start with a `---` header")]
    MissingHeader,
    #[error("header is not terminated by a closing `---`")]
    Unterminated,
    #[error("malformed header line {line}: {text:?}")]
    Malformed { line: usize, text: String },
}

/// A single header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string. Rendered as a block literal when it contains a line break.
    Str(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::List(_) => None,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// An insertion-ordered header record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: Vec<(String, Value)>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        let value = match value.into() {
            Value::Str(s) if s.contains('\n') => Value::Str(normalize_line_ends(&s)),
            value => value,
        };
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Set `key` only when a value is present.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Set `key` unless `value` is empty. Page headers treat an empty
    /// extraction as absent.
    pub fn insert_non_empty(&mut self, key: &str, value: &str) {
        self.insert_opt(key, Some(value).filter(|v| !v.is_empty()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value of `key`, or `None` when absent or a list.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the header followed by the trimmed body and a final newline.
    pub fn render(&self, body: &str) -> String {
        let mut lines = vec![DELIMITER.to_string()];
        for (key, value) in &self.entries {
            match value {
                Value::List(items) => {
                    lines.push(format!("{key}:"));
                    lines.extend(
                        items
                            .iter()
                            .map(|item| format!("{INDENT}- \"{}\"", escape(item))),
                    );
                }
                Value::Str(s) if s.contains('\n') => {
                    lines.push(format!("{key}: |"));
                    lines.extend(s.split('\n').map(|line| format!("{INDENT}{line}")));
                }
                Value::Str(s) => lines.push(format!("{key}: \"{}\"", escape(s))),
            }
        }
        lines.push(DELIMITER.to_string());
        format!("{}\n{}\n", lines.join("\n"), body.trim())
    }

    /// Split a document into its header record and body.
    ///
    /// The body is returned as written after the closing delimiter line.
    pub fn parse(document: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
        let document = document.strip_prefix('\u{feff}').unwrap_or(document);
        let rest = document
            .strip_prefix(DELIMITER)
            .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
            .ok_or(FrontMatterError::MissingHeader)?;

        let mut header_lines = Vec::new();
        let mut body = None;
        let mut offset = 0;
        for raw in rest.split_inclusive('\n') {
            offset += raw.len();
            let line = raw.trim_end_matches(['\n', '\r']);
            if line == DELIMITER {
                body = Some(&rest[offset..]);
                break;
            }
            header_lines.push(line);
        }
        let body = body.ok_or(FrontMatterError::Unterminated)?;

        let mut fm = FrontMatter::new();
        let mut i = 0;
        while i < header_lines.len() {
            let line = header_lines[i];
            i += 1;
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let (key, raw_value) = line.split_once(':').ok_or_else(|| malformed(i, line))?;
            let key = key.trim();
            if key.is_empty() || line.starts_with(' ') {
                return Err(malformed(i, line));
            }
            let raw_value = raw_value.trim();

            if raw_value == "|" {
                let mut block = Vec::new();
                while i < header_lines.len() && is_continuation(header_lines[i]) {
                    let l = header_lines[i];
                    block.push(l.strip_prefix(INDENT).unwrap_or(l.trim_start()));
                    i += 1;
                }
                fm.insert(key, block.join("\n"));
            } else if raw_value.is_empty() {
                let mut items = Vec::new();
                while let Some(item) = header_lines
                    .get(i)
                    .and_then(|l| l.trim_start().strip_prefix("- "))
                {
                    items.push(parse_scalar(item.trim()));
                    i += 1;
                }
                fm.insert(key, items);
            } else {
                fm.insert(key, parse_scalar(raw_value));
            }
        }
        Ok((fm, body))
    }
}

fn malformed(line: usize, text: &str) -> FrontMatterError {
    FrontMatterError::Malformed {
        line,
        text: text.to_string(),
    }
}

/// Drop the `\r` of every `\r\n`, including a trailing `\r` on the last line.
fn normalize_line_ends(value: &str) -> String {
    value
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Block literal lines are indented; blank lines inside a block are kept.
fn is_continuation(line: &str) -> bool {
    line.starts_with(INDENT) || line.is_empty()
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            _ => out.push(c),
        }
    }
    out
}

/// Double-quoted, single-quoted, or plain scalar.
fn parse_scalar(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        unescape(&raw[1..raw.len() - 1])
    } else if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        raw[1..raw.len() - 1].replace("''", "'")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrontMatter {
        let mut fm = FrontMatter::new();
        fm.insert("layout", "layouts/base.njk");
        fm.insert("title", r#"Say "hi""#);
        fm.insert("head_styles", "<style>\n  body { margin: 0 }\n</style>");
        fm.insert(
            "other_slugs",
            vec!["a".to_string(), r#"b "quoted""#.to_string()],
        );
        fm
    }

    #[test]
    fn renders_all_value_kinds() {
        let out = sample().render("\n  <p>Body</p>\n");
        assert_eq!(
            out,
            "---\n\
             layout: \"layouts/base.njk\"\n\
             title: \"Say \\\"hi\\\"\"\n\
             head_styles: |\n  <style>\n    body { margin: 0 }\n  </style>\n\
             other_slugs:\n  - \"a\"\n  - \"b \\\"quoted\\\"\"\n\
             ---\n<p>Body</p>\n"
        );
    }

    #[test]
    fn block_literal_does_not_escape_quotes() {
        let mut fm = FrontMatter::new();
        fm.insert("head_extra", "<meta content=\"x\">\n<link rel=\"y\">");
        let out = fm.render("");
        assert!(out.contains("  <meta content=\"x\">\n  <link rel=\"y\">"));
    }

    #[test]
    fn absent_values_are_omitted() {
        let mut fm = FrontMatter::new();
        fm.insert("title", "Home");
        fm.insert_opt::<String>("css_href", None);
        fm.insert_non_empty("favicon_href", "");
        let out = fm.render("");
        assert_eq!(out, "---\ntitle: \"Home\"\n---\n\n");
        assert!(!out.contains("css_href"));
    }

    #[test]
    fn empty_string_is_still_rendered_via_insert() {
        let mut fm = FrontMatter::new();
        fm.insert("show_body", "");
        assert_eq!(fm.render(""), "---\nshow_body: \"\"\n---\n\n");
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut fm = FrontMatter::new();
        fm.insert("a", "1");
        fm.insert("b", "2");
        fm.insert("a", "3");
        assert_eq!(fm.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(fm.get_str("a"), Some("3"));
    }

    #[test]
    fn crlf_block_literal_round_trips() {
        let mut fm = FrontMatter::new();
        fm.insert("head_extra", "x\r\ny\r\n");
        assert_eq!(fm.get_str("head_extra"), Some("x\ny\n"));

        let rendered = fm.render("");
        assert!(!rendered.contains('\r'));
        let (parsed, _) = FrontMatter::parse(&rendered).unwrap();
        assert_eq!(parsed, fm);
    }

    #[test]
    fn render_is_deterministic() {
        assert_eq!(sample().render("x"), sample().render("x"));
    }

    #[test]
    fn round_trip_preserves_keys_and_values() {
        let mut fm = sample();
        fm.insert("empty_list", Vec::<String>::new());
        fm.insert("empty", "");
        fm.insert("backslash", r"C:\path\");
        fm.insert("trailing_newline", "line one\n");
        fm.insert("blank_lines", "a\n\nb");

        let rendered = fm.render("<p>Body</p>");
        let (parsed, body) = FrontMatter::parse(&rendered).unwrap();
        assert_eq!(parsed, fm);
        assert_eq!(body, "<p>Body</p>\n");
    }

    #[test]
    fn parse_accepts_plain_and_single_quoted_scalars() {
        let doc = "---\nsection: press\nnote: 'it''s'\n---\nbody";
        let (fm, body) = FrontMatter::parse(doc).unwrap();
        assert_eq!(fm.get_str("section"), Some("press"));
        assert_eq!(fm.get_str("note"), Some("it's"));
        assert_eq!(body, "body");
    }

    #[test]
    fn parse_without_header_is_error() {
        assert_eq!(
            FrontMatter::parse("<html></html>"),
            Err(FrontMatterError::MissingHeader)
        );
    }

    #[test]
    fn parse_unterminated_header_is_error() {
        assert_eq!(
            FrontMatter::parse("---\ntitle: \"x\"\n"),
            Err(FrontMatterError::Unterminated)
        );
    }

    #[test]
    fn parse_rejects_line_without_colon() {
        let err = FrontMatter::parse("---\nnot a pair\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Malformed { line: 1, .. }));
    }

    #[test]
    fn body_may_contain_delimiter_lines() {
        let doc = FrontMatter::new().render("<hr>\n---\n<p>after</p>");
        let (_, body) = FrontMatter::parse(&doc).unwrap();
        assert_eq!(body, "<hr>\n---\n<p>after</p>\n");
    }
}
