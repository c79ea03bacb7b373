//! HTML extraction helpers over `scraper`.
//!
//! Every lookup is optional: a selector that matches nothing yields `None` or
//! an empty string, never an error. Callers substitute empty strings or a
//! named fallback, so a page missing an optional field (no social-card image,
//! no rich-text block) never stops a run.
//!
//! Markup is not passed through byte for byte. html5ever decodes character
//! references while parsing, and [`inner_html`] / [`outer_html`] serialize
//! the parsed tree: text escapes only `&`, `<`, `>` and U+00A0 (as `&nbsp;`),
//! so `&eacute;` comes back as `é` and `&#8217;` as `’`. [`attr_string`]
//! follows the same rules for attribute values, escaping `&`, `"` and
//! U+00A0, so rendered attributes stay valid when re-embedded in a tag.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document that supports subtree removal.
#[derive(Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full document. Fragments are accepted too; html5ever wraps
    /// them in `html`/`body` elements.
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    /// The `<html>` root element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// First match in document order.
    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// All matches in document order.
    pub fn all(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.html.select(selector).collect()
    }

    /// Trimmed text of the first match, or `""`.
    pub fn first_text(&self, selector: &Selector) -> String {
        self.first(selector).map(text).unwrap_or_default()
    }

    /// Attribute of the first match, or `None`.
    pub fn first_attr(&self, selector: &Selector, name: &str) -> Option<String> {
        self.first(selector)
            .and_then(|el| attr(el, name))
            .map(str::to_string)
    }

    /// Detach the first match of `target` found inside the first `scope`
    /// element. Returns whether anything was removed.
    pub fn remove_first(&mut self, scope: &Selector, target: &Selector) -> bool {
        self.remove_matching(scope, target, Some(1)) > 0
    }

    /// Detach every match of `target` inside the first `scope` element.
    /// Returns the number of subtrees removed.
    pub fn remove_all(&mut self, scope: &Selector, target: &Selector) -> usize {
        self.remove_matching(scope, target, None)
    }

    fn remove_matching(
        &mut self,
        scope: &Selector,
        target: &Selector,
        limit: Option<usize>,
    ) -> usize {
        let Some(scope_el) = self.html.select(scope).next() else {
            return 0;
        };
        let ids: Vec<_> = scope_el
            .select(target)
            .take(limit.unwrap_or(usize::MAX))
            .map(|el| el.id())
            .collect();

        let mut removed = 0;
        for id in ids {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
        removed
    }
}

/// Concatenated descendant text, trimmed.
pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Attribute value, or `None` when the attribute is absent.
pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Attribute value, or `""`.
pub fn attr_or_empty(el: ElementRef<'_>, name: &str) -> String {
    attr(el, name).unwrap_or_default().to_string()
}

pub fn inner_html(el: ElementRef<'_>) -> String {
    el.inner_html()
}

pub fn outer_html(el: ElementRef<'_>) -> String {
    el.html()
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Render an element's attributes as `name="value"` pairs joined by spaces.
///
/// ```text
/// <html data-wf-page="65a1" lang="en">  →  data-wf-page="65a1" lang="en"
/// <body data-x="a &quot;b&quot;">       →  data-x="a &quot;b&quot;"
/// ```
pub fn attr_string(el: ElementRef<'_>) -> String {
    el.value()
        .attrs()
        .map(|(name, value)| format!("{name}=\"{}\"", escape_attr(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

/// Trimmed text of the first match inside `scope`, or `""`.
pub fn scoped_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope.select(selector).next().map(text).unwrap_or_default()
}

/// First match inside `scope`.
pub fn scoped_first<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}
