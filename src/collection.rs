//! Plumbing shared by the news and show extractors.
//!
//! Both collection stages read pages the page stage already migrated, derive
//! a slug from each page's filename, carry a subset of the page header over
//! into the item header, and write one JSON side-table. The differences
//! (which fields, which selectors, which defaults) live in [`crate::news`]
//! and [`crate::shows`].
//!
//! ## Slugs
//!
//! A slug is the last path component of an href with any query or fragment
//! and the `.html` extension removed:
//!
//! ```text
//! ./news/spring-tour.html       → spring-tour
//! ../news/spring-tour.html?x=1  → spring-tour
//! spring-tour.html#top          → spring-tour
//! ```
//!
//! ## Inheritance
//!
//! An item header inherits named keys from the migrated page's header. A key
//! that is missing or empty in the page header takes the stage's default.

use crate::bundle::{BundleError, PageBundle};
use crate::front_matter::FrontMatter;
use crate::html::{self, Document};
use scraper::Selector;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),
    #[error("Page {0} is listed in the bundle but missing from the pages directory")]
    MissingPage(String),
}

/// Derive a slug from a link href.
pub fn slug_from_href(href: &str) -> String {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();
    name.strip_suffix(".html").unwrap_or(name).to_string()
}

/// Slugs of every related-item link in a document, in document order.
/// Links without an href or with an empty slug are skipped.
pub fn related_slugs(doc: &Document, selector: &Selector) -> Vec<String> {
    doc.all(selector)
        .into_iter()
        .filter_map(|el| html::attr(el, "href"))
        .map(slug_from_href)
        .filter(|slug| !slug.is_empty())
        .collect()
}

/// A migrated collection page, read back from the pages directory.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub slug: String,
    pub permalink: String,
    pub header: FrontMatter,
    pub body: String,
}

impl SourcePage {
    /// The body parsed as HTML.
    pub fn document(&self) -> Document {
        Document::parse(&self.body)
    }
}

/// Read every page the bundle lists directly under `dir`, in bundle order.
///
/// A page without a readable header is kept with an empty header and its
/// whole contents as the body; its item header then falls back to the stage
/// defaults.
pub fn read_collection_pages(
    root: &Path,
    bundle: &PageBundle,
    dir: &str,
) -> Result<Vec<SourcePage>, CollectionError> {
    let mut pages = Vec::new();
    for page in bundle.in_dir(dir) {
        let path = bundle.content_path(root, page);
        if !path.is_file() {
            return Err(CollectionError::MissingPage(page.permalink.clone()));
        }
        let contents = fs::read_to_string(&path)?;
        let parsed = FrontMatter::parse(&contents).map(|(header, body)| (header, body.to_string()));
        let (header, body) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(page = %page.permalink, error = %e, "page has no usable header");
                (FrontMatter::new(), contents)
            }
        };
        pages.push(SourcePage {
            slug: slug_from_href(&page.permalink),
            permalink: page.permalink.clone(),
            header,
            body,
        });
    }
    Ok(pages)
}

/// Copy `fields` from a page header into `fm`, substituting each field's
/// default when the page value is missing or empty.
pub fn inherit(fm: &mut FrontMatter, header: &FrontMatter, fields: &[(&str, &str)]) {
    for &(key, default) in fields {
        let value = header
            .get_str(key)
            .filter(|v| !v.is_empty())
            .unwrap_or(default);
        fm.insert(key, value);
    }
}

/// First non-empty value in priority order.
///
/// ```text
/// page_title: resolve(&[body_h1, index_title])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| opt.map(str::trim).filter(|s| !s.is_empty()).map(String::from))
        .next()
}

/// Write a side-table as pretty-printed JSON, replacing any previous one.
pub fn write_side_table<T: Serialize + ?Sized>(
    path: &Path,
    rows: &T,
) -> Result<(), CollectionError> {
    let json = serde_json::to_string_pretty(rows)?;
    crate::files::write_file(path, &json)?;
    Ok(())
}

/// A related-item link pointing at a slug the collection does not contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingLink {
    pub from: String,
    pub slug: String,
}

/// Report related slugs that resolve to no known item.
pub fn dangling_links<'a>(
    items: impl IntoIterator<Item = (&'a str, &'a [String])>,
    known: &HashSet<&str>,
) -> Vec<DanglingLink> {
    let mut dangling = Vec::new();
    for (from, related) in items {
        for slug in related {
            if !known.contains(slug.as_str()) {
                warn!(from, slug = %slug, "related link points at unknown item");
                dangling.push(DanglingLink {
                    from: from.to_string(),
                    slug: slug.clone(),
                });
            }
        }
    }
    dangling
}
