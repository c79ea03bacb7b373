//! # site-migrate
//!
//! Migrates a flat HTML export from a visual site builder into a
//! content + template tree a static-site generator can consume. Every page is
//! split into chrome (left to the templates) and content (kept), its metadata
//! is lifted into a front-matter header, and the repeating news and live-show
//! items are pulled out into per-item content files plus JSON side-tables.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Pages   export/*.html       →  src/pages/ + .site-migrate/pages.json
//! 2. News    pages.json          →  src/content/news/ + src/_data/news.json
//! 3. Shows   pages.json          →  src/content/live-show/ + src/_data/shows.json
//! ```
//!
//! The page stage is the only one that touches the export. It stages every
//! page, verifies the staged files, and only then commits them, relocates the
//! shared assets, and deletes the sources. What it wrote is recorded in a
//! [`bundle::PageBundle`], and the collection stages read that rather than
//! rediscovering the tree, so running them before the page stage is an error
//! rather than an empty result.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pages`] | Stage 1: extract, classify, stage, verify, and commit every page |
//! | [`news`] | Stage 2: press index cards merged with article pages |
//! | [`shows`] | Stage 3: one item per live-show page |
//! | [`collection`] | Slugs, header inheritance, and side-table writing shared by stages 2 and 3 |
//! | [`bundle`] | The page stage's output record, consumed by stages 2 and 3 |
//! | [`front_matter`] | Ordered header record: rendering and parsing |
//! | [`html`] | Selector queries and subtree removal over `scraper` |
//! | [`schema`] | Configured selectors, compiled once |
//! | [`config`] | `migrate.toml` loading, merging, and validation |
//! | [`files`] | Write, move, copy, and hash helpers |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Selectors Are Configuration
//!
//! The class names that identify chrome, news cards, and show details belong
//! to one particular export. They live in `migrate.toml` with stock defaults
//! rather than in the extraction code, and are compiled by
//! [`schema::Schema::compile`] when the config loads.
//!
//! ## Missing Markup Is Not An Error
//!
//! A selector that matches nothing yields an empty string. Only missing
//! inputs, unwritable outputs, invalid config, and failed staging stop a run.
//!
//! ## Keep-Source Mode
//!
//! With `keep_source = true` (or `--keep-source`) assets are copied rather
//! than moved and the exported pages are left in place, so a run can be
//! repeated against the same export.

pub mod bundle;
pub mod collection;
pub mod config;
pub mod files;
pub mod front_matter;
pub mod html;
pub mod news;
pub mod output;
pub mod pages;
pub mod schema;
pub mod shows;

#[cfg(test)]
pub(crate) mod test_helpers;
