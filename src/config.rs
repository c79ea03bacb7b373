//! Migration configuration.
//!
//! Handles loading, validating, and merging `migrate.toml`. Stock defaults
//! describe the builder export this tool was written against; a
//! `migrate.toml` in the export root overrides any subset of them.
//!
//! ## Config File Location
//!
//! ```text
//! export/
//! ├── migrate.toml         # optional, overrides stock defaults
//! ├── index.html
//! ├── press.html
//! ├── news/
//! │   └── spring-tour.html
//! └── live-show/
//!     └── lisbon.html
//! ```
//!
//! ## Sections
//!
//! - `[paths]`: where the normalized tree is written, relative to the root.
//! - `[manifest]`: which root pages and subdirectories are migrated, how they
//!   are classified, and which asset folders and root files are relocated.
//! - `[page]`, `[news]`, `[shows]`: layouts and the
//!   CSS selectors each field is read from. Selectors are validated when the
//!   config loads, so a typo fails fast instead of silently extracting
//!   nothing.
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Keep the export intact and copy assets instead of moving them
//! [manifest]
//! keep_source = true
//! ```
//!
//! Tables merge key by key; arrays replace their default entirely. Unknown
//! keys are rejected to catch typos early.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the export root.
pub const CONFIG_FILENAME: &str = "migrate.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid selector for {field}: {selector:?} ({message})")]
    Selector {
        field: String,
        selector: String,
        message: String,
    },
}

/// Migration configuration loaded from `migrate.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Output locations, relative to the export root.
    pub paths: PathsConfig,
    /// Which files are migrated and how they are classified.
    pub manifest: ManifestConfig,
    /// Extraction schema for single pages.
    pub page: PageConfig,
    /// Extraction schema for the news collection.
    pub news: NewsConfig,
    /// Extraction schema for the live-show collection.
    pub shows: ShowsConfig,
}

impl MigrateConfig {
    /// Validate structural rules and compile every selector.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.manifest;
        if m.root_pages.is_empty() && m.sub_dirs.is_empty() {
            return Err(ConfigError::Validation(
                "manifest must list at least one root page or subdirectory".into(),
            ));
        }
        let mut seen = HashSet::new();
        for page in &m.root_pages {
            if page.file.contains('/') || !page.file.ends_with(".html") {
                return Err(ConfigError::Validation(format!(
                    "manifest.root_pages: {:?} must be a root-level .html file",
                    page.file
                )));
            }
            if !seen.insert(page.file.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "manifest.root_pages: {:?} listed twice",
                    page.file
                )));
            }
        }
        for dir in &m.sub_dirs {
            if dir.dir.is_empty() || dir.dir.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "manifest.sub_dirs: {:?} must be a single directory name",
                    dir.dir
                )));
            }
        }
        let p = &self.paths;
        for (name, value) in [
            ("src", &p.src),
            ("pages", &p.pages),
            ("assets", &p.assets),
            ("content", &p.content),
            ("data", &p.data),
            ("state", &p.state),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "paths.{name} must not be empty"
                )));
            }
        }
        Schema::compile(self)?;
        Ok(())
    }
}

/// Output locations relative to the export root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root of the normalized tree; relocated root files land here.
    pub src: String,
    /// Migrated page content files.
    pub pages: String,
    /// Relocated asset folders.
    pub assets: String,
    /// Collection content files (`<content>/news/`, `<content>/live-show/`).
    pub content: String,
    /// JSON side-tables.
    pub data: String,
    /// Stage artifacts (the page bundle).
    pub state: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: "src".to_string(),
            pages: "src/pages".to_string(),
            assets: "src/assets".to_string(),
            content: "src/content".to_string(),
            data: "src/_data".to_string(),
            state: ".site-migrate".to_string(),
        }
    }
}

/// [`PathsConfig`] joined onto a concrete export root.
#[derive(Debug, Clone)]
pub struct Paths {
    pub src: PathBuf,
    pub pages: PathBuf,
    pub assets: PathBuf,
    pub content: PathBuf,
    pub data: PathBuf,
    pub state: PathBuf,
}

impl PathsConfig {
    pub fn resolve(&self, root: &Path) -> Paths {
        Paths {
            src: root.join(&self.src),
            pages: root.join(&self.pages),
            assets: root.join(&self.assets),
            content: root.join(&self.content),
            data: root.join(&self.data),
            state: root.join(&self.state),
        }
    }
}

/// A root-level page and the nav section it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootPage {
    pub file: String,
    pub section: String,
}

/// A subdirectory whose `.html` files are all migrated under one section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubDir {
    pub dir: String,
    pub section: String,
}

/// The fixed migration manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    pub root_pages: Vec<RootPage>,
    pub sub_dirs: Vec<SubDir>,
    /// Folders moved under `paths.assets`.
    pub asset_folders: Vec<String>,
    /// Root files moved under `paths.src`.
    pub root_files: Vec<String>,
    /// Copy assets instead of moving them and never delete source pages.
    pub keep_source: bool,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        let root = |file: &str, section: &str| RootPage {
            file: file.to_string(),
            section: section.to_string(),
        };
        let sub = |dir: &str, section: &str| SubDir {
            dir: dir.to_string(),
            section: section.to_string(),
        };
        Self {
            root_pages: vec![
                root("index.html", "home"),
                root("about.html", "about"),
                root("music.html", "music"),
                root("music.1.html", "music"),
                root("press.html", "press"),
                root("shows.html", "shows"),
            ],
            sub_dirs: vec![
                sub("music", "music"),
                sub("news", "press"),
                sub("live-show", "shows"),
            ],
            asset_folders: vec![
                "cdn.prod.website-files.com".to_string(),
                "js".to_string(),
                "static".to_string(),
            ],
            root_files: vec!["robots.txt".to_string(), "build.txt".to_string()],
            keep_source: false,
        }
    }
}

/// A head field: front-matter key, selector, and the attribute to read.
/// Without `attr`, the element's trimmed text is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadField {
    pub key: String,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl HeadField {
    fn new(key: &str, selector: &str, attr: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            selector: selector.to_string(),
            attr: attr.map(str::to_string),
        }
    }
}

/// Single-page extraction schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub layout: String,
    /// Whitelisted head fields, in front-matter order.
    pub head_fields: Vec<HeadField>,
    /// Inline style blocks, kept as `head_styles`.
    pub styles: String,
    /// Additional head elements dropped before computing `head_extra`.
    pub head_strip: Vec<String>,
    /// Chrome removed from the body; the first match of each, in order.
    pub chrome: Vec<String>,
    /// Removed from the body wherever they occur.
    pub body_strip: Vec<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        let content = Some("content");
        let href = Some("href");
        Self {
            layout: "layouts/base.njk".to_string(),
            head_fields: vec![
                HeadField::new("title", "title", None),
                HeadField::new("description", r#"meta[name="description"]"#, content),
                HeadField::new("og_title", r#"meta[property="og:title"]"#, content),
                HeadField::new("og_description", r#"meta[property="og:description"]"#, content),
                HeadField::new("og_image", r#"meta[property="og:image"]"#, content),
                HeadField::new("og_type", r#"meta[property="og:type"]"#, content),
                HeadField::new("twitter_title", r#"meta[property="twitter:title"]"#, content),
                HeadField::new(
                    "twitter_description",
                    r#"meta[property="twitter:description"]"#,
                    content,
                ),
                HeadField::new("twitter_image", r#"meta[property="twitter:image"]"#, content),
                HeadField::new("twitter_card", r#"meta[name="twitter:card"]"#, content),
                HeadField::new("css_href", r#"link[rel="stylesheet"]"#, href),
                HeadField::new("favicon_href", r#"link[rel="shortcut icon"]"#, href),
                HeadField::new("webclip_href", r#"link[rel="apple-touch-icon"]"#, href),
            ],
            styles: "style".to_string(),
            head_strip: vec![
                "meta[charset]".to_string(),
                r#"meta[name="viewport"]"#.to_string(),
                "script".to_string(),
            ],
            chrome: vec![
                "div.page-load".to_string(),
                "div.navbar.w-nav".to_string(),
                "footer.footer".to_string(),
            ],
            body_strip: vec!["script".to_string()],
        }
    }
}

/// News collection schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewsConfig {
    pub layout: String,
    /// Value of the `tags` header key.
    pub tag: String,
    /// Index page, relative to `paths.pages`.
    pub index_page: String,
    /// Collection directory under `paths.pages` and `paths.content`; also
    /// the marker segment an index link must contain.
    pub dir: String,
    pub side_table: String,
    pub item_link: String,
    pub item_title: String,
    pub item_tag: String,
    pub item_short_desc: String,
    pub item_image: String,
    /// Class on the item link that marks a featured entry.
    pub feature_class: String,
    pub article_title: String,
    pub article_tag: String,
    pub article_image: String,
    pub related_link: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            layout: "layouts/news-item.njk".to_string(),
            tag: "news".to_string(),
            index_page: "press.html".to_string(),
            dir: "news".to_string(),
            side_table: "news.json".to_string(),
            item_link: ".collection-link".to_string(),
            item_title: "h2, h3".to_string(),
            item_tag: ".news-tag".to_string(),
            item_short_desc: ".short-desc".to_string(),
            item_image: "img".to_string(),
            feature_class: "feature".to_string(),
            article_title: "h1".to_string(),
            article_tag: ".news-tag".to_string(),
            article_image: ".article-feature-img".to_string(),
            related_link: ".cross-collection .collection-link".to_string(),
        }
    }
}

/// Live-show collection schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShowsConfig {
    pub layout: String,
    pub tag: String,
    /// Collection directory under `paths.pages` and `paths.content`.
    pub dir: String,
    pub side_table: String,
    pub title: String,
    /// Date fragment elements; the first two matches are kept.
    pub date: String,
    /// Location selectors, tried in order.
    pub location: Vec<String>,
    pub time: String,
    pub body: String,
    pub related_link: String,
}

impl Default for ShowsConfig {
    fn default() -> Self {
        Self {
            layout: "layouts/live-item.njk".to_string(),
            tag: "shows".to_string(),
            dir: "live-show".to_string(),
            side_table: "shows.json".to_string(),
            title: ".live-item-title".to_string(),
            date: ".live-date .date".to_string(),
            location: vec![
                ".live-details .localization".to_string(),
                ".live-details .localization-link".to_string(),
            ],
            time: ".live-details .time".to_string(),
            body: ".rich-text.live-shows".to_string(),
            related_link: ".cross-collection .live-link-page".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MigrateConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `migrate.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MigrateConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MigrateConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for an export root: stock defaults plus `migrate.toml`.
pub fn load_config(root: &Path) -> Result<MigrateConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `migrate.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# site-migrate configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Tables merge key by key; arrays replace the default entirely.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Output locations, relative to the export root
# ---------------------------------------------------------------------------
[paths]
src = "src"
pages = "src/pages"
assets = "src/assets"
content = "src/content"
data = "src/_data"
# Stage artifacts handed from `migrate` to `news` / `shows`.
state = ".site-migrate"

# ---------------------------------------------------------------------------
# Migration manifest
# ---------------------------------------------------------------------------
[manifest]
asset_folders = ["cdn.prod.website-files.com", "js", "static"]
root_files = ["robots.txt", "build.txt"]
# Copy assets instead of moving them, and keep the exported pages.
keep_source = false

# Root pages are classified as current in the nav (nav_prefix = "").
[[manifest.root_pages]]
file = "index.html"
section = "home"

[[manifest.root_pages]]
file = "about.html"
section = "about"

[[manifest.root_pages]]
file = "music.html"
section = "music"

[[manifest.root_pages]]
file = "music.1.html"
section = "music"

[[manifest.root_pages]]
file = "press.html"
section = "press"

[[manifest.root_pages]]
file = "shows.html"
section = "shows"

# Every .html file in these directories is migrated (nav_prefix = "..").
[[manifest.sub_dirs]]
dir = "music"
section = "music"

[[manifest.sub_dirs]]
dir = "news"
section = "press"

[[manifest.sub_dirs]]
dir = "live-show"
section = "shows"

# ---------------------------------------------------------------------------
# Single pages
# ---------------------------------------------------------------------------
[page]
layout = "layouts/base.njk"
styles = "style"
head_strip = ["meta[charset]", 'meta[name="viewport"]', "script"]
# The first match of each is removed from the body, in order.
chrome = ["div.page-load", "div.navbar.w-nav", "footer.footer"]
body_strip = ["script"]

# Head fields in front-matter order. Without `attr` the text is read.
[[page.head_fields]]
key = "title"
selector = "title"

[[page.head_fields]]
key = "description"
selector = 'meta[name="description"]'
attr = "content"

[[page.head_fields]]
key = "og_title"
selector = 'meta[property="og:title"]'
attr = "content"

[[page.head_fields]]
key = "og_description"
selector = 'meta[property="og:description"]'
attr = "content"

[[page.head_fields]]
key = "og_image"
selector = 'meta[property="og:image"]'
attr = "content"

[[page.head_fields]]
key = "og_type"
selector = 'meta[property="og:type"]'
attr = "content"

[[page.head_fields]]
key = "twitter_title"
selector = 'meta[property="twitter:title"]'
attr = "content"

[[page.head_fields]]
key = "twitter_description"
selector = 'meta[property="twitter:description"]'
attr = "content"

[[page.head_fields]]
key = "twitter_image"
selector = 'meta[property="twitter:image"]'
attr = "content"

[[page.head_fields]]
key = "twitter_card"
selector = 'meta[name="twitter:card"]'
attr = "content"

[[page.head_fields]]
key = "css_href"
selector = 'link[rel="stylesheet"]'
attr = "href"

[[page.head_fields]]
key = "favicon_href"
selector = 'link[rel="shortcut icon"]'
attr = "href"

[[page.head_fields]]
key = "webclip_href"
selector = 'link[rel="apple-touch-icon"]'
attr = "href"

# ---------------------------------------------------------------------------
# News collection
# ---------------------------------------------------------------------------
[news]
layout = "layouts/news-item.njk"
tag = "news"
index_page = "press.html"
dir = "news"
side_table = "news.json"
item_link = ".collection-link"
item_title = "h2, h3"
item_tag = ".news-tag"
item_short_desc = ".short-desc"
item_image = "img"
feature_class = "feature"
article_title = "h1"
article_tag = ".news-tag"
article_image = ".article-feature-img"
related_link = ".cross-collection .collection-link"

# ---------------------------------------------------------------------------
# Live-show collection
# ---------------------------------------------------------------------------
[shows]
layout = "layouts/live-item.njk"
tag = "shows"
dir = "live-show"
side_table = "shows.json"
title = ".live-item-title"
date = ".live-date .date"
location = [".live-details .localization", ".live-details .localization-link"]
time = ".live-details .time"
body = ".rich-text.live-shows"
related_link = ".cross-collection .live-link-page"
"##
}
