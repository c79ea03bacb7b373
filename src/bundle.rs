//! The page bundle: the artifact the page stage hands to the collection stages.
//!
//! The collection extractors read pages the page stage already normalized
//! (front matter + cleaned body). Rather than infer that from directory
//! layout, the page stage records what it wrote in `<state>/pages.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "pages_dir": "src/pages",
//!   "pages": [
//!     { "source": "news/spring-tour.html", "permalink": "news/spring-tour.html",
//!       "section": "press", "nav_current": false, "sha256": "9f2c…" }
//!   ]
//! }
//! ```
//!
//! A collection stage loads the bundle first and fails with a clear error if
//! it is missing, so running `news` before `migrate` is reported as such
//! instead of producing empty side-tables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the bundle within the state directory.
pub const BUNDLE_FILENAME: &str = "pages.json";

/// Bump when the bundle format changes.
const BUNDLE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Page bundle not found at {0}; run `site-migrate migrate` first")]
    Missing(PathBuf),
    #[error("Page bundle version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// One page written by the page stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratedPage {
    /// Path of the exported page, relative to the export root.
    pub source: String,
    /// Relative path of the content file under `pages_dir`; also the URL.
    pub permalink: String,
    pub section: String,
    pub nav_current: bool,
    /// SHA-256 of the content file as written.
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBundle {
    pub version: u32,
    /// Pages directory, relative to the export root.
    pub pages_dir: String,
    pub pages: Vec<MigratedPage>,
}

impl PageBundle {
    pub fn new(pages_dir: &str, pages: Vec<MigratedPage>) -> Self {
        Self {
            version: BUNDLE_VERSION,
            pages_dir: pages_dir.to_string(),
            pages,
        }
    }

    /// Load from the state directory.
    pub fn load(state_dir: &Path) -> Result<Self, BundleError> {
        let path = state_dir.join(BUNDLE_FILENAME);
        if !path.exists() {
            return Err(BundleError::Missing(path));
        }
        let bundle: Self = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        if bundle.version != BUNDLE_VERSION {
            return Err(BundleError::Version {
                found: bundle.version,
                expected: BUNDLE_VERSION,
            });
        }
        Ok(bundle)
    }

    /// Save to the state directory, creating it if needed.
    pub fn save(&self, state_dir: &Path) -> Result<(), BundleError> {
        std::fs::create_dir_all(state_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(state_dir.join(BUNDLE_FILENAME), json)?;
        Ok(())
    }

    pub fn find(&self, permalink: &str) -> Option<&MigratedPage> {
        self.pages.iter().find(|p| p.permalink == permalink)
    }

    /// Pages directly inside `dir`, in bundle order.
    pub fn in_dir<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a MigratedPage> + 'a {
        self.pages.iter().filter(move |p| {
            p.permalink
                .strip_prefix(dir)
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|name| !name.contains('/') && name.ends_with(".html"))
        })
    }

    /// Absolute path of a page's content file.
    pub fn content_path(&self, root: &Path, page: &MigratedPage) -> PathBuf {
        root.join(&self.pages_dir).join(&page.permalink)
    }
}
