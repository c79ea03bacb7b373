//! Page extraction, classification, and migration.
//!
//! Stage 1 of the pipeline. Reads every page in the manifest from the
//! builder export, separates chrome from content, and writes one content file
//! per page under `src/pages/` with the page's metadata as front matter.
//!
//! ## Procedure
//!
//! ```text
//! 1. Manifest   root pages + every .html file in each known subdirectory
//! 2. Stage      extract, classify, render → <src>/.staging-XXXX/<path>
//! 3. Verify     every staged file present, digest matches, permalinks unique
//! 4. Commit     staged files → <pages>/<path>
//! 5. Relocate   asset folders → <assets>/, root files → <src>/
//! 6. Clean up   delete source pages, remove empty source subdirectories
//! 7. Bundle     record what was written in <state>/pages.json
//! ```
//!
//! Steps 5 and 6 are irreversible, so nothing past step 3 runs unless every
//! page staged and verified. A failure while staging drops the staging
//! directory and leaves the export untouched.
//!
//! With `manifest.keep_source`, step 5 copies instead of moving and step 6 is
//! skipped, so the export stays intact and re-runs see the same input.
//!
//! ## Classification
//!
//! Classification is by exact path membership in the manifest, not by
//! sniffing content: a root page listed in `manifest.root_pages` is current in
//! the nav; a page inside a listed subdirectory is not and links back up one
//! level. Anything else gets an empty classification.

use crate::bundle::{BundleError, MigratedPage, PageBundle};
use crate::config::{ManifestConfig, MigrateConfig};
use crate::files;
use crate::front_matter::FrontMatter;
use crate::html::{self, Document};
use crate::schema::{PageSchema, Schema};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),
    #[error("Manifested page does not exist: {0}")]
    MissingSource(PathBuf),
    #[error("Permalink {0} would be written twice")]
    DuplicatePermalink(String),
    #[error("Staged file {path} failed verification: {reason}")]
    Staging { path: PathBuf, reason: String },
}

/// Everything extracted from one exported page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageData {
    /// `<html>` attributes as `name="value"` pairs.
    pub html_attrs: String,
    /// `<body>` attributes as `name="value"` pairs.
    pub body_attrs: String,
    /// Head field values keyed by front-matter key, in schema order. Missing
    /// matches are empty strings.
    pub head_fields: Vec<(String, String)>,
    /// Outer markup of every inline `<style>`, newline-joined.
    pub head_styles: String,
    /// Head markup not captured by any other field.
    pub head_extra: String,
    /// Body inner markup with chrome and scripts removed.
    pub body: String,
}

impl PageData {
    /// Value of a head field, or `""`.
    pub fn field(&self, key: &str) -> &str {
        self.head_fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }
}

/// Where a page sits in the site navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub section: String,
    pub nav_current: bool,
    pub nav_prefix: String,
}

/// Summary of one migrated page, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub path: String,
    pub title: String,
    pub section: String,
    pub nav_current: bool,
}

/// An asset folder or root file relocated into the normalized tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub name: String,
    pub dest: PathBuf,
    pub copied: bool,
}

#[derive(Debug)]
pub struct MigrationReport {
    pub pages: Vec<PageSummary>,
    pub relocated: Vec<Relocation>,
    pub sources_removed: usize,
    pub bundle: PageBundle,
}

/// Extract metadata and cleaned body markup from one exported page.
pub fn extract_page_data(raw: &str, schema: &PageSchema) -> PageData {
    let doc = Document::parse(raw);
    let head = doc.first(&schema.head);

    let head_fields = schema
        .head_fields
        .iter()
        .map(|field| {
            let value = head
                .and_then(|h| html::scoped_first(h, &field.selector))
                .map(|el| match &field.attr {
                    Some(name) => html::attr_or_empty(el, name),
                    None => html::text(el),
                })
                .unwrap_or_default();
            (field.key.clone(), value)
        })
        .collect();

    let head_styles = head
        .map(|h| {
            h.select(&schema.styles)
                .map(html::outer_html)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
        .trim()
        .to_string();

    let html_attrs = html::attr_string(doc.root());
    let body_attrs = doc
        .first(&schema.body)
        .map(html::attr_string)
        .unwrap_or_default();

    let mut cleaned = doc.clone();
    for field in &schema.head_fields {
        cleaned.remove_all(&schema.head, &field.selector);
    }
    cleaned.remove_all(&schema.head, &schema.styles);
    for selector in &schema.head_strip {
        cleaned.remove_all(&schema.head, selector);
    }
    let head_extra = cleaned
        .first(&schema.head)
        .map(html::inner_html)
        .unwrap_or_default()
        .trim()
        .to_string();

    for selector in &schema.chrome {
        cleaned.remove_first(&schema.body, selector);
    }
    for selector in &schema.body_strip {
        cleaned.remove_all(&schema.body, selector);
    }
    let body = cleaned
        .first(&schema.body)
        .map(html::inner_html)
        .unwrap_or_default();

    PageData {
        html_attrs,
        body_attrs,
        head_fields,
        head_styles,
        head_extra,
        body,
    }
}

/// Classify a page by its path relative to the export root.
pub fn classify_page(path: &str, manifest: &ManifestConfig) -> Classification {
    let normalized = path.replace('\\', "/");
    if let Some(page) = manifest.root_pages.iter().find(|p| p.file == normalized) {
        return Classification {
            section: page.section.clone(),
            nav_current: true,
            nav_prefix: String::new(),
        };
    }
    let in_sub_dir = manifest.sub_dirs.iter().find(|d| {
        normalized
            .strip_prefix(d.dir.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    });
    match in_sub_dir {
        Some(dir) => Classification {
            section: dir.section.clone(),
            nav_current: false,
            nav_prefix: "..".to_string(),
        },
        None => Classification::default(),
    }
}

/// Relative path from an emitted page back to the shared assets.
///
/// Root pages are emitted one level below the site root (`pages/`), nested
/// pages two levels.
pub fn asset_prefix_for(path: &str) -> &'static str {
    if path.contains(['/', '\\']) {
        "../.."
    } else {
        ".."
    }
}

/// Build the header record for a migrated page. Empty values are omitted.
pub fn page_front_matter(
    path: &str,
    data: &PageData,
    class: &Classification,
    layout: &str,
) -> FrontMatter {
    let mut fm = FrontMatter::new();
    fm.insert("layout", layout);
    fm.insert("permalink", path);
    for (key, value) in &data.head_fields {
        fm.insert_non_empty(key, value);
    }
    fm.insert_non_empty("head_styles", &data.head_styles);
    fm.insert_non_empty("head_extra", &data.head_extra);
    fm.insert_non_empty("html_attrs", &data.html_attrs);
    fm.insert_non_empty("body_attrs", &data.body_attrs);
    fm.insert_non_empty("section", &class.section);
    fm.insert("nav_current", if class.nav_current { "true" } else { "false" });
    fm.insert_non_empty("nav_prefix", &class.nav_prefix);
    fm.insert("asset_prefix", asset_prefix_for(path));
    fm
}

/// List every page to migrate, relative to `root`.
///
/// Root pages must exist. Subdirectories are optional; their `.html` files
/// are listed in filename order.
pub fn build_manifest(root: &Path, manifest: &ManifestConfig) -> Result<Vec<String>, MigrateError> {
    let mut pages = Vec::new();
    for page in &manifest.root_pages {
        let path = root.join(&page.file);
        if !path.is_file() {
            return Err(MigrateError::MissingSource(path));
        }
        pages.push(page.file.clone());
    }

    for sub in &manifest.sub_dirs {
        let dir = root.join(&sub.dir);
        if !dir.is_dir() {
            continue;
        }
        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".html"))
            .collect();
        names.sort();
        pages.extend(names.into_iter().map(|name| format!("{}/{}", sub.dir, name)));
    }
    Ok(pages)
}

/// A page rendered in memory but not yet written.
struct RenderedPage {
    path: String,
    class: Classification,
    title: String,
    document: String,
}

fn render_page(
    root: &Path,
    path: &str,
    config: &MigrateConfig,
    schema: &PageSchema,
) -> Result<RenderedPage, MigrateError> {
    let raw = fs::read_to_string(root.join(path))?;
    let data = extract_page_data(&raw, schema);
    let class = classify_page(path, &config.manifest);
    let document = page_front_matter(path, &data, &class, &schema.layout).render(&data.body);
    debug!(page = %path, section = %class.section, "extracted page");
    Ok(RenderedPage {
        path: path.to_string(),
        title: data.field("title").to_string(),
        class,
        document,
    })
}

/// Extract and classify every manifested page without writing anything.
pub fn check(
    root: &Path,
    config: &MigrateConfig,
    schema: &Schema,
) -> Result<Vec<PageSummary>, MigrateError> {
    build_manifest(root, &config.manifest)?
        .iter()
        .map(|path| render_page(root, path, config, &schema.page).map(|r| summary(&r)))
        .collect()
}

fn summary(page: &RenderedPage) -> PageSummary {
    PageSummary {
        path: page.path.clone(),
        title: page.title.clone(),
        section: page.class.section.clone(),
        nav_current: page.class.nav_current,
    }
}

/// Run the page stage against an export root.
pub fn migrate(
    root: &Path,
    config: &MigrateConfig,
    schema: &Schema,
) -> Result<MigrationReport, MigrateError> {
    let paths = config.paths.resolve(root);
    let manifest = build_manifest(root, &config.manifest)?;
    info!(pages = manifest.len(), root = %root.display(), "migrating pages");

    fs::create_dir_all(&paths.src)?;
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(&paths.src)?;

    let mut migrated = Vec::new();
    let mut summaries = Vec::new();
    for path in &manifest {
        let page = render_page(root, path, config, &schema.page)?;
        files::write_file(&staging.path().join(&page.path), &page.document)?;
        summaries.push(summary(&page));
        migrated.push(MigratedPage {
            source: page.path.clone(),
            permalink: page.path.clone(),
            section: page.class.section.clone(),
            nav_current: page.class.nav_current,
            sha256: files::hash_bytes(page.document.as_bytes()),
        });
    }

    verify_staged(staging.path(), &migrated)?;

    for page in &migrated {
        files::move_path(
            &staging.path().join(&page.permalink),
            &paths.pages.join(&page.permalink),
        )?;
    }
    drop(staging);

    let keep_source = config.manifest.keep_source;
    let mut relocated = Vec::new();
    let targets = config
        .manifest
        .asset_folders
        .iter()
        .map(|name| (name, paths.assets.join(name)))
        .chain(
            config
                .manifest
                .root_files
                .iter()
                .map(|name| (name, paths.src.join(name))),
        );
    for (name, dest) in targets {
        let src = root.join(name);
        if !src.exists() {
            continue;
        }
        if keep_source {
            files::copy_path(&src, &dest)?;
        } else {
            files::move_path(&src, &dest)?;
        }
        relocated.push(Relocation {
            name: name.clone(),
            dest,
            copied: keep_source,
        });
    }

    let mut sources_removed = 0;
    if !keep_source {
        for path in &manifest {
            let src = root.join(path);
            if src.exists() {
                fs::remove_file(&src)?;
                sources_removed += 1;
            }
        }
        for sub in &config.manifest.sub_dirs {
            files::remove_if_empty(&root.join(&sub.dir))?;
        }
    }

    let bundle = PageBundle::new(&config.paths.pages, migrated);
    bundle.save(&paths.state)?;
    info!(
        pages = bundle.pages.len(),
        relocated = relocated.len(),
        sources_removed,
        "page stage complete"
    );

    Ok(MigrationReport {
        pages: summaries,
        relocated,
        sources_removed,
        bundle,
    })
}

/// Every staged file must exist with the digest it was rendered with, and no
/// two pages may share a permalink.
fn verify_staged(staging: &Path, pages: &[MigratedPage]) -> Result<(), MigrateError> {
    let mut seen = HashSet::new();
    for page in pages {
        if !seen.insert(page.permalink.as_str()) {
            return Err(MigrateError::DuplicatePermalink(page.permalink.clone()));
        }
        let path = staging.join(&page.permalink);
        let digest = files::hash_file(&path).map_err(|e| MigrateError::Staging {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if digest != page.sha256 {
            return Err(MigrateError::Staging {
                path,
                reason: "content changed after rendering".to_string(),
            });
        }
    }
    Ok(())
}
