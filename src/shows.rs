//! Live-show collection extractor.
//!
//! Stage 3 of the pipeline. Unlike news, shows have no index to merge with:
//! every show is one page under `live-show/`, and the side-table is built from
//! those pages alone, in the order the page stage migrated them (sorted by
//! filename).
//!
//! The two date fragments are kept exactly as the builder rendered them
//! (typically day and month); nothing here parses or sorts by date.

use crate::bundle::PageBundle;
use crate::collection::{self, CollectionError, DanglingLink, SourcePage};
use crate::config::MigrateConfig;
use crate::front_matter::FrontMatter;
use crate::html::{self, Document};
use crate::schema::{Schema, ShowSchema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INHERITED: &[(&str, &str)] = &[
    ("title", ""),
    ("description", ""),
    ("og_title", ""),
    ("twitter_title", ""),
    ("css_href", ""),
    ("favicon_href", ""),
    ("webclip_href", ""),
    ("html_attrs", ""),
    ("section", "shows"),
    ("nav_current", "false"),
    ("nav_prefix", ".."),
    ("asset_prefix", "../.."),
];

/// One row of `shows.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSummary {
    pub slug: String,
    pub permalink: String,
    pub show_title: String,
    pub date_part_one: String,
    pub date_part_two: String,
    pub location: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Show {
    pub summary: ShowSummary,
    /// Inner markup of the rich-text block, trimmed; `""` when absent.
    pub show_body: String,
    pub other_slugs: Vec<String>,
}

#[derive(Debug)]
pub struct ShowsReport {
    pub shows: Vec<ShowSummary>,
    pub dangling: Vec<DanglingLink>,
    pub side_table: PathBuf,
}

/// Extract one show from its migrated page body.
pub fn extract_show(slug: &str, permalink: &str, doc: &Document, schema: &ShowSchema) -> Show {
    let dates: Vec<String> = doc.all(&schema.date).into_iter().take(2).map(html::text).collect();
    let date = |i: usize| dates.get(i).cloned().unwrap_or_default();

    let location = schema
        .location
        .iter()
        .map(|selector| doc.first_text(selector))
        .find(|text| !text.is_empty())
        .unwrap_or_default();

    Show {
        summary: ShowSummary {
            slug: slug.to_string(),
            permalink: permalink.to_string(),
            show_title: doc.first_text(&schema.title),
            date_part_one: date(0),
            date_part_two: date(1),
            location,
            time: doc.first_text(&schema.time),
        },
        show_body: doc
            .first(&schema.body)
            .map(|el| html::inner_html(el).trim().to_string())
            .unwrap_or_default(),
        other_slugs: collection::related_slugs(doc, &schema.related_link),
    }
}

/// Build the header for one show content file.
pub fn show_front_matter(page: &SourcePage, show: &Show, config: &MigrateConfig) -> FrontMatter {
    let summary = &show.summary;
    let mut fm = FrontMatter::new();
    fm.insert("layout", config.shows.layout.as_str());
    fm.insert("tags", config.shows.tag.as_str());
    fm.insert("permalink", summary.permalink.as_str());
    collection::inherit(&mut fm, &page.header, INHERITED);
    fm.insert("show_title", summary.show_title.as_str());
    fm.insert("date_part_one", summary.date_part_one.as_str());
    fm.insert("date_part_two", summary.date_part_two.as_str());
    fm.insert("location", summary.location.as_str());
    fm.insert("time", summary.time.as_str());
    fm.insert("show_body", show.show_body.as_str());
    fm.insert("other_slugs", show.other_slugs.clone());
    fm
}

/// Run the shows stage against the migrated tree.
pub fn extract_shows(
    root: &Path,
    config: &MigrateConfig,
    schema: &Schema,
    bundle: &PageBundle,
) -> Result<ShowsReport, CollectionError> {
    let paths = config.paths.resolve(root);
    let out_dir = paths.content.join(&config.shows.dir);
    std::fs::create_dir_all(&out_dir)?;

    let mut shows = Vec::new();
    for page in collection::read_collection_pages(root, bundle, &config.shows.dir)? {
        let permalink = format!("{}/{}.html", config.shows.dir, page.slug);
        let show = extract_show(&page.slug, &permalink, &page.document(), &schema.shows);
        let fm = show_front_matter(&page, &show, config);
        crate::files::write_file(&out_dir.join(format!("{}.md", page.slug)), &fm.render(""))?;
        debug!(slug = %page.slug, "wrote show");
        shows.push(show);
    }

    let known: HashSet<&str> = shows.iter().map(|s| s.summary.slug.as_str()).collect();
    let dangling = collection::dangling_links(
        shows
            .iter()
            .map(|s| (s.summary.slug.as_str(), s.other_slugs.as_slice())),
        &known,
    );

    let summaries: Vec<ShowSummary> = shows.into_iter().map(|s| s.summary).collect();
    let side_table = paths.data.join(&config.shows.side_table);
    collection::write_side_table(&side_table, &summaries)?;
    info!(shows = summaries.len(), path = %side_table.display(), "shows stage complete");

    Ok(ShowsReport {
        shows: summaries,
        dangling,
        side_table,
    })
}
