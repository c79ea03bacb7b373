//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output leads with what was migrated (a page's title, a news item's display
//! title, a show's name) and keeps filesystem paths as indented context
//! lines. A page without a title falls back to its path in parentheses, so
//! every line still identifies something.
//!
//! # Output Format
//!
//! ## Migrate
//!
//! ```text
//! Pages
//! 001 Home | Northern Lights (home, current)
//!     Source: index.html
//! 002 Spring tour | Northern Lights (press)
//!     Source: news/spring-tour.html
//!
//! Assets
//!     static → src/assets/static (moved)
//!
//! Migrated 2 pages, relocated 1 item, removed 2 sources
//! ```
//!
//! ## News
//!
//! ```text
//! News
//! 001 Spring tour announced
//!     Source: news/spring-tour.html
//! 004 Festival lineup (index only)
//!     Source: news/festival.html
//!
//! Unindexed
//!     archive-note
//!
//! Dangling links
//!     spring-tour → ghost-story
//!
//! Wrote 3 entries, 2 articles → src/_data/news.json
//! ```
//!
//! ## Shows
//!
//! ```text
//! Shows
//! 001 Lisbon, Coliseu
//!     Date: 14 MAR
//!     Location: Lisbon, PT
//!
//! Wrote 1 show → src/_data/shows.json
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::collection::DanglingLink;
use crate::news::{NewsEntry, NewsReport};
use crate::pages::{MigrationReport, PageSummary};
use crate::shows::ShowsReport;
use std::collections::HashSet;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Titled entities show the title, untitled ones their path in parens.
///
/// ```text
/// 001 About | Northern Lights
/// 002 (contact.html)
/// ```
fn entity_line(index: usize, title: &str, fallback: &str) -> String {
    if title.is_empty() {
        format!("{} ({})", format_index(index), fallback)
    } else {
        format!("{} {}", format_index(index), title)
    }
}

/// `n` followed by the singular or plural noun.
fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Path relative to the export root, for display.
fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn page_lines(pages: &[PageSummary]) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in pages.iter().enumerate() {
        let mut line = entity_line(i + 1, &page.title, &page.path);
        match (page.section.is_empty(), page.nav_current) {
            (false, true) => line.push_str(&format!(" ({}, current)", page.section)),
            (false, false) => line.push_str(&format!(" ({})", page.section)),
            (true, _) => {}
        }
        lines.push(line);
        lines.push(format!("{}Source: {}", indent(1), page.path));
    }
    lines
}

fn dangling_lines(dangling: &[DanglingLink]) -> Vec<String> {
    if dangling.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Dangling links".to_string()];
    lines.extend(
        dangling
            .iter()
            .map(|d| format!("{}{} → {}", indent(1), d.from, d.slug)),
    );
    lines
}

// ============================================================================
// Stage 1: Pages
// ============================================================================

pub fn format_migrate_output(report: &MigrationReport, root: &Path) -> Vec<String> {
    let mut lines = page_lines(&report.pages);

    if !report.relocated.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for r in &report.relocated {
            let verb = if r.copied { "copied" } else { "moved" };
            lines.push(format!(
                "{}{} → {} ({})",
                indent(1),
                r.name,
                display_path(root, &r.dest),
                verb
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Migrated {}, relocated {}, removed {}",
        count(report.pages.len(), "page", "pages"),
        count(report.relocated.len(), "item", "items"),
        count(report.sources_removed, "source", "sources")
    ));
    lines
}

pub fn print_migrate_output(report: &MigrationReport, root: &Path) {
    for line in format_migrate_output(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Dry run
// ============================================================================

/// Format the dry-run preview: every page that would be migrated, then the
/// news index as it would be written.
pub fn format_check_output(pages: &[PageSummary], news: &[NewsEntry]) -> Vec<String> {
    let mut lines = page_lines(pages);
    lines.push(String::new());
    lines.push("News index".to_string());
    for entry in news {
        let mut line = entity_line(entry.order, &entry.title_display, &entry.slug);
        if entry.feature {
            line.push_str(" (feature)");
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push(format!(
        "Would migrate {}, index {}",
        count(pages.len(), "page", "pages"),
        count(news.len(), "news entry", "news entries")
    ));
    lines
}

pub fn print_check_output(pages: &[PageSummary], news: &[NewsEntry]) {
    for line in format_check_output(pages, news) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: News
// ============================================================================

pub fn format_news_output(report: &NewsReport, root: &Path) -> Vec<String> {
    let index_only: HashSet<&str> = report.index_only.iter().map(String::as_str).collect();
    let mut lines = vec!["News".to_string()];
    for entry in &report.entries {
        let mut line = entity_line(entry.order, &entry.title_display, &entry.slug);
        if index_only.contains(entry.slug.as_str()) {
            line.push_str(" (index only)");
        }
        lines.push(line);
        lines.push(format!("{}Source: {}", indent(1), entry.href));
    }

    if !report.unindexed.is_empty() {
        lines.push(String::new());
        lines.push("Unindexed".to_string());
        lines.extend(report.unindexed.iter().map(|s| format!("{}{}", indent(1), s)));
    }
    lines.extend(dangling_lines(&report.dangling));

    lines.push(String::new());
    lines.push(format!(
        "Wrote {}, {} → {}",
        count(report.entries.len(), "entry", "entries"),
        count(report.articles.len(), "article", "articles"),
        display_path(root, &report.side_table)
    ));
    lines
}

pub fn print_news_output(report: &NewsReport, root: &Path) {
    for line in format_news_output(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Shows
// ============================================================================

pub fn format_shows_output(report: &ShowsReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["Shows".to_string()];
    for (i, show) in report.shows.iter().enumerate() {
        lines.push(entity_line(i + 1, &show.show_title, &show.permalink));
        let date = [show.date_part_one.as_str(), show.date_part_two.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !date.is_empty() {
            lines.push(format!("{}Date: {}", indent(1), date));
        }
        if !show.location.is_empty() {
            lines.push(format!("{}Location: {}", indent(1), show.location));
        }
    }
    lines.extend(dangling_lines(&report.dangling));

    lines.push(String::new());
    lines.push(format!(
        "Wrote {} → {}",
        count(report.shows.len(), "show", "shows"),
        display_path(root, &report.side_table)
    ));
    lines
}

pub fn print_shows_output(report: &ShowsReport, root: &Path) {
    for line in format_shows_output(report, root) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::PageBundle;
    use crate::pages::Relocation;
    use crate::shows::ShowSummary;
    use std::path::PathBuf;

    fn page(path: &str, title: &str, section: &str, current: bool) -> PageSummary {
        PageSummary {
            path: path.to_string(),
            title: title.to_string(),
            section: section.to_string(),
            nav_current: current,
        }
    }

    fn entry(slug: &str, title: &str, order: usize, feature: bool) -> NewsEntry {
        NewsEntry {
            slug: slug.to_string(),
            href: format!("news/{slug}.html"),
            title_display: title.to_string(),
            tag: String::new(),
            short_desc: String::new(),
            image_src: String::new(),
            image_srcset: String::new(),
            image_sizes: String::new(),
            image_class: String::new(),
            feature,
            order,
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn entity_line_falls_back_to_path() {
        assert_eq!(entity_line(1, "About", "about.html"), "001 About");
        assert_eq!(entity_line(2, "", "contact.html"), "002 (contact.html)");
    }

    #[test]
    fn count_pluralizes() {
        assert_eq!(count(1, "page", "pages"), "1 page");
        assert_eq!(count(0, "page", "pages"), "0 pages");
        assert_eq!(count(3, "source", "sources"), "3 sources");
    }

    #[test]
    fn migrate_output() {
        let report = MigrationReport {
            pages: vec![
                page("index.html", "Home", "home", true),
                page("news/a.html", "A", "press", false),
                page("contact.html", "", "", false),
            ],
            relocated: vec![Relocation {
                name: "static".to_string(),
                dest: PathBuf::from("/export/src/assets/static"),
                copied: false,
            }],
            sources_removed: 3,
            bundle: PageBundle::new("src/pages", vec![]),
        };
        let lines = format_migrate_output(&report, Path::new("/export"));
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 Home (home, current)",
                "    Source: index.html",
                "002 A (press)",
                "    Source: news/a.html",
                "003 (contact.html)",
                "    Source: contact.html",
                "",
                "Assets",
                "    static → src/assets/static (moved)",
                "",
                "Migrated 3 pages, relocated 1 item, removed 3 sources",
            ]
        );
    }

    #[test]
    fn check_output_marks_features() {
        let lines = format_check_output(
            &[page("press.html", "Press", "press", true)],
            &[entry("a", "Alpha", 1, false), entry("b", "Beta", 3, true)],
        );
        assert!(lines.contains(&"001 Alpha".to_string()));
        assert!(lines.contains(&"003 Beta (feature)".to_string()));
        assert_eq!(lines.last().unwrap(), "Would migrate 1 page, index 2 news entries");
    }

    #[test]
    fn news_output() {
        let report = NewsReport {
            entries: vec![entry("a", "Alpha", 1, false), entry("b", "", 2, true)],
            articles: vec!["a".to_string(), "z".to_string()],
            index_only: vec!["b".to_string()],
            unindexed: vec!["z".to_string()],
            dangling: vec![DanglingLink {
                from: "a".to_string(),
                slug: "ghost".to_string(),
            }],
            side_table: PathBuf::from("/export/src/_data/news.json"),
        };
        let lines = format_news_output(&report, Path::new("/export"));
        assert_eq!(
            lines,
            vec![
                "News",
                "001 Alpha",
                "    Source: news/a.html",
                "002 (b) (index only)",
                "    Source: news/b.html",
                "",
                "Unindexed",
                "    z",
                "",
                "Dangling links",
                "    a → ghost",
                "",
                "Wrote 2 entries, 2 articles → src/_data/news.json",
            ]
        );
    }

    #[test]
    fn shows_output_skips_empty_context() {
        let report = ShowsReport {
            shows: vec![
                ShowSummary {
                    slug: "lisbon".to_string(),
                    permalink: "live-show/lisbon.html".to_string(),
                    show_title: "Lisbon".to_string(),
                    date_part_one: "14".to_string(),
                    date_part_two: "MAR".to_string(),
                    location: "Lisbon, PT".to_string(),
                    time: "21:00".to_string(),
                },
                ShowSummary {
                    slug: "tba".to_string(),
                    permalink: "live-show/tba.html".to_string(),
                    show_title: String::new(),
                    date_part_one: String::new(),
                    date_part_two: String::new(),
                    location: String::new(),
                    time: String::new(),
                },
            ],
            dangling: vec![],
            side_table: PathBuf::from("/export/src/_data/shows.json"),
        };
        let lines = format_shows_output(&report, Path::new("/export"));
        assert_eq!(
            lines,
            vec![
                "Shows",
                "001 Lisbon",
                "    Date: 14 MAR",
                "    Location: Lisbon, PT",
                "002 (live-show/tba.html)",
                "",
                "Wrote 2 shows → src/_data/shows.json",
            ]
        );
    }
}
