//! News collection extractor.
//!
//! Stage 2 of the pipeline. News items show up in two places in the export:
//! as cards on the press index page, and as individual article pages under
//! `news/`. Either may exist without the other.
//!
//! ```text
//! press.html                          news/<slug>.html
//!   a.collection-link[href*=news/]      h1, .news-tag, .article-feature-img
//!     h2/h3, .news-tag, .short-desc     .cross-collection .collection-link
//!     img (src/srcset/sizes/class)
//!          │                                   │
//!          ▼                                   ▼
//!   _data/news.json  ◄── every index card      content/news/<slug>.md
//!                                               ◄── every article page,
//!                                                   merged with its card
//! ```
//!
//! ## Merge precedence
//!
//! For each article field the in-body value wins, then the index card, then
//! `""`. The short description only exists on the index.
//!
//! ## Order
//!
//! `order` is the card's 1-based position among *all* item links on the
//! index page, including links that point outside `news/` and are skipped.
//! Gaps in the sequence are expected.

use crate::bundle::PageBundle;
use crate::collection::{self, CollectionError, DanglingLink, SourcePage};
use crate::config::MigrateConfig;
use crate::front_matter::FrontMatter;
use crate::html::{self, Document};
use crate::schema::{NewsSchema, Schema};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header keys carried over from the migrated article page, with defaults.
const INHERITED: &[(&str, &str)] = &[
    ("title", ""),
    ("description", ""),
    ("og_title", ""),
    ("og_description", ""),
    ("og_image", ""),
    ("twitter_title", ""),
    ("twitter_description", ""),
    ("twitter_image", ""),
    ("css_href", ""),
    ("favicon_href", ""),
    ("webclip_href", ""),
    ("html_attrs", ""),
    ("section", "press"),
    ("nav_current", "false"),
    ("nav_prefix", ".."),
    ("asset_prefix", "../.."),
];

/// One card on the press index; also one row of `news.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEntry {
    pub slug: String,
    pub href: String,
    pub title_display: String,
    pub tag: String,
    pub short_desc: String,
    pub image_src: String,
    pub image_srcset: String,
    pub image_sizes: String,
    pub image_class: String,
    pub feature: bool,
    pub order: usize,
}

/// Fields read from the body of an article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleData {
    pub title: String,
    pub tag: String,
    pub image_src: String,
    pub image_srcset: String,
    pub image_sizes: String,
    pub other_slugs: Vec<String>,
}

#[derive(Debug)]
pub struct NewsReport {
    /// Index cards, in index order.
    pub entries: Vec<NewsEntry>,
    /// Slugs of the article content files written.
    pub articles: Vec<String>,
    /// Index cards with no article page.
    pub index_only: Vec<String>,
    /// Article pages with no index card.
    pub unindexed: Vec<String>,
    pub dangling: Vec<DanglingLink>,
    pub side_table: PathBuf,
}

/// Parse the press index into news entries, in document order.
///
/// Duplicate slugs keep the first card.
pub fn extract_press_items(raw: &str, schema: &NewsSchema) -> Vec<NewsEntry> {
    let doc = Document::parse(raw);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for (index, link) in doc.all(&schema.item_link).into_iter().enumerate() {
        let Some(href) = html::attr(link, "href") else {
            continue;
        };
        if !href.contains(schema.segment.as_str()) {
            continue;
        }
        let slug = collection::slug_from_href(href);
        if !seen.insert(slug.clone()) {
            warn!(slug = %slug, href, "duplicate news card on index, keeping the first");
            continue;
        }

        let img = html::scoped_first(link, &schema.item_image);
        let img_attr = |name: &str| img.map(|el| html::attr_or_empty(el, name)).unwrap_or_default();
        entries.push(NewsEntry {
            slug,
            href: href.to_string(),
            title_display: html::scoped_text(link, &schema.item_title),
            tag: html::scoped_text(link, &schema.item_tag),
            short_desc: html::scoped_text(link, &schema.item_short_desc),
            image_src: img_attr("src"),
            image_srcset: img_attr("srcset"),
            image_sizes: img_attr("sizes"),
            image_class: img_attr("class"),
            feature: html::has_class(link, &schema.feature_class),
            order: index + 1,
        });
    }
    entries
}

/// Read the article fields from an article page body.
pub fn extract_article(body: &str, schema: &NewsSchema) -> ArticleData {
    let doc = Document::parse(body);
    let image_attr = |name: &str| doc.first_attr(&schema.article_image, name).unwrap_or_default();
    ArticleData {
        title: doc.first_text(&schema.article_title),
        tag: doc.first_text(&schema.article_tag),
        image_src: image_attr("src"),
        image_srcset: image_attr("srcset"),
        image_sizes: image_attr("sizes"),
        other_slugs: collection::related_slugs(&doc, &schema.related_link),
    }
}

/// Build the header for one article content file.
pub fn article_front_matter(
    page: &SourcePage,
    article: &ArticleData,
    entry: Option<&NewsEntry>,
    config: &MigrateConfig,
) -> FrontMatter {
    let mut fm = FrontMatter::new();
    fm.insert("layout", config.news.layout.as_str());
    fm.insert("tags", config.news.tag.as_str());
    fm.insert("permalink", format!("{}/{}.html", config.news.dir, page.slug));
    collection::inherit(&mut fm, &page.header, INHERITED);
    fm.insert("page_title", pick(&article.title, entry.map(|e| e.title_display.as_str())));
    fm.insert("tag", pick(&article.tag, entry.map(|e| e.tag.as_str())));
    fm.insert("image_src", pick(&article.image_src, entry.map(|e| e.image_src.as_str())));
    fm.insert("image_srcset", pick(&article.image_srcset, entry.map(|e| e.image_srcset.as_str())));
    fm.insert("image_sizes", pick(&article.image_sizes, entry.map(|e| e.image_sizes.as_str())));
    fm.insert("short_desc", pick("", entry.map(|e| e.short_desc.as_str())));
    fm.insert("other_slugs", article.other_slugs.clone());
    fm
}

/// Body value, else index value, else `""`.
fn pick(body: &str, index: Option<&str>) -> String {
    collection::resolve(&[Some(body), index]).unwrap_or_default()
}

/// Read the index page body from the migrated tree.
fn read_index(
    root: &Path,
    bundle: &PageBundle,
    index_page: &str,
) -> Result<String, CollectionError> {
    let page = bundle
        .find(index_page)
        .ok_or_else(|| CollectionError::MissingPage(index_page.to_string()))?;
    let contents = fs::read_to_string(bundle.content_path(root, page))?;
    let body = FrontMatter::parse(&contents).map(|(_, body)| body.to_string());
    Ok(body.unwrap_or(contents))
}

/// Run the news stage against the migrated tree.
pub fn extract_news(
    root: &Path,
    config: &MigrateConfig,
    schema: &Schema,
    bundle: &PageBundle,
) -> Result<NewsReport, CollectionError> {
    let paths = config.paths.resolve(root);
    let news = &config.news;

    let entries = extract_press_items(&read_index(root, bundle, &news.index_page)?, &schema.news);
    let side_table = paths.data.join(&news.side_table);
    collection::write_side_table(&side_table, &entries)?;
    info!(entries = entries.len(), path = %side_table.display(), "wrote news side-table");

    let by_slug: HashMap<&str, &NewsEntry> = entries.iter().map(|e| (e.slug.as_str(), e)).collect();
    let pages = collection::read_collection_pages(root, bundle, &news.dir)?;
    let out_dir = paths.content.join(&news.dir);
    fs::create_dir_all(&out_dir)?;

    let mut articles = Vec::new();
    let mut unindexed = Vec::new();
    let mut related = Vec::new();
    for page in &pages {
        let article = extract_article(&page.body, &schema.news);
        let entry = by_slug.get(page.slug.as_str()).copied();
        if entry.is_none() {
            unindexed.push(page.slug.clone());
        }
        let fm = article_front_matter(page, &article, entry, config);
        crate::files::write_file(&out_dir.join(format!("{}.md", page.slug)), &fm.render(""))?;
        debug!(slug = %page.slug, indexed = entry.is_some(), "wrote news article");
        articles.push(page.slug.clone());
        related.push((page.slug.as_str(), article.other_slugs));
    }

    let known: HashSet<&str> = entries
        .iter()
        .map(|e| e.slug.as_str())
        .chain(articles.iter().map(String::as_str))
        .collect();
    let dangling = collection::dangling_links(
        related.iter().map(|(slug, other)| (*slug, other.as_slice())),
        &known,
    );

    let written: HashSet<&str> = articles.iter().map(String::as_str).collect();
    let index_only = entries
        .iter()
        .filter(|e| !written.contains(e.slug.as_str()))
        .map(|e| e.slug.clone())
        .collect();

    info!(articles = articles.len(), "news stage complete");
    Ok(NewsReport {
        entries,
        articles,
        index_only,
        unindexed,
        dangling,
        side_table,
    })
}

/// Parse the press index from the export, without writing anything.
pub fn check(
    root: &Path,
    config: &MigrateConfig,
    schema: &Schema,
) -> Result<Vec<NewsEntry>, CollectionError> {
    let raw = fs::read_to_string(root.join(&config.news.index_page))?;
    Ok(extract_press_items(&raw, &schema.news))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front_matter::Value;
    use crate::pages;
    use crate::test_helpers::*;

    fn news_schema() -> NewsSchema {
        Schema::compile(&MigrateConfig::default()).unwrap().news
    }

    const INDEX: &str = r#"<div class="collection-list">
  <a class="collection-link" href="news/a.html">
    <img src="images/a.jpg" srcset="images/a-500.jpg 500w" sizes="100vw" class="news-img">
    <h3>Alpha</h3><div class="news-tag">Tour</div><p class="short-desc">First.</p>
  </a>
  <a class="collection-link feature" href="./news/b.html?ref=index">
    <h2>Beta</h2>
  </a>
</div>"#;

    #[test]
    fn press_items_in_order_with_feature_flag() {
        let items = extract_press_items(INDEX, &news_schema());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].slug, "a");
        assert_eq!(items[0].order, 1);
        assert!(!items[0].feature);
        assert_eq!(items[1].slug, "b");
        assert_eq!(items[1].order, 2);
        assert!(items[1].feature);
        assert_eq!(items[1].href, "./news/b.html?ref=index");
    }

    #[test]
    fn press_item_fields() {
        let a = &extract_press_items(INDEX, &news_schema())[0];
        assert_eq!(a.title_display, "Alpha");
        assert_eq!(a.tag, "Tour");
        assert_eq!(a.short_desc, "First.");
        assert_eq!(a.image_src, "images/a.jpg");
        assert_eq!(a.image_srcset, "images/a-500.jpg 500w");
        assert_eq!(a.image_sizes, "100vw");
        assert_eq!(a.image_class, "news-img");
    }

    #[test]
    fn missing_card_fields_are_empty() {
        let b = &extract_press_items(INDEX, &news_schema())[1];
        assert_eq!(b.tag, "");
        assert_eq!(b.short_desc, "");
        assert_eq!(b.image_src, "");
    }

    #[test]
    fn order_counts_skipped_links() {
        let raw = r#"<a class="collection-link" href="live-show/x.html">show</a>
<a class="collection-link">no href</a>
<a class="collection-link" href="news/c.html">c</a>"#;
        let items = extract_press_items(raw, &news_schema());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order, 3);
    }

    #[test]
    fn duplicate_slug_keeps_first() {
        let raw = r#"<a class="collection-link" href="news/a.html"><h3>First</h3></a>
<a class="collection-link" href="../news/a.html"><h3>Second</h3></a>"#;
        let items = extract_press_items(raw, &news_schema());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title_display, "First");
    }

    #[test]
    fn side_table_is_deterministic() {
        let render = || {
            serde_json::to_string_pretty(&extract_press_items(INDEX, &news_schema())).unwrap()
        };
        let first = render();
        let second = render();
        assert_eq!(first, second);
    }

    fn source_page(slug: &str, body: &str) -> SourcePage {
        let mut header = FrontMatter::new();
        header.insert("title", "Page title");
        header.insert("nav_current", "false");
        SourcePage {
            slug: slug.to_string(),
            permalink: format!("news/{slug}.html"),
            header,
            body: body.to_string(),
        }
    }

    #[test]
    fn body_wins_over_index() {
        let items = extract_press_items(INDEX, &news_schema());
        let body =
            r#"<h1>Alpha, in full</h1><img class="article-feature-img" src="images/a-big.jpg">"#;
        let page = source_page("a", body);
        let article = extract_article(body, &news_schema());
        let fm = article_front_matter(&page, &article, Some(&items[0]), &MigrateConfig::default());

        assert_eq!(fm.get_str("page_title"), Some("Alpha, in full"));
        assert_eq!(fm.get_str("tag"), Some("Tour"));
        assert_eq!(fm.get_str("image_src"), Some("images/a-big.jpg"));
        assert_eq!(fm.get_str("image_srcset"), Some("images/a-500.jpg 500w"));
        assert_eq!(fm.get_str("short_desc"), Some("First."));
    }

    #[test]
    fn title_falls_back_to_index_then_empty() {
        let items = extract_press_items(INDEX, &news_schema());
        let article = extract_article("<p>no heading</p>", &news_schema());
        let config = MigrateConfig::default();

        let indexed =
            article_front_matter(&source_page("a", ""), &article, Some(&items[0]), &config);
        assert_eq!(indexed.get_str("page_title"), Some("Alpha"));

        let unindexed = article_front_matter(&source_page("z", ""), &article, None, &config);
        assert_eq!(unindexed.get_str("page_title"), Some(""));
        assert_eq!(unindexed.get_str("short_desc"), Some(""));
    }

    #[test]
    fn article_header_key_order() {
        let related = r#"<a class="collection-link" href="../news/b.html">b</a>"#;
        let article = extract_article(
            &format!(r#"<div class="cross-collection">{related}</div>"#),
            &news_schema(),
        );
        let config = MigrateConfig::default();
        let fm = article_front_matter(&source_page("a", ""), &article, None, &config);
        let keys: Vec<&str> = fm.keys().collect();
        assert_eq!(
            keys,
            vec![
                "layout",
                "tags",
                "permalink",
                "title",
                "description",
                "og_title",
                "og_description",
                "og_image",
                "twitter_title",
                "twitter_description",
                "twitter_image",
                "css_href",
                "favicon_href",
                "webclip_href",
                "html_attrs",
                "section",
                "nav_current",
                "nav_prefix",
                "asset_prefix",
                "page_title",
                "tag",
                "image_src",
                "image_srcset",
                "image_sizes",
                "short_desc",
                "other_slugs",
            ]
        );
        assert_eq!(fm.get_str("permalink"), Some("news/a.html"));
        assert_eq!(fm.get_str("title"), Some("Page title"));
        assert_eq!(fm.get_str("section"), Some("press"));
        assert_eq!(fm.get_str("nav_prefix"), Some(".."));
        assert_eq!(fm.get("other_slugs"), Some(&Value::List(vec!["b".to_string()])));
    }

    fn migrated_fixtures() -> (tempfile::TempDir, MigrateConfig, Schema, PageBundle) {
        let tmp = setup_fixtures();
        let config = MigrateConfig::default();
        let schema = Schema::compile(&config).unwrap();
        let bundle = pages::migrate(tmp.path(), &config, &schema).unwrap().bundle;
        (tmp, config, schema, bundle)
    }

    #[test]
    fn stage_writes_side_table_and_articles() {
        let (tmp, config, schema, bundle) = migrated_fixtures();
        let report = extract_news(tmp.path(), &config, &schema, &bundle).unwrap();

        let raw = fs::read_to_string(tmp.path().join("src/_data/news.json")).unwrap();
        let table: Vec<NewsEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(table, report.entries);
        let slugs: Vec<&str> = table.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["spring-tour", "new-single", "festival"]);
        assert_eq!(table[2].order, 4);
        assert!(table[1].feature);

        assert!(tmp.path().join("src/content/news/spring-tour.md").is_file());
        assert!(!tmp.path().join("src/content/news/festival.md").exists());
        assert_eq!(report.index_only, vec!["festival"]);
        assert_eq!(report.unindexed, vec!["archive-note"]);
    }

    #[test]
    fn stage_article_file_has_empty_body() {
        let (tmp, config, schema, bundle) = migrated_fixtures();
        extract_news(tmp.path(), &config, &schema, &bundle).unwrap();

        let doc = fs::read_to_string(tmp.path().join("src/content/news/new-single.md")).unwrap();
        assert!(doc.ends_with("---\n\n"));
        let (fm, body) = FrontMatter::parse(&doc).unwrap();
        assert_eq!(body, "\n");
        assert_eq!(fm.get_str("page_title"), Some("New single out now"));
        assert_eq!(fm.get_str("tag"), Some("Release"));
        assert_eq!(fm.get_str("title"), Some("New single | Northern Lights"));
    }

    #[test]
    fn stage_reports_dangling_related_links() {
        let (tmp, config, schema, bundle) = migrated_fixtures();
        let report = extract_news(tmp.path(), &config, &schema, &bundle).unwrap();
        assert_eq!(
            report.dangling,
            vec![DanglingLink {
                from: "spring-tour".into(),
                slug: "ghost-story".into()
            }]
        );
    }

    #[test]
    fn stage_rerun_is_byte_identical() {
        let (tmp, config, schema, bundle) = migrated_fixtures();
        extract_news(tmp.path(), &config, &schema, &bundle).unwrap();
        let first = fs::read(tmp.path().join("src/_data/news.json")).unwrap();
        extract_news(tmp.path(), &config, &schema, &bundle).unwrap();
        assert_eq!(first, fs::read(tmp.path().join("src/_data/news.json")).unwrap());
    }

    #[test]
    fn check_reads_export_index() {
        let tmp = setup_fixtures();
        let config = MigrateConfig::default();
        let schema = Schema::compile(&config).unwrap();
        let entries = check(tmp.path(), &config, &schema).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(!tmp.path().join("src").exists());
    }
}
