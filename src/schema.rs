//! Compiled extraction schema.
//!
//! The configured selector strings ([`crate::config`]) are the load-bearing
//! vocabulary of the export: class and tag names that must match the builder's
//! markup exactly. This module compiles them once, up front, so a bad selector
//! is a config error reported by field name rather than a silent empty
//! extraction deep inside a run.

use crate::config::{ConfigError, MigrateConfig};
use scraper::Selector;

/// A compiled head field.
#[derive(Debug, Clone)]
pub struct HeadFieldSchema {
    pub key: String,
    pub selector: Selector,
    /// `None` reads the element text.
    pub attr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageSchema {
    pub layout: String,
    pub head: Selector,
    pub body: Selector,
    pub head_fields: Vec<HeadFieldSchema>,
    pub styles: Selector,
    pub head_strip: Vec<Selector>,
    pub chrome: Vec<Selector>,
    pub body_strip: Vec<Selector>,
}

#[derive(Debug, Clone)]
pub struct NewsSchema {
    pub item_link: Selector,
    pub item_title: Selector,
    pub item_tag: Selector,
    pub item_short_desc: Selector,
    pub item_image: Selector,
    pub feature_class: String,
    pub segment: String,
    pub article_title: Selector,
    pub article_tag: Selector,
    pub article_image: Selector,
    pub related_link: Selector,
}

#[derive(Debug, Clone)]
pub struct ShowSchema {
    pub title: Selector,
    pub date: Selector,
    pub location: Vec<Selector>,
    pub time: Selector,
    pub body: Selector,
    pub related_link: Selector,
}

/// Every selector the pipeline uses, compiled.
#[derive(Debug, Clone)]
pub struct Schema {
    pub page: PageSchema,
    pub news: NewsSchema,
    pub shows: ShowSchema,
}

impl Schema {
    pub fn compile(config: &MigrateConfig) -> Result<Self, ConfigError> {
        let page = &config.page;
        let head_fields = page
            .head_fields
            .iter()
            .map(|f| {
                Ok(HeadFieldSchema {
                    key: f.key.clone(),
                    selector: compile(&format!("page.head_fields.{}", f.key), &f.selector)?,
                    attr: f.attr.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let news = &config.news;
        let shows = &config.shows;
        Ok(Self {
            page: PageSchema {
                layout: page.layout.clone(),
                head: compile("head", "head")?,
                body: compile("body", "body")?,
                head_fields,
                styles: compile("page.styles", &page.styles)?,
                head_strip: compile_all("page.head_strip", &page.head_strip)?,
                chrome: compile_all("page.chrome", &page.chrome)?,
                body_strip: compile_all("page.body_strip", &page.body_strip)?,
            },
            news: NewsSchema {
                item_link: compile("news.item_link", &news.item_link)?,
                item_title: compile("news.item_title", &news.item_title)?,
                item_tag: compile("news.item_tag", &news.item_tag)?,
                item_short_desc: compile("news.item_short_desc", &news.item_short_desc)?,
                item_image: compile("news.item_image", &news.item_image)?,
                feature_class: news.feature_class.clone(),
                segment: format!("{}/", news.dir),
                article_title: compile("news.article_title", &news.article_title)?,
                article_tag: compile("news.article_tag", &news.article_tag)?,
                article_image: compile("news.article_image", &news.article_image)?,
                related_link: compile("news.related_link", &news.related_link)?,
            },
            shows: ShowSchema {
                title: compile("shows.title", &shows.title)?,
                date: compile("shows.date", &shows.date)?,
                location: compile_all("shows.location", &shows.location)?,
                time: compile("shows.time", &shows.time)?,
                body: compile("shows.body", &shows.body)?,
                related_link: compile("shows.related_link", &shows.related_link)?,
            },
        })
    }
}

fn compile(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        field: field.to_string(),
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn compile_all(field: &str, selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .enumerate()
        .map(|(i, s)| compile(&format!("{field}[{i}]"), s))
        .collect()
}
