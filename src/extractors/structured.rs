//! Structured-content extraction.
//!
//! Most news sites publish a schema.org `NewsArticle` as JSON-LD, often with
//! the full `articleBody`. That is the cleanest text available, so this
//! strategy runs first. Pages without it fall back to paragraphs inside
//! semantic `<article>` / `itemprop="articleBody"` markup, which skips
//! navigation and footer text that the generic paragraph strategy picks up.

use super::fetch::{FetchError, PageFetcher};
use super::html::{join_paragraphs, page_metadata};
use super::{ExtractionStrategy, Extracted};
use crate::models::{ArticleMetadata, ExtractionMethod};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

static JSON_LD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector")
});
static ARTICLE_PARAGRAPHS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"article p, [itemprop="articleBody"] p"#).expect("valid selector")
});

/// Strategy: JSON-LD `articleBody`, then semantic article markup.
#[derive(Debug, Clone)]
pub struct StructuredContent {
    pages: PageFetcher,
}

impl StructuredContent {
    pub fn new(pages: PageFetcher) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl ExtractionStrategy for StructuredContent {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::StructuredData
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<Option<Extracted>, FetchError> {
        let body = self.pages.get(url).await?;
        Ok(parse_structured_page(&body))
    }
}

pub fn parse_structured_page(body: &str) -> Option<Extracted> {
    let document = Html::parse_document(body);
    let metadata = page_metadata(&document);

    if let Some((text, ld_metadata)) = json_ld_article(&document) {
        debug!(chars = text.len(), "Found JSON-LD articleBody");
        let mut merged = ld_metadata;
        merged.merge_missing(metadata);
        return Some(Extracted {
            text,
            metadata: merged,
        });
    }

    let text = join_paragraphs(document.select(&ARTICLE_PARAGRAPHS));
    if text.is_empty() {
        return None;
    }
    debug!(chars = text.len(), "Using <article> paragraphs");
    Some(Extracted { text, metadata })
}

/// First JSON-LD `Article` node carrying a non-empty `articleBody`.
fn json_ld_article(document: &Html) -> Option<(String, ArticleMetadata)> {
    document
        .select(&JSON_LD)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            serde_json::from_str::<Value>(raw.trim()).ok()
        })
        .find_map(|value| find_article_node(&value))
}

fn find_article_node(value: &Value) -> Option<(String, ArticleMetadata)> {
    match value {
        Value::Array(items) => items.iter().find_map(find_article_node),
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                if let Some(found) = find_article_node(graph) {
                    return Some(found);
                }
            }
            if !is_article_type(map.get("@type")) {
                return None;
            }
            let body = map
                .get("articleBody")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|b| !b.is_empty())?;
            let metadata = ArticleMetadata {
                title: string_field(map.get("headline")),
                author: author_field(map.get("author")),
                published: string_field(map.get("datePublished")),
                description: string_field(map.get("description")),
            };
            Some((body.to_string(), metadata))
        }
        _ => None,
    }
}

/// `@type` is a string or a list of strings; any schema.org type whose name
/// contains "Article" (`NewsArticle`, `ReportageNewsArticle`, ...) counts.
fn is_article_type(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(t)) => t.contains("Article"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.contains("Article")),
        _ => false,
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `author` may be a string, a `Person` object, or a list of either.
fn author_field(value: Option<&Value>) -> Option<String> {
    let names: Vec<String> = match value? {
        Value::String(s) => vec![s.trim().to_string()],
        Value::Object(map) => string_field(map.get("name")).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| author_field(Some(item)))
            .collect(),
        _ => Vec::new(),
    };
    let names: Vec<String> = names.into_iter().filter(|n| !n.is_empty()).collect();
    (!names.is_empty()).then(|| names.join(", "))
}
