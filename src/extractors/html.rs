//! Generic HTML paragraph extraction.
//!
//! Works on any page that ships its text in the initial HTML: every `<p>` in
//! the document is collected in order. Page metadata comes from the usual
//! OpenGraph and `<meta>` tags.

use super::fetch::{FetchError, PageFetcher};
use super::{ExtractionStrategy, Extracted};
use crate::models::{ArticleMetadata, ExtractionMethod};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static META_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="title"]"#));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="author"]"#));
static PUBLISHED: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="article:published_time"]"#));
static OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="og:description"]"#));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="description"]"#));

/// Strategy: fetch the raw HTML and keep every paragraph.
#[derive(Debug, Clone)]
pub struct HtmlParagraphs {
    pages: PageFetcher,
}

impl HtmlParagraphs {
    pub fn new(pages: PageFetcher) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl ExtractionStrategy for HtmlParagraphs {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::HtmlParagraphs
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<Option<Extracted>, FetchError> {
        let body = self.pages.get(url).await?;
        Ok(parse_paragraph_page(&body))
    }
}

/// Paragraph text plus metadata of an HTML page, or `None` when the page has
/// no paragraph text at all.
pub fn parse_paragraph_page(body: &str) -> Option<Extracted> {
    let document = Html::parse_document(body);
    let text = join_paragraphs(document.select(&PARAGRAPH));
    debug!(chars = text.len(), "Parsed paragraphs");
    if text.is_empty() {
        return None;
    }
    Some(Extracted {
        text,
        metadata: page_metadata(&document),
    })
}

/// Join the trimmed text of each element with blank lines, skipping empties.
pub fn join_paragraphs<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> String {
    elements
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Title, author, publish date and description from standard tags.
pub fn page_metadata(document: &Html) -> ArticleMetadata {
    let title = meta_content(document, &OG_TITLE)
        .or_else(|| meta_content(document, &META_TITLE))
        .or_else(|| element_text(document, &TITLE))
        .or_else(|| element_text(document, &H1));

    ArticleMetadata {
        title,
        author: meta_content(document, &AUTHOR),
        published: meta_content(document, &PUBLISHED),
        description: meta_content(document, &OG_DESCRIPTION)
            .or_else(|| meta_content(document, &DESCRIPTION)),
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
}
