//! Headless-browser extraction through a Browserless `/content` endpoint.
//!
//! Last resort for JavaScript-heavy pages whose initial HTML carries no
//! article text. The rendering service returns the DOM after scripts ran;
//! paragraphs and metadata are then read the same way as for plain HTML.

use super::fetch::FetchError;
use super::html::parse_paragraph_page;
use super::{ExtractionStrategy, Extracted};
use crate::models::ExtractionMethod;
use async_trait::async_trait;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct HeadlessBrowser {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HeadlessBrowser {
    pub fn new(client: reqwest::Client, base_url: &str, token: Option<&str>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={}", urlencoding::encode(token)));
        }
        endpoint
    }

    /// Fully rendered HTML for `url`.
    pub async fn content(&self, url: &str) -> Result<String, FetchError> {
        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let html = resp.text().await?;
        debug!(bytes = html.len(), "Rendered page");
        Ok(html)
    }
}

#[async_trait]
impl ExtractionStrategy for HeadlessBrowser {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::HeadlessBrowser
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<Option<Extracted>, FetchError> {
        let html = self.content(url).await?;
        Ok(parse_paragraph_page(&html))
    }
}
