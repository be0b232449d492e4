//! Shared HTTP plumbing for the extraction strategies.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Pages kept by [`PageFetcher`]; enough for several concurrent analyses.
const RECENT_PAGES: usize = 16;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, body, timeout, or too-many-redirects failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Error reported by the rendering service itself.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Build the HTTP client every strategy shares.
///
/// Redirects are capped at `max_redirects` so a redirect loop surfaces as an
/// error rather than a hang; `request_timeout` bounds each request.
pub fn build_client(
    user_agent: &str,
    request_timeout: Duration,
    max_redirects: usize,
) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::limited(max_redirects))
        .build()?;
    Ok(client)
}

/// GET `url` and return the body, treating any non-2xx status as an error.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = response.text().await?;
    debug!(bytes = body.len(), "Fetched page");
    Ok(body)
}

/// Fetches raw HTML for the strategies that parse the same static page.
///
/// The most recent bodies are kept by URL, so when the structured strategy
/// finds nothing usable the paragraph strategy parses the page it already
/// downloaded. Failed fetches are not kept. Clones share the same pages.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    recent: Arc<Mutex<VecDeque<(String, Arc<str>)>>>,
}

impl PageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(RECENT_PAGES))),
        }
    }

    /// Body of `url`, downloaded at most once while it stays recent.
    pub async fn get(&self, url: &str) -> Result<Arc<str>, FetchError> {
        if let Some(body) = self.cached(url).await {
            debug!(%url, bytes = body.len(), "Reusing fetched page");
            return Ok(body);
        }
        let body: Arc<str> = fetch_html(&self.client, url).await?.into();
        let mut recent = self.recent.lock().await;
        if recent.len() == RECENT_PAGES {
            recent.pop_front();
        }
        recent.push_back((url.to_string(), Arc::clone(&body)));
        Ok(body)
    }

    async fn cached(&self, url: &str) -> Option<Arc<str>> {
        self.recent
            .lock()
            .await
            .iter()
            .find(|(cached_url, _)| cached_url == url)
            .map(|(_, body)| Arc::clone(body))
    }
}
