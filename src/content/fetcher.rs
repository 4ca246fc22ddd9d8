use crate::storage::{CachedLink, LinkCache};
use crate::util::{validate_url, UrlValidationError};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Why a network fetch produced nothing usable.
///
/// Never leaves this module: every variant collapses into
/// [`FetchOutcome::Failed`] after being logged.
#[derive(Debug, Error)]
enum NetworkError {
    #[error("URL rejected: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
}

/// Where a [`FetchResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the link cache, no network call made
    CacheHit,
    /// Retrieved over the network (and written back to the cache)
    Network,
    /// Nothing could be retrieved; body and content type are empty
    Failed,
}

/// Body and content type of a linked resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub body: Vec<u8>,
    /// MIME type with parameters stripped, lowercased (e.g. `text/html`)
    pub content_type: String,
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn failed() -> Self {
        Self {
            body: Vec::new(),
            content_type: String::new(),
            outcome: FetchOutcome::Failed,
        }
    }

    fn from_link(link: CachedLink, outcome: FetchOutcome) -> Self {
        Self {
            body: link.body,
            content_type: link.content_type,
            outcome,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == FetchOutcome::Failed
    }

    /// Whether the content type belongs to the HTML family.
    pub fn is_html(&self) -> bool {
        matches!(
            self.content_type.as_str(),
            "text/html" | "application/xhtml+xml"
        )
    }
}

/// Anything that can resolve a URL to its content.
///
/// Implementations never fail outright: problems are reported as
/// [`FetchOutcome::Failed`] so the caller can carry on with defaults.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// Tunables for [`ContentFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Budget for the request and the body read together
    pub timeout: Duration,
    /// Skip the localhost/private-range check (tests, trusted networks)
    pub allow_private_hosts: bool,
    /// Bodies larger than this are treated as failures
    pub max_body_size: usize,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            allow_private_hosts: false,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

/// Cache-aside fetcher: consult the link cache, fall back to a single GET,
/// write successful downloads back.
///
/// Cache trouble of any kind degrades to a miss; a cache write that fails is
/// logged and otherwise ignored.
pub struct ContentFetcher {
    client: reqwest::Client,
    cache: Arc<dyn LinkCache>,
    options: FetcherOptions,
}

impl ContentFetcher {
    pub fn new(client: reqwest::Client, cache: Arc<dyn LinkCache>, options: FetcherOptions) -> Self {
        Self {
            client,
            cache,
            options,
        }
    }

    /// Looks `url` up in the cache, treating backend errors and blank
    /// entries as misses.
    async fn lookup(&self, url: &str) -> Option<CachedLink> {
        match self.cache.exists(url).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Error checking link cache, fetching instead");
                return None;
            }
        }

        match self.cache.get(url).await {
            Ok(Some(link)) if !link.is_blank() => Some(link),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Error reading link cache, fetching instead");
                None
            }
        }
    }

    async fn download(&self, url: &str) -> Result<CachedLink, NetworkError> {
        let target = validate_url(url, self.options.allow_private_hosts)?;
        let timeout = self.options.timeout;

        tokio::time::timeout(timeout, async {
            // Any status is usable: error pages still carry a body and a type
            let response = self.client.get(target).send().await?;
            tracing::debug!(url = %url, status = %response.status(), "Received response");

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(normalize_content_type)
                .unwrap_or_default();
            let body = read_limited_bytes(response, self.options.max_body_size).await?;

            Ok::<_, NetworkError>(CachedLink { body, content_type })
        })
        .await
        .map_err(|_| NetworkError::Timeout(timeout))?
    }
}

#[async_trait]
impl ContentSource for ContentFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        if let Some(link) = self.lookup(url).await {
            tracing::debug!(url = %url, "Link cache hit");
            return FetchResult::from_link(link, FetchOutcome::CacheHit);
        }

        let link = match self.download(url).await {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Unable to retrieve link");
                return FetchResult::failed();
            }
        };

        if let Err(e) = self.cache.put(url, &link).await {
            tracing::warn!(url = %url, error = %e, "Error storing link in cache");
        }

        FetchResult::from_link(link, FetchOutcome::Network)
    }
}

/// Maximum redirects followed per link (shorteners commonly chain two or three)
const MAX_REDIRECTS: usize = 5;

/// Builds the HTTP client shared by all fetches of a run.
///
/// No client-level timeout is set; [`FetcherOptions::timeout`] bounds each
/// fetch instead.
pub fn build_http_client(user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}

/// Follows up to [`MAX_REDIRECTS`] hops and stops on loops.
fn redirect_policy() -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("Too many redirects (max {MAX_REDIRECTS})"));
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

/// Strips MIME parameters: `text/html; charset=utf-8` becomes `text/html`.
pub fn normalize_content_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, NetworkError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(NetworkError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(NetworkError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(NetworkError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
