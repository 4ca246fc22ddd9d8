//! Retrieval of linked pages and the bits of them the feed cares about.
//!
//! - [`fetcher`] - cache-aside retrieval of a URL's body and content type
//! - [`title`] - `<title>` extraction from lenient HTML parses

mod fetcher;
mod title;

pub use fetcher::{
    build_http_client, normalize_content_type, ContentFetcher, ContentSource, FetchOutcome,
    FetchResult, FetcherOptions,
};
pub use title::{extract_title, parse_html, title_from_html};
