use crate::content::{title_from_html, ContentSource};
use chrono::Utc;
use std::sync::Arc;

use super::item::{render_description, FeedItem};
use super::unit::WorkUnit;

/// Turns a single work unit into a finished feed item.
///
/// Building never fails: a fetch that fails, a non-HTML response, or a page
/// without a usable title all leave the item with its URL as title.
pub struct ItemBuilder {
    source: Arc<dyn ContentSource>,
    profile_base_url: String,
}

impl ItemBuilder {
    /// # Arguments
    ///
    /// * `source` - where linked pages are fetched from (normally a cache-backed `ContentFetcher`)
    /// * `profile_base_url` - prefix for author profile links, e.g. `https://twitter.com/`
    pub fn new(source: Arc<dyn ContentSource>, profile_base_url: impl Into<String>) -> Self {
        Self {
            source,
            profile_base_url: profile_base_url.into(),
        }
    }

    pub async fn build(&self, unit: &WorkUnit) -> FeedItem {
        let mut item = FeedItem::from_unit(unit, &self.profile_base_url, Utc::now());

        let fetched = self.source.fetch(&unit.url).await;
        if fetched.is_failed() {
            tracing::debug!(position = unit.position, url = %unit.url, "Keeping default title");
        } else if fetched.is_html() {
            let body = fetched.body;
            match tokio::task::spawn_blocking(move || title_from_html(&body)).await {
                Ok(title) if title.is_empty() => {
                    tracing::debug!(position = unit.position, url = %unit.url, "Page has no title");
                }
                Ok(title) => item.title = title,
                Err(e) => {
                    tracing::warn!(
                        position = unit.position,
                        url = %unit.url,
                        error = %e,
                        "Title extraction failed, keeping default title"
                    );
                }
            }
        } else {
            tracing::debug!(
                position = unit.position,
                url = %unit.url,
                content_type = %fetched.content_type,
                "Not HTML, keeping default title"
            );
        }

        item.description = render_description(&item, &self.profile_base_url);
        item
    }
}
