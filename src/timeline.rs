//! Posts from a user's timeline and the glue that narrows them down to the
//! ones worth itemizing.
//!
//! The JSON shape mirrors the social network's status objects, so a timeline
//! dumped straight from the API can be fed in without conversion. Only the
//! fields the pipeline reads are modelled; everything else is ignored.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Maximum timeline file size accepted (16 MB).
const MAX_TIMELINE_SIZE: u64 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("Failed to read timeline file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timeline JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Timeline file too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// Requested post count exceeds the configured ceiling.
    #[error("invalid number of posts {requested}, must be at most {max}")]
    CountTooHigh { requested: usize, max: usize },
}

/// Account that wrote a post.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Display name, e.g. "Alice Example"
    #[serde(default)]
    pub name: String,
    /// Handle without the leading `@`
    #[serde(default)]
    pub screen_name: String,
}

/// A link embedded in a post.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UrlEntity {
    /// Shortened form as it appears in the post text
    #[serde(default)]
    pub url: String,
    /// Resolved target of the link
    #[serde(default)]
    pub expanded_url: String,
}

impl UrlEntity {
    /// The best target available: the expanded URL, or the short form when
    /// the network did not expand it.
    pub fn target(&self) -> &str {
        if self.expanded_url.is_empty() {
            &self.url
        } else {
            &self.expanded_url
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

/// A single post (status) from a timeline.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Post {
    #[serde(default)]
    pub id: u64,
    /// Creation time in RubyDate format: `Mon Jan 02 15:04:05 -0700 2006`
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub user: User,
    /// Present when this post re-shares another one
    #[serde(default)]
    pub retweeted_status: Option<Box<Post>>,
    #[serde(default)]
    pub entities: Entities,
}

impl Post {
    /// Who the feed should credit for this post.
    ///
    /// A repost is credited to the original author, not the reposting user.
    pub fn attributed_user(&self) -> &User {
        match &self.retweeted_status {
            Some(original) => &original.user,
            None => &self.user,
        }
    }

    /// Link targets in the order they appear in the post.
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.entities.urls.iter().map(UrlEntity::target)
    }

    pub fn has_links(&self) -> bool {
        !self.entities.urls.is_empty()
    }
}

/// Loads a timeline (a JSON array of posts) from disk.
///
/// # Errors
///
/// - [`TimelineError::TooLarge`] if the file exceeds 16 MB
/// - [`TimelineError::Io`] if the file cannot be read
/// - [`TimelineError::Parse`] if the content is not a JSON array of posts
pub async fn load_timeline(path: &Path) -> Result<Vec<Post>, TimelineError> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.len() > MAX_TIMELINE_SIZE {
        return Err(TimelineError::TooLarge {
            size: meta.len(),
            max: MAX_TIMELINE_SIZE,
        });
    }

    let content = tokio::fs::read(path).await?;
    let posts: Vec<Post> = serde_json::from_slice(&content)?;
    tracing::debug!(path = %path.display(), posts = posts.len(), "Loaded timeline");
    Ok(posts)
}

/// Keeps only posts with at least one embedded link, preserving order.
pub fn filter_linked(posts: Vec<Post>) -> Vec<Post> {
    let total = posts.len();
    let linked: Vec<Post> = posts.into_iter().filter(Post::has_links).collect();
    tracing::debug!(
        total = total,
        linked = linked.len(),
        "Filtered timeline to posts with links"
    );
    linked
}

/// Resolves how many posts to consider.
///
/// Falls back to `default` when nothing was requested. A request above `max`
/// is rejected rather than clamped so the caller learns about the ceiling.
pub fn select_count(
    requested: Option<usize>,
    default: usize,
    max: usize,
) -> Result<usize, TimelineError> {
    let count = requested.unwrap_or(default);
    if count > max {
        return Err(TimelineError::CountTooHigh {
            requested: count,
            max,
        });
    }
    Ok(count)
}
