use crate::itemize::FeedItem;
use chrono::{DateTime, Utc};

/// Channel-level metadata of a generated feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: String,
    pub created: DateTime<Utc>,
}

impl FeedMeta {
    /// Metadata for the feed built from `screen_name`'s timeline, stamped now.
    pub fn for_screen_name(screen_name: &str, profile_base_url: &str) -> Self {
        Self {
            title: format!("@{screen_name}'s linkfeed"),
            link: format!("{profile_base_url}{screen_name}"),
            description: format!("Links from posts in @{screen_name}'s timeline"),
            author: screen_name.to_string(),
            created: Utc::now(),
        }
    }
}

/// A complete feed: metadata plus items in link order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub meta: FeedMeta,
    pub items: Vec<FeedItem>,
}

impl Feed {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Wraps dispatched items in a feed. Item order is kept as given.
pub fn assemble(meta: FeedMeta, items: Vec<FeedItem>) -> Feed {
    tracing::debug!(title = %meta.title, items = items.len(), "Assembling feed");
    Feed { meta, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itemize::Author;

    fn item(link: &str) -> FeedItem {
        FeedItem {
            title: link.to_string(),
            link: link.to_string(),
            author: Author {
                name: "Bob".into(),
                screen_name: "bob".into(),
            },
            created_at: Utc::now(),
            description: String::new(),
        }
    }

    #[test]
    fn test_meta_for_screen_name() {
        let before = Utc::now();
        let meta = FeedMeta::for_screen_name("alice", "https://twitter.com/");

        assert_eq!(meta.title, "@alice's linkfeed");
        assert_eq!(meta.link, "https://twitter.com/alice");
        assert_eq!(meta.description, "Links from posts in @alice's timeline");
        assert_eq!(meta.author, "alice");
        assert!(meta.created >= before);
    }

    #[test]
    fn test_assemble_keeps_order() {
        let meta = FeedMeta::for_screen_name("alice", "https://twitter.com/");
        let feed = assemble(meta, vec![item("https://b.example/"), item("https://a.example/")]);

        assert_eq!(feed.len(), 2);
        assert_eq!(feed.items[0].link, "https://b.example/");
        assert_eq!(feed.items[1].link, "https://a.example/");
    }

    #[test]
    fn test_assemble_empty() {
        let meta = FeedMeta::for_screen_name("quiet", "https://twitter.com/");
        assert!(assemble(meta, Vec::new()).is_empty());
    }
}
