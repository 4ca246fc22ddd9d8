use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use super::unit::WorkUnit;

/// Creation-time format used by the social network, `Mon Jan 02 15:04:05 -0700 2006`,
/// minus the leading weekday.
const CREATED_AT_FORMAT: &str = "%b %d %H:%M:%S %z %Y";

/// Who a feed item is credited to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Display name
    pub name: String,
    /// Handle, used to build the profile link
    pub screen_name: String,
}

/// One entry of the generated feed, describing a linked page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Page title, or the URL when no better title is known
    pub title: String,
    /// The linked URL, unchanged regardless of fetch outcome
    pub link: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    /// Rendered HTML fragment (link, title, attribution)
    pub description: String,
}

impl FeedItem {
    /// Builds the item a unit gets before anything is fetched.
    ///
    /// The title is the URL itself; author and timestamp come from the
    /// source post. `now` is used when the post's timestamp is unreadable.
    pub fn from_unit(unit: &WorkUnit, profile_base_url: &str, now: DateTime<Utc>) -> Self {
        let user = unit.post.attributed_user();
        let created_at = parse_created_at(&unit.post.created_at).unwrap_or_else(|| {
            tracing::warn!(
                position = unit.position,
                created_at = %unit.post.created_at,
                "Unable to parse post creation time, using current time"
            );
            now
        });

        let mut item = Self {
            title: unit.url.clone(),
            link: unit.url.clone(),
            author: Author {
                name: user.name.clone(),
                screen_name: user.screen_name.clone(),
            },
            created_at,
            description: String::new(),
        };
        item.description = render_description(&item, profile_base_url);
        item
    }
}

/// Parses a post's creation time.
///
/// The weekday token is skipped, not checked against the date, so a post
/// stamped `Tue Aug 27 ... 2008` (a Wednesday) still parses.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let (_weekday, rest) = raw.trim().split_once(char::is_whitespace)?;
    DateTime::parse_from_str(rest.trim_start(), CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Renders the description fragment for an item.
///
/// Pure function of its inputs; every interpolated value is HTML-escaped.
/// Produces a link wrapping the title followed by an attribution line
/// linking to the author's profile.
pub fn render_description(item: &FeedItem, profile_base_url: &str) -> String {
    let handle = if item.author.screen_name.is_empty() {
        &item.author.name
    } else {
        &item.author.screen_name
    };
    let profile = format!("{profile_base_url}{handle}");

    format!(
        "\n<div>\n  <a href=\"{}\">{}</a>\n</div>\n<div>\nvia <a href=\"{}\">{}</a>\n</div>\n",
        encode_double_quoted_attribute(&item.link),
        encode_text(&item.title),
        encode_double_quoted_attribute(&profile),
        encode_text(&item.author.name),
    )
}
