use crate::util::{atomic_write, strip_control_chars};
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use super::assembler::Feed;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serializes a feed as an RSS 2.0 document.
///
/// Text content is XML-escaped and stripped of characters XML 1.0 cannot
/// carry. Dates are RFC 2822. Each item's `guid` is its link, marked as not
/// being a permalink.
pub fn write_rss(feed: &Feed) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .context("Failed to write channel element")?;

    let meta = &feed.meta;
    write_text_element(&mut writer, "title", &meta.title)?;
    write_text_element(&mut writer, "link", &meta.link)?;
    write_text_element(&mut writer, "description", &meta.description)?;
    write_text_element(&mut writer, "managingEditor", &meta.author)?;
    write_text_element(&mut writer, "pubDate", &meta.created.to_rfc2822())?;

    for item in &feed.items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .context("Failed to write item element")?;

        write_text_element(&mut writer, "title", &item.title)?;
        write_text_element(&mut writer, "link", &item.link)?;
        write_text_element(&mut writer, "description", &item.description)?;
        write_text_element(&mut writer, "author", &item.author.name)?;
        write_text_element(&mut writer, "pubDate", &item.created_at.to_rfc2822())?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer
            .write_event(Event::Start(guid))
            .context("Failed to write guid element")?;
        writer
            .write_event(Event::Text(BytesText::new(&strip_control_chars(&item.link))))
            .context("Failed to write guid text")?;
        writer
            .write_event(Event::End(BytesEnd::new("guid")))
            .context("Failed to write guid end")?;

        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .context("Failed to write item end")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .context("Failed to write channel end")?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .context("Failed to write rss end")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).context("Generated RSS contains invalid UTF-8")
}

fn write_text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(&strip_control_chars(text))))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

/// Writes the RSS document to `path`, replacing any previous feed in one step.
pub fn write_rss_to_file(feed: &Feed, path: &Path) -> Result<()> {
    let content = write_rss(feed)?;
    atomic_write(path, content.as_bytes())
        .with_context(|| format!("Failed to write feed to '{}'", path.display()))?;

    tracing::info!(path = %path.display(), items = feed.len(), "Feed written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{assemble, FeedMeta};
    use crate::itemize::{render_description, Author, FeedItem};
    use chrono::{TimeZone, Utc};

    const PROFILE: &str = "https://twitter.com/";

    fn item(title: &str, link: &str, author: &str) -> FeedItem {
        let mut item = FeedItem {
            title: title.to_string(),
            link: link.to_string(),
            author: Author {
                name: author.to_string(),
                screen_name: author.to_lowercase(),
            },
            created_at: Utc.with_ymd_and_hms(2008, 8, 27, 13, 8, 45).unwrap(),
            description: String::new(),
        };
        item.description = render_description(&item, PROFILE);
        item
    }

    fn sample_feed(items: Vec<FeedItem>) -> Feed {
        let mut meta = FeedMeta::for_screen_name("alice", PROFILE);
        meta.created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assemble(meta, items)
    }

    #[test]
    fn test_rss_parses_back() {
        let feed = sample_feed(vec![
            item("First Page", "https://example.com/1", "Bob"),
            item("https://example.com/2", "https://example.com/2", "Carol"),
        ]);
        let xml = write_rss(&feed).expect("Failed to write RSS");

        let parsed = feed_rs::parser::parse(xml.as_bytes()).expect("Generated RSS should parse");
        assert_eq!(
            parsed.title.map(|t| t.content).as_deref(),
            Some("@alice's linkfeed")
        );
        assert_eq!(parsed.entries.len(), 2);

        let first = &parsed.entries[0];
        assert_eq!(first.title.as_ref().map(|t| t.content.as_str()), Some("First Page"));
        assert_eq!(first.links[0].href, "https://example.com/1");
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2008, 8, 27, 13, 8, 45).unwrap())
        );
        let summary = first.summary.as_ref().map(|s| s.content.clone()).unwrap_or_default();
        assert!(summary.contains("First Page"));
        assert!(summary.contains("https://twitter.com/bob"));

        assert_eq!(parsed.entries[1].links[0].href, "https://example.com/2");
    }

    #[test]
    fn test_rss_channel_fields() {
        let xml = write_rss(&sample_feed(Vec::new())).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<rss version=\"2.0\">"));
        assert!(xml.contains("<link>https://twitter.com/alice</link>"));
        assert!(xml.contains("<managingEditor>alice</managingEditor>"));
        assert!(xml.contains("Mar 2024 12:00:00 +0000</pubDate>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_rss_guid_not_permalink() {
        let xml = write_rss(&sample_feed(vec![item("t", "https://example.com/g", "Bob")])).unwrap();
        assert!(xml.contains("<guid isPermaLink=\"false\">https://example.com/g</guid>"));
    }

    #[test]
    fn test_rss_escapes_markup() {
        let feed = sample_feed(vec![item(
            "Tom & Jerry <3",
            "https://example.com/?a=1&b=2",
            "Bob",
        )]);
        let xml = write_rss(&feed).unwrap();

        assert!(xml.contains("Tom &amp; Jerry &lt;3"));
        assert!(xml.contains("https://example.com/?a=1&amp;b=2"));
        // The description is an HTML fragment carried as escaped text
        assert!(xml.contains("&lt;div&gt;"));

        let parsed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert_eq!(
            parsed.entries[0].title.as_ref().map(|t| t.content.as_str()),
            Some("Tom & Jerry <3")
        );
    }

    #[test]
    fn test_rss_drops_control_characters() {
        let feed = sample_feed(vec![item("bell\u{7} title", "https://example.com/c", "Bob")]);
        let xml = write_rss(&feed).unwrap();
        assert!(!xml.contains('\u{7}'));
        assert!(feed_rs::parser::parse(xml.as_bytes()).is_ok());
    }

    #[test]
    fn test_write_rss_to_file() {
        let dir = std::env::temp_dir().join("linkfeed_rss_file_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feed.xml");

        write_rss_to_file(&sample_feed(Vec::new()), &path).expect("Failed to write feed file");

        let feed = sample_feed(vec![item("File", "https://example.com/f", "Bob")]);
        write_rss_to_file(&feed, &path).expect("Failed to replace feed file");

        let content = std::fs::read_to_string(&path).expect("Failed to read feed file");
        assert_eq!(content, write_rss(&feed).unwrap());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
