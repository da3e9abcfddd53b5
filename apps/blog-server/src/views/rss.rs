//! RSS 2.0 feed of the latest posts.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use yablog_core::domain::Post;

use super::pages::EXCERPT_WORDS;

/// Posts included in the feed.
pub const FEED_ITEMS: u64 = 5;

pub struct FeedChannel<'a> {
    pub title: &'a str,
    /// Absolute site root, without a trailing slash.
    pub site_url: &'a str,
    pub description: &'a str,
}

impl FeedChannel<'_> {
    pub fn render(&self, posts: &[Post]) -> quick_xml::Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        push_text(&mut writer, "title", self.title)?;
        push_text(&mut writer, "link", &format!("{}/blog/", self.site_url))?;
        push_text(&mut writer, "description", self.description)?;

        for post in posts {
            let link = format!("{}{}", self.site_url, post.canonical_path());

            writer.write_event(Event::Start(BytesStart::new("item")))?;
            push_text(&mut writer, "title", &post.title)?;
            push_text(&mut writer, "link", &link)?;

            let mut guid = BytesStart::new("guid");
            guid.push_attribute(("isPermaLink", "true"));
            writer.write_event(Event::Start(guid))?;
            writer.write_event(Event::Text(BytesText::new(&link)))?;
            writer.write_event(Event::End(BytesEnd::new("guid")))?;

            push_text(&mut writer, "description", &post.summary(EXCERPT_WORDS))?;
            push_text(&mut writer, "pubDate", &post.publish.to_rfc2822())?;
            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        Ok(writer.into_inner().into_inner())
    }
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
