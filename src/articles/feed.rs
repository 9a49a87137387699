use std::cmp::Reverse;

use anyhow::Context;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

pub const FALLBACK_DESCRIPTION: &str = "No description available";

/// One article out of an RSS channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub description: String,
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
    PubDate,
    Description,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Field> {
        match tag {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::PubDate),
            b"description" => Some(Field::Description),
            _ => None,
        }
    }

    fn assign(self, item: &mut FeedItem, text: &str) {
        let slot = match self {
            Field::Title => &mut item.title,
            Field::Link => &mut item.link,
            Field::PubDate => &mut item.pub_date,
            Field::Description => &mut item.description,
        };
        slot.push_str(text);
    }
}

/// Pull `<item>` entries out of an RSS document. Channel-level title/link
/// elements are ignored; only fields inside an item are captured.
pub fn parse_rss(xml: &str) -> anyhow::Result<Vec<FeedItem>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event().context("malformed feed xml")? {
            Event::Start(e) => {
                if e.name().as_ref() == b"item" {
                    current = Some(FeedItem::default());
                    field = None;
                } else {
                    field = Field::from_tag(e.name().as_ref());
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    if let Some(mut item) = current.take() {
                        if item.description.is_empty() {
                            item.description = FALLBACK_DESCRIPTION.into();
                        }
                        items.push(item);
                    }
                }
                field = None;
            }
            Event::Text(t) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    f.assign(item, &t.unescape().context("bad text node")?);
                }
            }
            Event::CData(t) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    f.assign(item, &String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(items)
}

/// RSS dates are RFC 2822 with the occasional named zone; `time` only takes
/// numeric offsets, so GMT/UT/UTC are normalized first.
pub fn parse_pub_date(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    let normalized = ["GMT", "UTC", "UT"]
        .iter()
        .find_map(|zone| trimmed.strip_suffix(zone).map(|rest| format!("{rest}+0000")))
        .unwrap_or_else(|| trimmed.to_string());
    OffsetDateTime::parse(&normalized, &Rfc2822).ok()
}

/// Most recent first; items with unparseable dates sink to the end.
pub fn sort_newest_first(items: &mut [FeedItem]) {
    items.sort_by_cached_key(|item| {
        Reverse(parse_pub_date(&item.pub_date).unwrap_or(OffsetDateTime::UNIX_EPOCH))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Tagged feed</title>
    <link>https://example.com</link>
    <description>channel description</description>
    <item>
      <title>Older article</title>
      <link>https://example.com/older</link>
      <pubDate>Mon, 04 Aug 2025 10:00:00 GMT</pubDate>
      <description><![CDATA[<p>Body with &amp; markup</p>]]></description>
    </item>
    <item>
      <title>Newer article</title>
      <link>https://example.com/newer</link>
      <pubDate>Wed, 06 Aug 2025 08:30:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn items_are_extracted_with_their_fields() {
        let items = parse_rss(FEED).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Older article");
        assert_eq!(items[0].link, "https://example.com/older");
        assert_eq!(items[0].description, "<p>Body with &amp; markup</p>");
    }

    #[test]
    fn channel_metadata_does_not_leak_into_items() {
        let items = parse_rss(FEED).unwrap();
        assert!(items.iter().all(|i| i.title != "Tagged feed"));
    }

    #[test]
    fn missing_description_gets_the_fallback() {
        let items = parse_rss(FEED).unwrap();
        assert_eq!(items[1].description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn pub_dates_parse_with_named_and_numeric_zones() {
        assert!(parse_pub_date("Mon, 04 Aug 2025 10:00:00 GMT").is_some());
        assert!(parse_pub_date("Wed, 06 Aug 2025 08:30:00 +0000").is_some());
        assert!(parse_pub_date("not a date").is_none());
    }

    #[test]
    fn sorting_puts_the_newest_first() {
        let mut items = parse_rss(FEED).unwrap();
        sort_newest_first(&mut items);
        assert_eq!(items[0].title, "Newer article");
        assert_eq!(items[1].title, "Older article");
    }

    #[test]
    fn unparseable_dates_sort_last() {
        let mut items = vec![
            FeedItem {
                title: "broken".into(),
                pub_date: "???".into(),
                ..Default::default()
            },
            FeedItem {
                title: "dated".into(),
                pub_date: "Mon, 04 Aug 2025 10:00:00 GMT".into(),
                ..Default::default()
            },
        ];
        sort_newest_first(&mut items);
        assert_eq!(items[0].title, "dated");
    }

    #[test]
    fn feed_item_serializes_pub_date_key() {
        let item = FeedItem {
            title: "t".into(),
            link: "l".into(),
            pub_date: "d".into(),
            description: "x".into(),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert!(v.get("pubDate").is_some());
    }
}
