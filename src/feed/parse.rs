use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeedError;

/// A parsed feed listing
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    /// Entries in feed order, newest first for most feeds
    pub entries: Vec<FeedEntry>,
}

/// A raw feed entry, as handed to reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Feed-native id (guid), often a URL
    pub id: String,
    pub title: String,
    pub links: Vec<FeedLink>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub episode_number_hint: Option<String>,
}

/// A link attached to a feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLink {
    pub href: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Parse RSS feed XML bytes into a feed listing.
///
/// Items without a usable publication date are skipped.
pub fn parse_feed(xml_bytes: &[u8]) -> Result<Feed, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let entries = channel.items().iter().filter_map(parse_entry).collect();

    Ok(Feed {
        title: channel.title().to_string(),
        entries,
    })
}

fn parse_entry(item: &rss::Item) -> Option<FeedEntry> {
    let title = item
        .title()
        .map(String::from)
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let Some(published_at) = item.pub_date().and_then(parse_date) else {
        debug!(title = %title, "skipping feed item without a publication date");
        return None;
    };

    let links: Vec<FeedLink> = item
        .enclosure()
        .map(|enclosure| FeedLink {
            href: enclosure.url().to_string(),
            mime_type: enclosure.mime_type().to_string(),
        })
        .into_iter()
        .collect();

    let id = item
        .guid()
        .map(|g| g.value().to_string())
        .or_else(|| links.first().map(|l| l.href.clone()))
        .or_else(|| item.link().map(String::from))?;

    let itunes = item.itunes_ext();

    let long_description = item
        .description()
        .or_else(|| itunes.and_then(|ext| ext.summary()))
        .or_else(|| item.content())
        .map(String::from);

    Some(FeedEntry {
        id,
        title,
        links,
        short_description: itunes.and_then(|ext| ext.subtitle().map(String::from)),
        long_description,
        published_at,
        updated_at: None,
        episode_number_hint: itunes.and_then(|ext| ext.episode().map(String::from)),
    })
}

fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(date_str)
        .ok()
        .or_else(|| parse_relaxed_date(date_str))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Try to parse dates that don't strictly conform to RFC 2822
fn parse_relaxed_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    formats
        .iter()
        .find_map(|format| DateTime::parse_from_str(date_str.trim(), format).ok())
}
