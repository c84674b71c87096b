//! Feed reconciliation.
//!
//! A refresh merges the full current feed listing into a podcast's episodes:
//! entries are normalized into [`NewEpisode`] values, existing episodes are
//! updated in place (keeping their tags and download state), unknown ones are
//! added as new, and episodes missing from the feed are pruned.
//!
//! Every entry is normalized before the first episode is touched, so a feed
//! that cannot be reconciled leaves the podcast exactly as it was.

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::ReconcileError;
use crate::feed::{FeedEntry, FeedLink};
use crate::model::{NewEpisode, Podcast};
use crate::record;

/// MIME types accepted as the episode's audio enclosure
pub const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/x-mpeg",
    "audio/mp4",
    "audio/x-m4a",
    "audio/m4a",
    "audio/aac",
    "audio/ogg",
    "audio/opus",
];

/// Width episode numbers are zero-padded to
const EPISODE_NUMBER_WIDTH: usize = 4;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<]+?>").expect("markup regex is valid"));

/// What a single refresh changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Reconcile a podcast's episodes against a full feed listing
pub fn refresh(
    podcast: &mut Podcast,
    entries: &[FeedEntry],
) -> Result<RefreshSummary, ReconcileError> {
    let normalized = normalize_entries(entries, podcast.reverse_episode_order)?;
    let seen: HashSet<String> = normalized.keys().cloned().collect();
    let mut summary = RefreshSummary::default();

    for (id, new_episode) in normalized {
        match podcast.episodes.find_mut(&id) {
            Some(episode) => {
                episode.update_from(new_episode);
                summary.updated += 1;
            }
            None => {
                debug!(podcast = %podcast.title, id = %id, "adding episode");
                podcast.episodes.insert_new(new_episode);
                summary.added += 1;
            }
        }
    }

    let stale: Vec<String> = podcast
        .episodes
        .ids()
        .filter(|id| !seen.contains(*id))
        .map(String::from)
        .collect();
    for id in stale {
        if podcast.episodes.delete(&id).is_ok() {
            debug!(podcast = %podcast.title, id = %id, "pruned episode no longer in feed");
            summary.removed += 1;
        }
    }

    podcast.updated_at = record::now();

    info!(
        podcast = %podcast.title,
        added = summary.added,
        updated = summary.updated,
        removed = summary.removed,
        "refreshed podcast"
    );
    Ok(summary)
}

/// Normalize a whole listing, keyed by store id in feed order.
///
/// When two entries map to the same store id the later one wins.
pub fn normalize_entries(
    entries: &[FeedEntry],
    reverse_order: bool,
) -> Result<IndexMap<String, NewEpisode>, ReconcileError> {
    let total = entries.len();
    let mut normalized = IndexMap::with_capacity(total);

    for (position, entry) in entries.iter().enumerate() {
        let fallback_number = listing_number(position, total, reverse_order);
        let episode = normalize_entry(entry, fallback_number)?;

        if let Some(previous) = normalized.insert(episode.id.clone(), episode) {
            warn!(
                id = %previous.id,
                title = %previous.title,
                "feed entries collide on store id; keeping the later entry"
            );
        }
    }

    Ok(normalized)
}

/// Turn one feed entry into episode data
pub fn normalize_entry(
    entry: &FeedEntry,
    fallback_number: usize,
) -> Result<NewEpisode, ReconcileError> {
    let id = store_id(&entry.id);
    if id.is_empty() {
        return Err(ReconcileError::EmptyId {
            title: entry.title.clone(),
        });
    }

    let url = audio_url(&entry.links).ok_or_else(|| ReconcileError::MissingAudioLink {
        title: entry.title.clone(),
    })?;

    let long_description = entry
        .long_description
        .as_deref()
        .map(clean_description)
        .unwrap_or_default();
    let short_description = entry
        .short_description
        .as_deref()
        .map(clean_description)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| long_description.clone());

    let number = entry
        .episode_number_hint
        .as_deref()
        .map(str::trim)
        .filter(|hint| !hint.is_empty())
        .map(String::from)
        .unwrap_or_else(|| fallback_number.to_string());

    Ok(NewEpisode {
        id: id.to_string(),
        episode_number: pad_episode_number(&number),
        title: entry.title.trim().to_string(),
        short_description,
        long_description,
        url: url.to_string(),
        created_at: entry.published_at,
        updated_at: entry.updated_at.unwrap_or(entry.published_at),
    })
}

/// Derive a store id from a feed-native id: its last path segment
pub fn store_id(feed_id: &str) -> &str {
    feed_id
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Episode number implied by a position in a newest-first listing
pub fn listing_number(position: usize, total: usize, reverse_order: bool) -> usize {
    if reverse_order {
        position + 1
    } else {
        total - position
    }
}

/// Strip markup, decode entities and drop non-ASCII characters
pub fn clean_description(text: &str) -> String {
    let without_markup = MARKUP_TAG.replace_all(text, "");
    let decoded = html_escape::decode_html_entities(&without_markup);
    decoded
        .chars()
        .filter(char::is_ascii)
        .collect::<String>()
        .trim()
        .to_string()
}

fn audio_url(links: &[FeedLink]) -> Option<&str> {
    links
        .iter()
        .find(|link| {
            AUDIO_MIME_TYPES
                .iter()
                .any(|mime| link.mime_type.eq_ignore_ascii_case(mime))
        })
        .map(|link| link.href.as_str())
}

fn pad_episode_number(number: &str) -> String {
    format!("{number:0>width$}", width = EPISODE_NUMBER_WIDTH)
}
