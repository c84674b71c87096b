//! The on-disk store record.
//!
//! Timestamps are ISO-8601 text without an offset, always UTC, at microsecond
//! precision (`2021-02-01T00:01:02` or `2021-02-01T00:01:02.123456`). Values
//! carrying an RFC 3339 offset are accepted as well.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{Episode, Episodes, Podcast, Podcasts};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Current time at the precision the store keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp the way the store file holds it
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    let naive = at.naive_utc();
    if at.timestamp_subsec_micros() == 0 {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        naive.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Parse a stored timestamp. Offset-less values are read as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(at) => Ok(at.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(text, NAIVE_FORMAT).map(|at| at.and_utc()),
    }
}

mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}

mod optional_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        at: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => serializer.serialize_some(&format_timestamp(at)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| parse_timestamp(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// The whole store as written to disk: podcast title -> podcast record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreRecord {
    pub podcasts: IndexMap<String, PodcastRecord>,
}

/// Serializable podcast data, including its episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastRecord {
    pub feed: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reverse_episode_order: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Episode id -> episode record
    #[serde(default)]
    pub episode_data: IndexMap<String, EpisodeRecord>,
}

/// Serializable episode data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode_number: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// `null` until the episode has been downloaded
    #[serde(default, with = "optional_timestamp")]
    pub downloaded_at: Option<DateTime<Utc>>,
}

impl EpisodeRecord {
    pub fn from_episode(episode: &Episode) -> Self {
        Self {
            episode_number: episode.episode_number.clone(),
            title: episode.title.clone(),
            short_description: episode.short_description.clone(),
            long_description: episode.long_description.clone(),
            url: episode.url.clone(),
            tags: episode.tags.clone(),
            created_at: episode.created_at,
            updated_at: episode.updated_at,
            downloaded_at: episode.downloaded_at,
        }
    }

    pub fn into_episode(self, id: String) -> Episode {
        Episode {
            id,
            episode_number: self.episode_number,
            title: self.title,
            short_description: self.short_description,
            long_description: self.long_description,
            url: self.url,
            tags: self.tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
            downloaded_at: self.downloaded_at,
        }
    }
}

impl PodcastRecord {
    pub fn from_podcast(podcast: &Podcast) -> Self {
        Self {
            feed: podcast.feed.clone(),
            tags: podcast.tags.clone(),
            reverse_episode_order: podcast.reverse_episode_order,
            created_at: podcast.created_at,
            updated_at: podcast.updated_at,
            episode_data: podcast
                .episodes
                .iter()
                .map(|e| (e.id.clone(), EpisodeRecord::from_episode(e)))
                .collect(),
        }
    }

    pub fn into_podcast(self, title: String) -> Podcast {
        let mut episodes = Episodes::new();
        for (id, record) in self.episode_data {
            episodes.insert(record.into_episode(id));
        }

        Podcast {
            title,
            feed: self.feed,
            tags: self.tags,
            reverse_episode_order: self.reverse_episode_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
            episodes,
        }
    }
}

impl StoreRecord {
    pub fn from_podcasts(podcasts: &Podcasts) -> Self {
        Self {
            podcasts: podcasts
                .iter()
                .map(|p| (p.title.clone(), PodcastRecord::from_podcast(p)))
                .collect(),
        }
    }

    pub fn into_podcasts(self) -> Podcasts {
        let mut podcasts = Podcasts::new();
        for (title, record) in self.podcasts {
            podcasts.insert(record.into_podcast(title));
        }
        podcasts
    }
}
