use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::StoreError;

/// Tag marking an episode that has not been downloaded or otherwise seen yet
pub const NEW_TAG: &str = "new";

/// A podcast episode tracked in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    /// Store id, unique within the owning podcast
    pub id: String,
    /// Zero-padded episode number, e.g. "0023"
    pub episode_number: String,
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    /// Audio enclosure URL
    pub url: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub downloaded_at: Option<DateTime<Utc>>,
}

/// Descriptive episode data derived from a single feed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEpisode {
    pub id: String,
    pub episode_number: String,
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Episode {
    /// Build a freshly discovered episode, tagged as new
    pub fn from_new(new: NewEpisode) -> Self {
        Self {
            id: new.id,
            episode_number: new.episode_number,
            title: new.title,
            short_description: new.short_description,
            long_description: new.long_description,
            url: new.url,
            tags: vec![NEW_TAG.to_string()],
            created_at: new.created_at,
            updated_at: new.updated_at,
            downloaded_at: None,
        }
    }

    /// Overwrite the descriptive fields from feed data.
    ///
    /// Tags and download state are left alone.
    pub fn update_from(&mut self, new: NewEpisode) {
        self.episode_number = new.episode_number;
        self.title = new.title;
        self.short_description = new.short_description;
        self.long_description = new.long_description;
        self.url = new.url;
        self.created_at = new.created_at;
        self.updated_at = new.updated_at;
    }

    /// Numeric value of the episode number, if it is numeric
    pub fn number(&self) -> Option<u32> {
        self.episode_number.trim().parse().ok()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the episode still carries the `new` tag
    pub fn is_new(&self) -> bool {
        self.has_tag(NEW_TAG)
    }

    /// Append a tag. Existing occurrences are not checked.
    pub fn tag(&mut self, tag: &str) {
        self.tags.push(tag.to_string());
    }

    /// Remove every occurrence of a tag
    pub fn untag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Record a completed download; the episode is no longer new
    pub fn mark_downloaded(&mut self, at: DateTime<Utc>) {
        self.downloaded_at = Some(at);
        self.untag(NEW_TAG);
    }
}

/// The episodes owned by one podcast, keyed by store id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Episodes {
    episodes: IndexMap<String, Episode>,
}

impl Episodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.episodes.contains_key(id)
    }

    /// Store ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.episodes.keys().map(String::as_str)
    }

    /// Add a new episode, tagged as new
    pub fn add(&mut self, new: NewEpisode) -> Result<&mut Episode, StoreError> {
        if self.episodes.contains_key(&new.id) {
            return Err(StoreError::EpisodeExists(new.id));
        }
        Ok(self.insert_new(new))
    }

    pub(crate) fn insert_new(&mut self, new: NewEpisode) -> &mut Episode {
        self.insert(Episode::from_new(new))
    }

    /// Insert an already-built episode, replacing any episode with the same id
    pub(crate) fn insert(&mut self, episode: Episode) -> &mut Episode {
        let (index, _) = self.episodes.insert_full(episode.id.clone(), episode);
        &mut self.episodes[index]
    }

    pub fn get(&self, id: &str) -> Result<&Episode, StoreError> {
        self.find(id)
            .ok_or_else(|| StoreError::EpisodeNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Episode, StoreError> {
        self.find_mut(id)
            .ok_or_else(|| StoreError::EpisodeNotFound(id.to_string()))
    }

    /// Look up an episode, returning `None` instead of failing
    pub fn find(&self, id: &str) -> Option<&Episode> {
        self.episodes.get(id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Episode> {
        self.episodes.get_mut(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<Episode, StoreError> {
        self.episodes
            .shift_remove(id)
            .ok_or_else(|| StoreError::EpisodeNotFound(id.to_string()))
    }

    /// All episodes, oldest first. Ties keep insertion order.
    pub fn list(&self) -> Vec<&Episode> {
        self.list_by(|a, b| a.created_at.cmp(&b.created_at))
    }

    /// All episodes ordered by a caller-supplied comparator (stable)
    pub fn list_by<F>(&self, compare: F) -> Vec<&Episode>
    where
        F: FnMut(&&Episode, &&Episode) -> Ordering,
    {
        let mut episodes: Vec<&Episode> = self.episodes.values().collect();
        episodes.sort_by(compare);
        episodes
    }

    /// Episodes still tagged as new, oldest first
    pub fn list_new(&self) -> Vec<&Episode> {
        self.list().into_iter().filter(|e| e.is_new()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Episode> {
        self.episodes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Episode> {
        self.episodes.values_mut()
    }
}
