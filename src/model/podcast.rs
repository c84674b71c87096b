use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::StoreError;
use crate::feed::FeedEntry;
use crate::reconcile::{RefreshSummary, refresh};

use super::episode::Episodes;

/// A podcast tracked in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Podcast {
    /// Store-wide unique key
    pub title: String,
    /// RSS feed URL
    pub feed: String,
    pub tags: Vec<String>,
    /// Number episodes from the top of the feed instead of the bottom
    pub reverse_episode_order: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub episodes: Episodes,
}

/// User-supplied data for adding a podcast
#[derive(Debug, Clone, Default)]
pub struct NewPodcast {
    pub title: String,
    pub feed: String,
    pub tags: Vec<String>,
    pub reverse_episode_order: bool,
}

impl NewPodcast {
    pub fn new(title: impl Into<String>, feed: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            feed: feed.into(),
            ..Default::default()
        }
    }
}

impl Podcast {
    /// Build a podcast with no episodes yet
    pub fn new(new: NewPodcast) -> Self {
        let now = crate::record::now();
        Self {
            title: new.title,
            feed: new.feed,
            tags: new.tags,
            reverse_episode_order: new.reverse_episode_order,
            created_at: now,
            updated_at: now,
            episodes: Episodes::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn tag(&mut self, tag: &str) {
        self.tags.push(tag.to_string());
    }

    pub fn untag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn has_new_episodes(&self) -> bool {
        self.episodes.iter().any(|e| e.is_new())
    }

    pub fn new_episode_count(&self) -> usize {
        self.episodes.iter().filter(|e| e.is_new()).count()
    }
}

/// Every podcast in the store, keyed by title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Podcasts {
    podcasts: IndexMap<String, Podcast>,
}

impl Podcasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.podcasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.podcasts.is_empty()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.podcasts.contains_key(title)
    }

    /// Add a podcast and reconcile it against its feed entries.
    ///
    /// The podcast is only inserted once reconciliation succeeded.
    pub fn add(
        &mut self,
        new: NewPodcast,
        entries: &[FeedEntry],
    ) -> Result<RefreshSummary, StoreError> {
        if self.podcasts.contains_key(&new.title) {
            return Err(StoreError::PodcastExists(new.title));
        }

        let mut podcast = Podcast::new(new);
        let summary = refresh(&mut podcast, entries)?;
        self.insert(podcast);
        Ok(summary)
    }

    /// Reconcile an existing podcast against freshly fetched feed entries
    pub fn refresh(
        &mut self,
        title: &str,
        entries: &[FeedEntry],
    ) -> Result<RefreshSummary, StoreError> {
        let podcast = self.get_mut(title)?;
        Ok(refresh(podcast, entries)?)
    }

    pub(crate) fn insert(&mut self, podcast: Podcast) {
        self.podcasts.insert(podcast.title.clone(), podcast);
    }

    pub fn get(&self, title: &str) -> Result<&Podcast, StoreError> {
        self.find(title)
            .ok_or_else(|| StoreError::PodcastNotFound(title.to_string()))
    }

    pub fn get_mut(&mut self, title: &str) -> Result<&mut Podcast, StoreError> {
        self.find_mut(title)
            .ok_or_else(|| StoreError::PodcastNotFound(title.to_string()))
    }

    /// Look up a podcast, returning `None` instead of failing
    pub fn find(&self, title: &str) -> Option<&Podcast> {
        self.podcasts.get(title)
    }

    pub fn find_mut(&mut self, title: &str) -> Option<&mut Podcast> {
        self.podcasts.get_mut(title)
    }

    /// Remove a podcast together with all of its episodes
    pub fn delete(&mut self, title: &str) -> Result<Podcast, StoreError> {
        self.podcasts
            .shift_remove(title)
            .ok_or_else(|| StoreError::PodcastNotFound(title.to_string()))
    }

    /// Re-key a podcast under a new title, keeping its position
    pub fn rename(&mut self, old_title: &str, new_title: &str) -> Result<(), StoreError> {
        if self.podcasts.contains_key(new_title) {
            return Err(StoreError::PodcastExists(new_title.to_string()));
        }

        let not_found = || StoreError::PodcastNotFound(old_title.to_string());
        let index = self.podcasts.get_index_of(old_title).ok_or_else(not_found)?;
        let (_, mut podcast) = self
            .podcasts
            .shift_remove_index(index)
            .ok_or_else(not_found)?;
        podcast.title = new_title.to_string();
        self.podcasts
            .shift_insert(index, new_title.to_string(), podcast);
        Ok(())
    }

    /// All podcasts, oldest first. Ties keep insertion order.
    pub fn list(&self) -> Vec<&Podcast> {
        self.list_by(|a, b| a.created_at.cmp(&b.created_at))
    }

    pub fn list_by<F>(&self, compare: F) -> Vec<&Podcast>
    where
        F: FnMut(&&Podcast, &&Podcast) -> Ordering,
    {
        let mut podcasts: Vec<&Podcast> = self.podcasts.values().collect();
        podcasts.sort_by(compare);
        podcasts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Podcast> {
        self.podcasts.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Podcast> {
        self.podcasts.values_mut()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feed::FeedLink;
    use chrono::{Duration, TimeZone};

    pub(crate) fn make_entry(id: &str, days_ago: i64) -> FeedEntry {
        let published = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() - Duration::days(days_ago);
        FeedEntry {
            id: format!("https://example.com/episodes/{id}"),
            title: format!("Episode {id}"),
            links: vec![FeedLink {
                href: format!("https://example.com/{id}.mp3"),
                mime_type: "audio/mpeg".to_string(),
            }],
            short_description: None,
            long_description: Some(format!("About {id}")),
            published_at: published,
            updated_at: None,
            episode_number_hint: None,
        }
    }

    pub(crate) fn make_store() -> Podcasts {
        let mut podcasts = Podcasts::new();
        podcasts
            .add(
                NewPodcast::new("farewell", "http://goodbye.world/rss"),
                &[],
            )
            .unwrap();
        podcasts
            .add(
                NewPodcast::new("greetings", "http://hello.world/rss"),
                &[make_entry("aaa", 0), make_entry("zzz", 1)],
            )
            .unwrap();
        podcasts
    }

    #[test]
    fn add_refreshes_immediately() {
        let podcasts = make_store();
        let greetings = podcasts.get("greetings").unwrap();

        assert_eq!(greetings.episodes.len(), 2);
        assert!(greetings.has_new_episodes());
        assert_eq!(greetings.new_episode_count(), 2);
    }

    #[test]
    fn add_existing_title_fails_and_leaves_store_unchanged() {
        let mut podcasts = make_store();
        let before = podcasts.clone();

        let err = podcasts
            .add(
                NewPodcast::new("greetings", "http://other.world/rss"),
                &[make_entry("bbb", 0)],
            )
            .unwrap_err();

        assert!(matches!(err, StoreError::PodcastExists(title) if title == "greetings"));
        assert_eq!(podcasts, before);
    }

    #[test]
    fn add_with_unusable_feed_does_not_insert() {
        let mut podcasts = Podcasts::new();
        let mut entry = make_entry("aaa", 0);
        entry.links.clear();

        let result = podcasts.add(NewPodcast::new("broken", "http://x/rss"), &[entry]);

        assert!(matches!(result, Err(StoreError::Reconcile(_))));
        assert!(!podcasts.contains("broken"));
    }

    #[test]
    fn get_missing_podcast_is_not_found() {
        let podcasts = make_store();
        assert!(matches!(
            podcasts.get("nope"),
            Err(StoreError::PodcastNotFound(_))
        ));
        assert!(podcasts.find("nope").is_none());
    }

    #[test]
    fn delete_cascades_to_episodes() {
        let mut podcasts = make_store();
        let removed = podcasts.delete("greetings").unwrap();

        assert_eq!(removed.episodes.len(), 2);
        assert!(!podcasts.contains("greetings"));
        assert!(matches!(
            podcasts.delete("greetings"),
            Err(StoreError::PodcastNotFound(_))
        ));
    }

    #[test]
    fn rename_rekeys_and_keeps_episodes() {
        let mut podcasts = make_store();
        podcasts.rename("greetings", "salutations").unwrap();

        assert!(!podcasts.contains("greetings"));
        let renamed = podcasts.get("salutations").unwrap();
        assert_eq!(renamed.title, "salutations");
        assert_eq!(renamed.episodes.len(), 2);
    }

    #[test]
    fn rename_keeps_position_among_equal_timestamps() {
        let mut podcasts = Podcasts::new();
        for title in ["alpha", "beta", "gamma"] {
            podcasts.add(NewPodcast::new(title, "http://feed"), &[]).unwrap();
        }
        let created = podcasts.get("alpha").unwrap().created_at;
        for podcast in podcasts.iter_mut() {
            podcast.created_at = created;
        }

        podcasts.rename("alpha", "omega").unwrap();

        let titles: Vec<_> = podcasts.list().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["omega", "beta", "gamma"]);
    }

    #[test]
    fn rename_to_taken_title_fails() {
        let mut podcasts = make_store();
        let err = podcasts.rename("greetings", "farewell").unwrap_err();
        assert!(matches!(err, StoreError::PodcastExists(_)));
        assert!(podcasts.contains("greetings"));
    }

    #[test]
    fn rename_missing_podcast_fails() {
        let mut podcasts = make_store();
        let err = podcasts.rename("nope", "still-nope").unwrap_err();
        assert!(matches!(err, StoreError::PodcastNotFound(_)));
    }

    #[test]
    fn list_orders_by_creation() {
        let podcasts = make_store();
        let titles: Vec<_> = podcasts.list().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["farewell", "greetings"]);
    }

    #[test]
    fn podcast_tags_are_append_based() {
        let mut podcasts = make_store();
        let podcast = podcasts.get_mut("farewell").unwrap();
        podcast.tag("comedy");
        podcast.tag("comedy");
        assert_eq!(podcast.tags.len(), 2);
        podcast.untag("comedy");
        assert!(podcast.tags.is_empty());
    }
}
