//! Declarative podcast and episode queries.
//!
//! A filter is plain data: a title scope, tag presence/absence lists, typed
//! attribute matches and (for episodes) an episode-number constraint. The
//! `key=value` strings users type are split into attribute matches and tag
//! checks up front by [`Constraint::parse`].

use std::fmt::Debug;
use std::str::FromStr;

use crate::error::StoreError;
use crate::model::{Episode, Podcast, Podcasts};

/// An attribute of a store item that can be matched exactly
pub trait Field: Copy + Debug {
    type Item;

    fn from_name(name: &str) -> Option<Self>;

    fn value(self, item: &Self::Item) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodcastField {
    Title,
    Feed,
}

impl Field for PodcastField {
    type Item = Podcast;

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "feed" => Some(Self::Feed),
            _ => None,
        }
    }

    fn value(self, podcast: &Podcast) -> &str {
        match self {
            Self::Title => &podcast.title,
            Self::Feed => &podcast.feed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeField {
    Id,
    EpisodeNumber,
    Title,
    ShortDescription,
    LongDescription,
    Url,
}

impl Field for EpisodeField {
    type Item = Episode;

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "episode_number" => Some(Self::EpisodeNumber),
            "title" => Some(Self::Title),
            "short_description" => Some(Self::ShortDescription),
            "long_description" => Some(Self::LongDescription),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    fn value(self, episode: &Episode) -> &str {
        match self {
            Self::Id => &episode.id,
            Self::EpisodeNumber => &episode.episode_number,
            Self::Title => &episode.title,
            Self::ShortDescription => &episode.short_description,
            Self::LongDescription => &episode.long_description,
            Self::Url => &episode.url,
        }
    }
}

/// One `key=value` filter term, resolved against a field set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint<F> {
    Attribute { field: F, value: String },
    Tagged(String),
    Untagged(String),
}

impl<F: Field> Constraint<F> {
    /// Resolve `key=value`.
    ///
    /// Known fields become attribute matches. Any other key is read as a tag,
    /// which requires the value to be `true` (present) or `false` (absent).
    pub fn parse(term: &str) -> Result<Self, StoreError> {
        let (key, value) = term
            .split_once('=')
            .ok_or_else(|| StoreError::Validation(format!("expected key=value, got {term:?}")))?;
        let (key, value) = (key.trim(), value.trim());

        if let Some(field) = F::from_name(key) {
            return Ok(Self::Attribute {
                field,
                value: value.to_string(),
            });
        }

        match value {
            "true" => Ok(Self::Tagged(key.to_string())),
            "false" => Ok(Self::Untagged(key.to_string())),
            _ => Err(StoreError::Validation(format!(
                "{key:?} is neither a field nor a tag check (use {key}=true or {key}=false)"
            ))),
        }
    }
}

/// Tag and attribute checks shared by podcast and episode filters
#[derive(Debug, Clone)]
struct Criteria<F> {
    tagged: Vec<String>,
    untagged: Vec<String>,
    attributes: Vec<(F, String)>,
}

impl<F> Default for Criteria<F> {
    fn default() -> Self {
        Self {
            tagged: Vec::new(),
            untagged: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

impl<F: Field> Criteria<F> {
    fn add(&mut self, constraint: Constraint<F>) {
        match constraint {
            Constraint::Attribute { field, value } => self.attributes.push((field, value)),
            Constraint::Tagged(tag) => self.tagged.push(tag),
            Constraint::Untagged(tag) => self.untagged.push(tag),
        }
    }

    fn matches(&self, item: &F::Item, tags: &[String]) -> bool {
        let has = |tag: &String| tags.contains(tag);
        self.tagged.iter().all(has)
            && !self.untagged.iter().any(has)
            && self
                .attributes
                .iter()
                .all(|(field, value)| field.value(item) == value)
    }
}

/// Select podcasts
#[derive(Debug, Clone, Default)]
pub struct PodcastFilter {
    new_episodes: bool,
    title: Option<String>,
    criteria: Criteria<PodcastField>,
    allow_empty: bool,
}

impl PodcastFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only podcasts with unseen episodes. Ignored when a title is given.
    pub fn new_episodes(mut self, new_episodes: bool) -> Self {
        self.new_episodes = new_episodes;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title_opt(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.criteria.tagged.push(tag.into());
        self
    }

    pub fn untagged(mut self, tag: impl Into<String>) -> Self {
        self.criteria.untagged.push(tag.into());
        self
    }

    pub fn attribute(mut self, field: PodcastField, value: impl Into<String>) -> Self {
        self.criteria.attributes.push((field, value.into()));
        self
    }

    pub fn constraint(mut self, constraint: Constraint<PodcastField>) -> Self {
        self.criteria.add(constraint);
        self
    }

    /// Return an empty list instead of `NoPodcastsFound`
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn matches(&self, podcast: &Podcast) -> bool {
        let require_new = self.new_episodes && self.title.is_none();
        matches_podcast(podcast, self.title.as_deref(), &self.criteria, require_new)
    }

    pub fn apply<'a>(&self, podcasts: &'a Podcasts) -> Result<Vec<&'a Podcast>, StoreError> {
        let found: Vec<&Podcast> = podcasts
            .list()
            .into_iter()
            .filter(|p| self.matches(p))
            .collect();

        if found.is_empty() && !self.allow_empty {
            return Err(StoreError::NoPodcastsFound);
        }
        Ok(found)
    }
}

fn matches_podcast(
    podcast: &Podcast,
    title: Option<&str>,
    criteria: &Criteria<PodcastField>,
    require_new: bool,
) -> bool {
    title.is_none_or(|t| podcast.title == t)
        && criteria.matches(podcast, &podcast.tags)
        && (!require_new || podcast.has_new_episodes())
}

/// Episode-number constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeNumberFilter {
    Exact(u32),
    /// Inclusive range, either bound optional
    Range { start: Option<u32>, end: Option<u32> },
}

impl EpisodeNumberFilter {
    pub fn matches(&self, episode: &Episode) -> bool {
        let Some(number) = episode.number() else {
            return false;
        };
        match *self {
            Self::Exact(n) => number == n,
            Self::Range { start, end } => {
                start.is_none_or(|s| number >= s) && end.is_none_or(|e| number <= e)
            }
        }
    }
}

impl FromStr for EpisodeNumberFilter {
    type Err = StoreError;

    /// Accepts `12`, `3-7`, `3-` and `-7`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::Validation(format!("invalid episode number or range: {s:?}"));
        let bound = |part: &str| -> Result<Option<u32>, StoreError> {
            let part = part.trim();
            if part.is_empty() {
                Ok(None)
            } else {
                part.parse().map(Some).map_err(|_| invalid())
            }
        };

        match s.split_once('-') {
            None => s.trim().parse().map(Self::Exact).map_err(|_| invalid()),
            Some((start, end)) => {
                let (start, end) = (bound(start)?, bound(end)?);
                if start.is_none() && end.is_none() {
                    return Err(invalid());
                }
                Ok(Self::Range { start, end })
            }
        }
    }
}

/// An episode paired with the podcast that owns it
#[derive(Debug, Clone, Copy)]
pub struct EpisodeMatch<'a> {
    pub podcast: &'a Podcast,
    pub episode: &'a Episode,
}

/// Select episodes, possibly across podcasts
#[derive(Debug, Clone, Default)]
pub struct EpisodeFilter {
    new_episodes: bool,
    podcast_title: Option<String>,
    podcast_criteria: Criteria<PodcastField>,
    criteria: Criteria<EpisodeField>,
    episode_number: Option<EpisodeNumberFilter>,
    newest_first: bool,
    allow_empty: bool,
}

impl EpisodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only episodes still tagged as new
    pub fn new_episodes(mut self, new_episodes: bool) -> Self {
        self.new_episodes = new_episodes;
        self
    }

    pub fn podcast(mut self, title: impl Into<String>) -> Self {
        self.podcast_title = Some(title.into());
        self
    }

    pub fn podcast_opt(mut self, title: Option<String>) -> Self {
        self.podcast_title = title;
        self
    }

    /// Only episodes of podcasts carrying this tag
    pub fn podcast_tagged(mut self, tag: impl Into<String>) -> Self {
        self.podcast_criteria.tagged.push(tag.into());
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.criteria.tagged.push(tag.into());
        self
    }

    pub fn untagged(mut self, tag: impl Into<String>) -> Self {
        self.criteria.untagged.push(tag.into());
        self
    }

    pub fn attribute(mut self, field: EpisodeField, value: impl Into<String>) -> Self {
        self.criteria.attributes.push((field, value.into()));
        self
    }

    pub fn constraint(mut self, constraint: Constraint<EpisodeField>) -> Self {
        self.criteria.add(constraint);
        self
    }

    pub fn episode_number(mut self, number: EpisodeNumberFilter) -> Self {
        self.episode_number = Some(number);
        self
    }

    pub fn episode_number_opt(mut self, number: Option<EpisodeNumberFilter>) -> Self {
        self.episode_number = number;
        self
    }

    /// Order each podcast's episodes newest first
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Return an empty list instead of `NoEpisodesFound`
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn allows_empty(&self) -> bool {
        self.allow_empty
    }

    fn is_single_episode(&self) -> bool {
        matches!(self.episode_number, Some(EpisodeNumberFilter::Exact(_)))
    }

    fn require_new(&self) -> bool {
        self.new_episodes && !self.is_single_episode()
    }

    /// Resolve the podcasts whose episodes will be searched
    pub fn podcasts<'a>(&self, podcasts: &'a Podcasts) -> Result<Vec<&'a Podcast>, StoreError> {
        if self.episode_number.is_some() && self.podcast_title.is_none() {
            return Err(StoreError::AmbiguousEpisode);
        }

        let found: Vec<&Podcast> = podcasts
            .list()
            .into_iter()
            .filter(|p| {
                matches_podcast(
                    p,
                    self.podcast_title.as_deref(),
                    &self.podcast_criteria,
                    self.require_new(),
                )
            })
            .collect();

        if found.is_empty() && !self.allow_empty {
            return Err(StoreError::NoPodcastsFound);
        }
        Ok(found)
    }

    pub fn matches(&self, episode: &Episode) -> bool {
        self.criteria.matches(episode, &episode.tags)
            && (!self.require_new() || episode.is_new())
            && self
                .episode_number
                .is_none_or(|number| number.matches(episode))
    }

    /// The matching episodes of a single podcast
    pub fn podcast_episodes<'a>(&self, podcast: &'a Podcast) -> Vec<&'a Episode> {
        let episodes = if self.newest_first {
            podcast
                .episodes
                .list_by(|a, b| b.created_at.cmp(&a.created_at))
        } else {
            podcast.episodes.list()
        };
        episodes.into_iter().filter(|e| self.matches(e)).collect()
    }

    pub fn apply<'a>(&self, podcasts: &'a Podcasts) -> Result<Vec<EpisodeMatch<'a>>, StoreError> {
        let mut found = Vec::new();
        for podcast in self.podcasts(podcasts)? {
            found.extend(
                self.podcast_episodes(podcast)
                    .into_iter()
                    .map(|episode| EpisodeMatch { podcast, episode }),
            );
        }

        if found.is_empty() && !self.allow_empty {
            return Err(StoreError::NoEpisodesFound);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewPodcast, make_entry, make_store};

    fn titles(podcasts: &[&Podcast]) -> Vec<String> {
        podcasts.iter().map(|p| p.title.clone()).collect()
    }

    fn episode_ids(matches: &[EpisodeMatch<'_>]) -> Vec<String> {
        matches.iter().map(|m| m.episode.id.clone()).collect()
    }

    #[test]
    fn title_scope_returns_podcast_regardless_of_new_episodes() {
        let mut podcasts = make_store();
        for episode in podcasts.get_mut("greetings").unwrap().episodes.iter_mut() {
            episode.untag("new");
        }

        let found = PodcastFilter::new()
            .title("greetings")
            .new_episodes(true)
            .apply(&podcasts)
            .unwrap();
        assert_eq!(titles(&found), vec!["greetings"]);
    }

    #[test]
    fn new_episodes_flag_selects_podcasts_with_unseen_episodes() {
        let podcasts = make_store();
        let found = PodcastFilter::new()
            .new_episodes(true)
            .apply(&podcasts)
            .unwrap();
        assert_eq!(titles(&found), vec!["greetings"]);
    }

    #[test]
    fn empty_result_fails_unless_allowed() {
        let podcasts = make_store();
        let filter = PodcastFilter::new().tagged("nonexistent");

        assert!(matches!(
            filter.apply(&podcasts),
            Err(StoreError::NoPodcastsFound)
        ));
        assert!(filter.allow_empty().apply(&podcasts).unwrap().is_empty());
    }

    #[test]
    fn tag_presence_and_absence_partition_podcasts() {
        let mut podcasts = make_store();
        podcasts.get_mut("greetings").unwrap().tag("morning");
        podcasts
            .add(NewPodcast::new("third", "http://third/rss"), &[])
            .unwrap();

        let with = PodcastFilter::new()
            .tagged("morning")
            .allow_empty()
            .apply(&podcasts)
            .unwrap();
        let without = PodcastFilter::new()
            .untagged("morning")
            .allow_empty()
            .apply(&podcasts)
            .unwrap();

        let mut union = titles(&with);
        union.extend(titles(&without));
        union.sort();
        let mut all = titles(&podcasts.list());
        all.sort();
        assert_eq!(union, all);
        assert!(titles(&with).iter().all(|t| !titles(&without).contains(t)));
    }

    #[test]
    fn podcast_attribute_matches_exactly() {
        let podcasts = make_store();
        let found = PodcastFilter::new()
            .attribute(PodcastField::Feed, "http://goodbye.world/rss")
            .apply(&podcasts)
            .unwrap();
        assert_eq!(titles(&found), vec!["farewell"]);
    }

    #[test]
    fn episode_number_without_podcast_is_ambiguous() {
        let podcasts = make_store();
        let result = EpisodeFilter::new()
            .episode_number(EpisodeNumberFilter::Exact(1))
            .apply(&podcasts);
        assert!(matches!(result, Err(StoreError::AmbiguousEpisode)));
    }

    #[test]
    fn episode_number_with_podcast_finds_single_episode() {
        let mut podcasts = make_store();
        podcasts
            .get_mut("greetings")
            .unwrap()
            .episodes
            .get_mut("zzz")
            .unwrap()
            .untag("new");

        let found = EpisodeFilter::new()
            .podcast("greetings")
            .new_episodes(true)
            .episode_number(EpisodeNumberFilter::Exact(1))
            .apply(&podcasts)
            .unwrap();
        assert_eq!(episode_ids(&found), vec!["zzz"]);
        assert_eq!(found[0].podcast.title, "greetings");
    }

    #[test]
    fn episode_range_is_inclusive() {
        let mut podcasts = Podcasts::new();
        let entries: Vec<_> = (0..5).map(|i| make_entry(&format!("ep{i}"), i)).collect();
        podcasts
            .add(NewPodcast::new("five", "http://five/rss"), &entries)
            .unwrap();

        let found = EpisodeFilter::new()
            .podcast("five")
            .episode_number("2-4".parse().unwrap())
            .apply(&podcasts)
            .unwrap();
        let mut numbers: Vec<_> = found.iter().map(|m| m.episode.number().unwrap()).collect();
        numbers.sort();
        assert_eq!(numbers, vec![2, 3, 4]);

        let open_ended = EpisodeFilter::new()
            .podcast("five")
            .episode_number("4-".parse().unwrap())
            .apply(&podcasts)
            .unwrap();
        assert_eq!(open_ended.len(), 2);
    }

    #[test]
    fn new_episode_filter_skips_seen_episodes() {
        let mut podcasts = make_store();
        podcasts
            .get_mut("greetings")
            .unwrap()
            .episodes
            .get_mut("aaa")
            .unwrap()
            .untag("new");

        let found = EpisodeFilter::new()
            .new_episodes(true)
            .apply(&podcasts)
            .unwrap();
        assert_eq!(episode_ids(&found), vec!["zzz"]);
    }

    #[test]
    fn episode_tag_and_attribute_filters() {
        let mut podcasts = make_store();
        podcasts
            .get_mut("greetings")
            .unwrap()
            .episodes
            .get_mut("aaa")
            .unwrap()
            .tag("favorite");

        let tagged = EpisodeFilter::new()
            .constraint(Constraint::parse("favorite=true").unwrap())
            .apply(&podcasts)
            .unwrap();
        assert_eq!(episode_ids(&tagged), vec!["aaa"]);

        let by_title = EpisodeFilter::new()
            .constraint(Constraint::parse("title=Episode zzz").unwrap())
            .apply(&podcasts)
            .unwrap();
        assert_eq!(episode_ids(&by_title), vec!["zzz"]);
    }

    #[test]
    fn episodes_come_oldest_first_unless_newest_first() {
        let podcasts = make_store();
        let oldest_first = EpisodeFilter::new().apply(&podcasts).unwrap();
        assert_eq!(episode_ids(&oldest_first), vec!["zzz", "aaa"]);

        let newest_first = EpisodeFilter::new().newest_first().apply(&podcasts).unwrap();
        assert_eq!(episode_ids(&newest_first), vec!["aaa", "zzz"]);
    }

    #[test]
    fn empty_episode_result_fails_unless_allowed() {
        let podcasts = make_store();
        let filter = EpisodeFilter::new().podcast("farewell");

        assert!(matches!(
            filter.apply(&podcasts),
            Err(StoreError::NoEpisodesFound)
        ));
        assert!(filter.allow_empty().apply(&podcasts).unwrap().is_empty());
    }

    #[test]
    fn constraint_parse_resolves_fields_and_tags() {
        assert_eq!(
            Constraint::<EpisodeField>::parse("id=aaa").unwrap(),
            Constraint::Attribute {
                field: EpisodeField::Id,
                value: "aaa".to_string()
            }
        );
        assert_eq!(
            Constraint::<PodcastField>::parse("comedy=false").unwrap(),
            Constraint::Untagged("comedy".to_string())
        );
    }

    #[test]
    fn constraint_parse_rejects_unknown_fields() {
        assert!(matches!(
            Constraint::<PodcastField>::parse("color=blue"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            Constraint::<PodcastField>::parse("no-equals-sign"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn episode_number_filter_parsing() {
        assert_eq!(
            "12".parse::<EpisodeNumberFilter>().unwrap(),
            EpisodeNumberFilter::Exact(12)
        );
        assert_eq!(
            "-7".parse::<EpisodeNumberFilter>().unwrap(),
            EpisodeNumberFilter::Range {
                start: None,
                end: Some(7)
            }
        );
        assert!("-".parse::<EpisodeNumberFilter>().is_err());
        assert!("x-3".parse::<EpisodeNumberFilter>().is_err());
    }
}
