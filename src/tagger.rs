//! Bulk and interactive tagging of filter results.
//!
//! Marking episodes as seen or unseen is tagging with the `new` tag, so the
//! same machinery backs `tag`, `untag`, `mark` and `mark-as-new`.

use tracing::debug;

use crate::error::StoreError;
use crate::filter::{EpisodeFilter, PodcastFilter};
use crate::model::{Episode, NEW_TAG, Podcast, Podcasts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAction {
    Apply,
    Remove,
}

/// What the user decided for one item in interactive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Apply,
    Skip,
    /// Apply to this item and every remaining one without asking
    SwitchToBulk,
    /// Stop here, keeping what has been applied so far
    Cancelled,
}

/// Supplies per-item decisions in interactive mode
pub trait DecisionSource {
    /// `prompt` describes the item; `help` lists the choices.
    fn decide(&mut self, prompt: &str, help: &str) -> Decision;
}

/// Wording used in prompts and result messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verbs {
    pub action: String,
    pub performing: String,
    pub performed: String,
    /// How the tags are named to the user, e.g. `new, favorite`
    pub listing: String,
}

impl Verbs {
    fn for_action(action: TagAction, tags: &[String]) -> Self {
        let (action, performing, performed) = match action {
            TagAction::Apply => ("tag", "tagging", "tagged"),
            TagAction::Remove => ("untag", "untagging", "untagged"),
        };
        Self {
            action: action.to_string(),
            performing: performing.to_string(),
            performed: performed.to_string(),
            listing: tags.join(", "),
        }
    }

    fn marking(listing: &str) -> Self {
        Self {
            action: "mark".to_string(),
            performing: "marking".to_string(),
            performed: "marked".to_string(),
            listing: listing.to_string(),
        }
    }
}

/// Result of a tagging run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagOutcome {
    /// One line per item changed, plus mode switches
    pub messages: Vec<String>,
    pub tagged: usize,
    pub cancelled: bool,
}

/// Applies or removes a set of tags on the items a filter selects
#[derive(Debug, Clone)]
pub struct Tagger {
    tags: Vec<String>,
    action: TagAction,
    verbs: Verbs,
}

impl Tagger {
    pub fn new(tags: Vec<String>, action: TagAction) -> Self {
        let verbs = Verbs::for_action(action, &tags);
        Self {
            tags,
            action,
            verbs,
        }
    }

    /// Mark episodes as seen by removing the `new` tag
    pub fn mark_seen() -> Self {
        Self {
            tags: vec![NEW_TAG.to_string()],
            action: TagAction::Remove,
            verbs: Verbs::marking("seen"),
        }
    }

    /// Mark episodes as unseen by adding the `new` tag back
    pub fn mark_new() -> Self {
        Self {
            tags: vec![NEW_TAG.to_string()],
            action: TagAction::Apply,
            verbs: Verbs::marking(NEW_TAG),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn action(&self) -> TagAction {
        self.action
    }

    pub fn verbs(&self) -> &Verbs {
        &self.verbs
    }

    /// Narrow a podcast filter to podcasts not already in the target state
    fn widen_podcasts(&self, filter: &PodcastFilter) -> PodcastFilter {
        self.tags
            .iter()
            .fold(filter.clone(), |filter, tag| match self.action {
                TagAction::Apply => filter.untagged(tag.as_str()),
                TagAction::Remove => filter.tagged(tag.as_str()),
            })
    }

    fn widen_episodes(&self, filter: &EpisodeFilter) -> EpisodeFilter {
        self.tags
            .iter()
            .fold(filter.clone(), |filter, tag| match self.action {
                TagAction::Apply => filter.untagged(tag.as_str()),
                TagAction::Remove => filter.tagged(tag.as_str()),
            })
    }

    fn apply_tags(&self, tags: &mut Vec<String>) {
        for tag in &self.tags {
            match self.action {
                TagAction::Apply => tags.push(tag.clone()),
                TagAction::Remove => tags.retain(|t| t != tag),
            }
        }
    }

    /// Tag podcasts. `decisions` of `None` runs in bulk mode.
    pub fn tag_podcasts(
        &self,
        podcasts: &mut Podcasts,
        filter: &PodcastFilter,
        decisions: Option<&mut dyn DecisionSource>,
    ) -> Result<TagOutcome, StoreError> {
        let titles: Vec<String> = self
            .widen_podcasts(filter)
            .apply(podcasts)?
            .into_iter()
            .map(|p| p.title.clone())
            .collect();

        let help = self.podcast_help();
        let mut run = Run::new(decisions);
        for title in titles {
            let prompt = self.podcast_prompt(podcasts.get(&title)?);
            if !run.should_apply(&prompt, &help) {
                if run.outcome.cancelled {
                    break;
                }
                continue;
            }

            let podcast = podcasts.get_mut(&title)?;
            self.apply_tags(&mut podcast.tags);
            debug!(podcast = %title, tags = ?self.tags, action = ?self.action, "tagged podcast");
            let message = self.podcast_message(podcast);
            run.record(message);
        }
        Ok(run.outcome)
    }

    /// Tag episodes. `decisions` of `None` runs in bulk mode.
    pub fn tag_episodes(
        &self,
        podcasts: &mut Podcasts,
        filter: &EpisodeFilter,
        decisions: Option<&mut dyn DecisionSource>,
    ) -> Result<TagOutcome, StoreError> {
        let keys: Vec<(String, String)> = self
            .widen_episodes(filter)
            .apply(podcasts)?
            .into_iter()
            .map(|m| (m.podcast.title.clone(), m.episode.id.clone()))
            .collect();

        let help = self.episode_help();
        let mut run = Run::new(decisions);
        for (title, id) in keys {
            let prompt = self.episode_prompt(&title, podcasts.get(&title)?.episodes.get(&id)?);
            if !run.should_apply(&prompt, &help) {
                if run.outcome.cancelled {
                    break;
                }
                continue;
            }

            let episode = podcasts.get_mut(&title)?.episodes.get_mut(&id)?;
            self.apply_tags(&mut episode.tags);
            debug!(podcast = %title, episode = %id, tags = ?self.tags, action = ?self.action, "tagged episode");
            let message = self.episode_message(&title, episode);
            run.record(message);
        }
        Ok(run.outcome)
    }

    fn podcast_prompt(&self, podcast: &Podcast) -> String {
        format!(
            "{} {} as {}?",
            capitalize(&self.verbs.action),
            podcast.title,
            self.verbs.listing
        )
    }

    fn episode_prompt(&self, podcast_title: &str, episode: &Episode) -> String {
        format!(
            "{} -> [{}] {}\n{}\n\n{} as {}?",
            podcast_title,
            episode.episode_number,
            episode.title,
            episode.short_description,
            capitalize(&self.verbs.action),
            self.verbs.listing
        )
    }

    fn podcast_message(&self, podcast: &Podcast) -> String {
        format!(
            "{} as {}: {}.",
            capitalize(&self.verbs.performed),
            self.verbs.listing,
            podcast.title
        )
    }

    fn episode_message(&self, podcast_title: &str, episode: &Episode) -> String {
        format!(
            "{} as {}: {} -> [{}] {}.",
            capitalize(&self.verbs.performed),
            self.verbs.listing,
            podcast_title,
            episode.episode_number,
            episode.title
        )
    }

    pub fn podcast_help(&self) -> String {
        self.help("podcast")
    }

    pub fn episode_help(&self) -> String {
        self.help("episode")
    }

    fn help(&self, noun: &str) -> String {
        let Verbs {
            action,
            performing,
            listing,
            ..
        } = &self.verbs;
        format!(
            "{} in interactive mode. Options are:\n\n    \
             h = help (display this message)\n    \
             y = yes ({action} this {noun} as {listing})\n    \
             n = no (do not {action} this {noun} as {listing})\n    \
             b = bulk ({action} this and all following {noun}s as {listing})\n    \
             q = quit (stop {performing} {noun}s and quit)\n",
            capitalize(performing)
        )
    }
}

/// Bookkeeping for one pass over the selected items
struct Run<'a> {
    decisions: Option<&'a mut dyn DecisionSource>,
    outcome: TagOutcome,
}

impl<'a> Run<'a> {
    fn new(decisions: Option<&'a mut dyn DecisionSource>) -> Self {
        Self {
            decisions,
            outcome: TagOutcome::default(),
        }
    }

    fn should_apply(&mut self, prompt: &str, help: &str) -> bool {
        let Some(source) = self.decisions.as_deref_mut() else {
            return true;
        };

        match source.decide(prompt, help) {
            Decision::Apply => true,
            Decision::Skip => false,
            Decision::SwitchToBulk => {
                self.decisions = None;
                self.outcome
                    .messages
                    .push("Switching to 'bulk' mode.".to_string());
                true
            }
            Decision::Cancelled => {
                self.outcome.cancelled = true;
                false
            }
        }
    }

    fn record(&mut self, message: String) {
        self.outcome.messages.push(message);
        self.outcome.tagged += 1;
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
