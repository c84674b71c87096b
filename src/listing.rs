//! Text listings of podcasts and episodes for `ls`.

use console::Term;

use crate::error::StoreError;
use crate::filter::{EpisodeFilter, PodcastFilter};
use crate::model::{Episode, Podcast, Podcasts};

const FALLBACK_TERMINAL_WIDTH: usize = 80;

/// Current terminal width in columns
pub fn terminal_width() -> usize {
    Term::stdout()
        .size_checked()
        .map(|(_, columns)| usize::from(columns))
        .unwrap_or(FALLBACK_TERMINAL_WIDTH)
}

/// `title [new count] -> tags`
pub fn podcast_line(podcast: &Podcast) -> String {
    let new_episodes = podcast.new_episode_count();
    let episodes_msg = if new_episodes > 0 {
        format!(" [{new_episodes}]")
    } else {
        String::new()
    };
    format!("{}{}{}", podcast.title, episodes_msg, tags_suffix(&podcast.tags))
}

pub fn podcast_verbose(podcast: &Podcast) -> String {
    let tags_msg = if podcast.tags.is_empty() {
        String::new()
    } else {
        format!("tags: {}\n", podcast.tags.join(", "))
    };
    format!(
        "{}\n{} new episodes\n{}feed: {}\ncreated at: {}\nupdated at: {}",
        podcast.title,
        podcast.new_episode_count(),
        tags_msg,
        podcast.feed,
        podcast.created_at.to_rfc3339(),
        podcast.updated_at.to_rfc3339()
    )
}

/// `[number] title: 'short description' [X] -> tags`, with the description
/// cut at a word boundary to fit `width` columns
pub fn episode_line(episode: &Episode, width: usize) -> String {
    let downloaded_msg = if episode.downloaded_at.is_some() {
        " [X]"
    } else {
        ""
    };
    let tags_msg = tags_suffix(&episode.tags);
    let render = |description: &str| {
        format!(
            "[{}] {}: '{}'{}{}",
            episode.episode_number, episode.title, description, downloaded_msg, tags_msg
        )
    };

    let available = width.saturating_sub(render("").chars().count());
    render(&fit_description(&episode.short_description, available))
}

pub fn episode_verbose(episode: &Episode) -> String {
    let downloaded_msg = episode
        .downloaded_at
        .map(|at| format!("downloaded at: {}\n", at.to_rfc3339()))
        .unwrap_or_default();
    format!(
        "[{}] {}\nid: {}\ntags: {}\ncreated at: {}\nupdated at: {}\n{}{}",
        episode.episode_number,
        episode.title,
        episode.id,
        episode.tags.join(", "),
        episode.created_at.to_rfc3339(),
        episode.updated_at.to_rfc3339(),
        downloaded_msg,
        episode.long_description
    )
}

/// Lines for every podcast the filter selects
pub fn list_podcasts(
    podcasts: &Podcasts,
    filter: &PodcastFilter,
    verbose: bool,
) -> Result<Vec<String>, StoreError> {
    let found = filter.apply(podcasts)?;
    let entries = found.into_iter().map(|p| {
        if verbose {
            podcast_verbose(p)
        } else {
            podcast_line(p)
        }
    });
    Ok(join_entries(entries, verbose))
}

/// Lines for the selected episodes, grouped under their podcast's title
pub fn list_episodes(
    podcasts: &Podcasts,
    filter: &EpisodeFilter,
    verbose: bool,
    width: usize,
) -> Result<Vec<String>, StoreError> {
    let mut groups = Vec::new();
    for podcast in filter.podcasts(podcasts)? {
        let episodes = filter.podcast_episodes(podcast);
        if episodes.is_empty() {
            continue;
        }

        let entries = episodes.into_iter().map(|e| {
            if verbose {
                episode_verbose(e)
            } else {
                episode_line(e, width)
            }
        });
        let mut group = vec![podcast.title.clone()];
        group.extend(join_entries(entries, verbose));
        groups.push(group);
    }

    if groups.is_empty() && !filter.allows_empty() {
        return Err(StoreError::NoEpisodesFound);
    }
    Ok(groups.join(&String::new()))
}

/// Verbose entries are separated by blank lines
fn join_entries(entries: impl Iterator<Item = String>, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in entries {
        if verbose && !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(entry);
    }
    lines
}

fn tags_suffix(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" -> {}", tags.join(", "))
    }
}

/// Take whole words while they fit in `available` characters. The first word
/// is always kept. Trailing punctuation is dropped.
fn fit_description(description: &str, available: usize) -> String {
    let mut words = description.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };

    let mut fitted = first.to_string();
    for word in words {
        if fitted.chars().count() + 1 + word.chars().count() > available {
            break;
        }
        fitted.push(' ');
        fitted.push_str(word);
    }
    fitted
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_string()
}
