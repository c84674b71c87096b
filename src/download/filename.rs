use std::path::{Path, PathBuf};

use url::Url;

use crate::model::Episode;

/// Maximum length for the title portion of a filename
const MAX_TITLE_LENGTH: usize = 100;

const DEFAULT_EXTENSION: &str = "mp3";

/// `<episode number>-<title slug>.<ext>`, e.g. `0023-hello-world-.mp3` for "Hello World!"
pub fn episode_file_name(episode: &Episode) -> String {
    format!(
        "{}-{}.{}",
        episode.episode_number,
        title_slug(&episode.title),
        audio_extension(&episode.url)
    )
}

/// Where an episode of a podcast is downloaded to
pub fn episode_download_path(podcast_downloads_dir: &Path, episode: &Episode) -> PathBuf {
    podcast_downloads_dir.join(episode_file_name(episode))
}

/// Lowercase the title and replace everything but ASCII letters and digits
/// with a dash
fn title_slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .take(MAX_TITLE_LENGTH)
        .collect()
}

/// Audio file extension from the URL path, defaulting to `mp3`
pub fn audio_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .and_then(|file_name| file_name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_lowercase())
        })
        .filter(|ext| is_valid_audio_extension(ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn is_valid_audio_extension(ext: &str) -> bool {
    matches!(
        ext,
        "mp3" | "m4a" | "mp4" | "aac" | "ogg" | "opus" | "wav" | "flac"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Episode, make_new_episode};

    fn make_episode(number: &str, title: &str, url: &str) -> Episode {
        let mut episode = Episode::from_new(make_new_episode("ep", number, 0));
        episode.title = title.to_string();
        episode.url = url.to_string();
        episode
    }

    #[test]
    fn file_name_uses_number_and_lowercase_slug() {
        let episode = make_episode("0023", "Hello, World!", "https://example.com/a.mp3");

        assert_eq!(episode_file_name(&episode), "0023-hello--world-.mp3");
    }

    #[test]
    fn slug_replaces_non_ascii() {
        assert_eq!(title_slug("Café 42"), "caf--42");
    }

    #[test]
    fn slug_is_truncated() {
        assert_eq!(title_slug(&"a".repeat(150)).len(), MAX_TITLE_LENGTH);
    }

    #[test]
    fn extension_comes_from_url_path() {
        assert_eq!(audio_extension("https://cdn.example.com/show/ep.M4A?x=1"), "m4a");
        assert_eq!(audio_extension("https://cdn.example.com/show/ep.ogg"), "ogg");
    }

    #[test]
    fn extension_defaults_to_mp3() {
        assert_eq!(audio_extension("https://example.com/stream"), "mp3");
        assert_eq!(audio_extension("https://example.com/page.html"), "mp3");
        assert_eq!(audio_extension("not a url"), "mp3");
    }

    #[test]
    fn download_path_joins_podcast_dir() {
        let episode = make_episode("0001", "Intro", "https://example.com/intro.mp3");

        assert_eq!(
            episode_download_path(Path::new("/pods/greetings"), &episode),
            PathBuf::from("/pods/greetings/0001-intro.mp3")
        );
    }
}
