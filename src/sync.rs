//! Refreshing podcasts from their feeds and downloading episodes.
//!
//! Both walk their targets one at a time. A failure for one podcast or
//! episode is recorded and the rest still run.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Config;
use crate::download::{DownloadContext, download_episode, episode_download_path};
use crate::error::StoreError;
use crate::feed::fetch_feed;
use crate::http::HttpClient;
use crate::model::Podcasts;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::reconcile::RefreshSummary;
use crate::record;

/// Result of refreshing a set of podcasts
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub refreshed: Vec<(String, RefreshSummary)>,
    /// Podcast title and error message
    pub failed: Vec<(String, String)>,
}

/// Result of a download run
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Files written, in download order
    pub downloaded: Vec<PathBuf>,
    /// Episode title and error message
    pub failed: Vec<(String, String)>,
}

/// An episode to download, by podcast title and episode id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub podcast_title: String,
    pub episode_id: String,
}

/// Fetch each podcast's feed and reconcile its episodes.
///
/// Unknown titles fail up front. Fetch and reconcile failures are collected
/// per podcast and leave that podcast unchanged.
pub async fn refresh_podcasts<C: HttpClient + ?Sized>(
    client: &C,
    podcasts: &mut Podcasts,
    titles: &[String],
    reporter: &SharedProgressReporter,
) -> Result<RefreshReport, StoreError> {
    for title in titles {
        podcasts.get(title)?;
    }

    let mut report = RefreshReport::default();
    for (index, title) in titles.iter().enumerate() {
        let feed_url = podcasts.get(title)?.feed.clone();
        reporter.report(ProgressEvent::RefreshStarting {
            podcast_title: title.clone(),
            feed: feed_url.clone(),
            podcast_index: index,
            total_podcasts: titles.len(),
        });

        let result = match fetch_feed(client, &feed_url).await {
            Ok(feed) => podcasts
                .refresh(title, &feed.entries)
                .map_err(|e| e.to_string()),
            Err(err) => Err(err.to_string()),
        };

        match result {
            Ok(summary) => {
                reporter.report(ProgressEvent::RefreshCompleted {
                    podcast_title: title.clone(),
                    added: summary.added,
                    updated: summary.updated,
                    removed: summary.removed,
                });
                report.refreshed.push((title.clone(), summary));
            }
            Err(error) => {
                warn!(podcast = %title, %error, "refresh failed");
                reporter.report(ProgressEvent::RefreshFailed {
                    podcast_title: title.clone(),
                    error: error.clone(),
                });
                report.failed.push((title.clone(), error));
            }
        }
    }

    info!(
        refreshed = report.refreshed.len(),
        failed = report.failed.len(),
        "refresh finished"
    );
    Ok(report)
}

/// Download episodes into each podcast's downloads directory and mark them
/// downloaded.
pub async fn download_episodes<C: HttpClient + ?Sized>(
    client: &C,
    podcasts: &mut Podcasts,
    targets: &[DownloadTarget],
    config: &Config,
    reporter: &SharedProgressReporter,
) -> Result<DownloadReport, StoreError> {
    let mut report = DownloadReport::default();

    for (index, target) in targets.iter().enumerate() {
        let episode = podcasts
            .get(&target.podcast_title)?
            .episodes
            .get(&target.episode_id)?;
        let dir = config.podcast_downloads_path(&target.podcast_title);
        let path = episode_download_path(&dir, episode);
        let url = episode.url.clone();
        let context = DownloadContext {
            podcast_title: target.podcast_title.clone(),
            episode_title: episode.title.clone(),
            episode_index: index,
            total_to_download: targets.len(),
        };

        if let Err(source) = fs::create_dir_all(&dir) {
            let error = StoreError::CreateDirectoryFailed { path: dir, source }.to_string();
            reporter.report(ProgressEvent::DownloadFailed {
                episode_title: context.episode_title.clone(),
                error: error.clone(),
            });
            report.failed.push((context.episode_title, error));
            continue;
        }

        match download_episode(client, &url, &path, &context, reporter).await {
            Ok(_) => {
                podcasts
                    .get_mut(&target.podcast_title)?
                    .episodes
                    .get_mut(&target.episode_id)?
                    .mark_downloaded(record::now());
                report.downloaded.push(path);
            }
            Err(err) => {
                warn!(episode = %context.episode_title, error = %err, "download failed");
                report.failed.push((context.episode_title, err.to_string()));
            }
        }
    }

    reporter.report(ProgressEvent::DownloadsFinished {
        downloaded_count: report.downloaded.len(),
        failed_count: report.failed.len(),
    });
    Ok(report)
}
