use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::DownloadError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Extension for in-flight downloads
pub const PARTIAL_EXTENSION: &str = "partial";

/// What is being downloaded, for progress reporting
#[derive(Debug, Clone)]
pub struct DownloadContext {
    pub podcast_title: String,
    pub episode_title: String,
    /// Index of this episode in the download queue
    pub episode_index: usize,
    pub total_to_download: usize,
}

/// Stream `url` to `output_path`.
///
/// The body is written to `<output_path>.partial` and renamed into place once
/// complete, so an interrupted download never leaves a truncated audio file
/// under the final name. Returns the number of bytes downloaded.
pub async fn download_episode<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    output_path: &Path,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let partial_path = partial_path(output_path);

    match stream_to_file(client, url, &partial_path, context, reporter).await {
        Ok(bytes_downloaded) => {
            reporter.report(ProgressEvent::Finalizing {
                episode_title: context.episode_title.clone(),
            });
            fs::rename(&partial_path, output_path)
                .await
                .map_err(|e| DownloadError::FileWriteFailed {
                    path: output_path.to_path_buf(),
                    source: e,
                })?;

            reporter.report(ProgressEvent::DownloadCompleted {
                episode_title: context.episode_title.clone(),
                bytes_downloaded,
            });
            debug!(url, path = %output_path.display(), bytes_downloaded, "downloaded episode");
            Ok(bytes_downloaded)
        }
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(&partial_path).await
                && remove_err.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %partial_path.display(), error = %remove_err, "failed to remove partial download");
            }
            reporter.report(ProgressEvent::DownloadFailed {
                episode_title: context.episode_title.clone(),
                error: err.to_string(),
            });
            Err(err)
        }
    }
}

async fn stream_to_file<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    path: &Path,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let response = client
        .get(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !response.is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        podcast_title: context.podcast_title.clone(),
        episode_title: context.episode_title.clone(),
        episode_index: context.episode_index,
        total_to_download: context.total_to_download,
        content_length: response.content_length,
    });

    let mut file = File::create(path)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            episode_title: context.episode_title.clone(),
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(bytes_downloaded)
}

fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_EXTENSION);
    PathBuf::from(name)
}
