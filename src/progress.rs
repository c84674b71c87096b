use std::sync::Arc;

/// Events emitted while refreshing feeds and downloading episodes
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A podcast's feed is being fetched
    RefreshStarting {
        podcast_title: String,
        feed: String,
        /// Position of this podcast among those being refreshed
        podcast_index: usize,
        total_podcasts: usize,
    },

    /// A podcast was reconciled against its feed
    RefreshCompleted {
        podcast_title: String,
        added: usize,
        updated: usize,
        removed: usize,
    },

    RefreshFailed {
        podcast_title: String,
        error: String,
    },

    /// A download is starting
    DownloadStarting {
        podcast_title: String,
        episode_title: String,
        /// Index of this episode in the download queue
        episode_index: usize,
        total_to_download: usize,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    DownloadProgress {
        episode_title: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// Download is being finalized (renamed from .partial)
    Finalizing { episode_title: String },

    DownloadCompleted {
        episode_title: String,
        bytes_downloaded: u64,
    },

    DownloadFailed {
        episode_title: String,
        error: String,
    },

    /// Every queued download has been attempted
    DownloadsFinished {
        downloaded_count: usize,
        failed_count: usize,
    },
}

/// Receives progress events.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// Ignores every event. Used by tests and quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every event for later assertions
    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        pub(crate) events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn noop_reporter_accepts_events() {
        let reporter = NoopReporter::shared();

        reporter.report(ProgressEvent::RefreshFailed {
            podcast_title: "greetings".to_string(),
            error: "timeout".to_string(),
        });
        reporter.report(ProgressEvent::DownloadsFinished {
            downloaded_count: 1,
            failed_count: 0,
        });
    }

    #[test]
    fn recording_reporter_keeps_order() {
        let reporter = RecordingReporter::default();
        reporter.report(ProgressEvent::Finalizing {
            episode_title: "one".to_string(),
        });
        reporter.report(ProgressEvent::DownloadCompleted {
            episode_title: "one".to_string(),
            bytes_downloaded: 3,
        });

        let events = reporter.events.lock().unwrap();
        assert!(matches!(events[0], ProgressEvent::Finalizing { .. }));
        assert!(matches!(
            events[1],
            ProgressEvent::DownloadCompleted {
                bytes_downloaded: 3,
                ..
            }
        ));
    }
}
