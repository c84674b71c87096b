pub mod config;
pub mod download;
pub mod error;
pub mod feed;
pub mod filter;
pub mod http;
pub mod listing;
pub mod model;
pub mod persist;
pub mod progress;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod sync;
pub mod tagger;
pub mod vcs;

// Re-export main types for convenience
pub use config::Config;
pub use error::{DownloadError, FeedError, PersistError, ReconcileError, StoreError, VcsError};
pub use filter::{
    Constraint, EpisodeField, EpisodeFilter, EpisodeMatch, EpisodeNumberFilter, PodcastField,
    PodcastFilter,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use model::{Episode, Episodes, NEW_TAG, NewEpisode, NewPodcast, Podcast, Podcasts};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use reconcile::RefreshSummary;
pub use store::{InitOptions, Store};
pub use sync::{DownloadReport, DownloadTarget, RefreshReport, download_episodes, refresh_podcasts};
pub use tagger::{Decision, DecisionSource, TagAction, TagOutcome, Tagger};
pub use vcs::{GitCli, VersionControl};
