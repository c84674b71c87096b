use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching or parsing RSS feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} fetching feed from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read feed file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse RSS feed: {0}")]
    ParseFailed(#[from] rss::Error),
}

/// Errors raised while turning feed entries into episodes
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Feed entry '{title}' has no audio link")]
    MissingAudioLink { title: String },

    #[error("Feed entry '{title}' has an empty id")]
    EmptyId { title: String },
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors from the store file handlers and the store lock
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to read store file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse store JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize store: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),

    #[error("Encryption tool failed: {0}")]
    EncryptionTool(String),

    #[error("Store is locked by another process: {0}")]
    StoreLocked(PathBuf),

    #[error("Failed to lock store {path}: {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the version-control collaborator
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to run git {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// Top-level errors for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Podcast not found: {0}")]
    PodcastNotFound(String),

    #[error("Episode not found: {0}")]
    EpisodeNotFound(String),

    #[error("Podcast with title already exists: {0}")]
    PodcastExists(String),

    #[error("Episode with id already exists: {0}")]
    EpisodeExists(String),

    #[error("Episode numbers are only unique within a podcast; specify a podcast")]
    AmbiguousEpisode,

    #[error("No podcasts found")]
    NoPodcastsFound,

    #[error("No episodes found")]
    NoEpisodesFound,

    #[error("Invalid filter: {0}")]
    Validation(String),

    #[error("Store already initialized: {0}")]
    StoreExists(PathBuf),

    #[error("Store has not been set up at {0}; run `podstore init` first")]
    StoreNotFound(PathBuf),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Version control error: {0}")]
    Vcs(#[from] VcsError),
}
