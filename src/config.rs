use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PersistError;

pub const DEFAULT_STORE_DIR_NAME: &str = ".pod-store";
pub const DEFAULT_STORE_FILE_NAME: &str = "pod-store.json";
pub const DEFAULT_DOWNLOADS_DIR_NAME: &str = "Podcasts";
pub const GPG_ID_FILE_NAME: &str = ".gpg-id";

/// Where the store and downloaded episodes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_path: PathBuf,
    pub store_file_name: String,
    pub downloads_path: PathBuf,
}

impl Config {
    /// Resolve the configuration, falling back to locations under the home
    /// directory for anything not given.
    pub fn new(
        store_path: Option<PathBuf>,
        store_file_name: Option<String>,
        downloads_path: Option<PathBuf>,
    ) -> Self {
        let home = home_dir();
        Self {
            store_path: store_path.unwrap_or_else(|| home.join(DEFAULT_STORE_DIR_NAME)),
            store_file_name: store_file_name
                .unwrap_or_else(|| DEFAULT_STORE_FILE_NAME.to_string()),
            downloads_path: downloads_path
                .unwrap_or_else(|| home.join(DEFAULT_DOWNLOADS_DIR_NAME)),
        }
    }

    /// Configuration rooted at `dir`, for tests and throwaway stores
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            store_path: dir.join(DEFAULT_STORE_DIR_NAME),
            store_file_name: DEFAULT_STORE_FILE_NAME.to_string(),
            downloads_path: dir.join(DEFAULT_DOWNLOADS_DIR_NAME),
        }
    }

    pub fn store_file_path(&self) -> PathBuf {
        self.store_path.join(&self.store_file_name)
    }

    pub fn gpg_id_file_path(&self) -> PathBuf {
        self.store_path.join(GPG_ID_FILE_NAME)
    }

    /// The GPG id the store is encrypted for, if any
    pub fn gpg_id(&self) -> Result<Option<String>, PersistError> {
        let path = self.gpg_id_file_path();
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let id = contents.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::ReadFailed { path, source }),
        }
    }

    /// Directory a podcast's episodes are downloaded into
    pub fn podcast_downloads_path(&self, podcast_title: &str) -> PathBuf {
        self.downloads_path
            .join(sanitize_filename::sanitize(podcast_title))
    }
}

fn home_dir() -> PathBuf {
    dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
