use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::StoreFileHandler;
use crate::error::PersistError;
use crate::record::StoreRecord;

/// Store file kept as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct PlainFileHandler {
    path: PathBuf,
}

impl PlainFileHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Build a handler and write an empty store to `path`
    pub fn create_with_file(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let handler = Self::new(path);
        handler.write(&StoreRecord::default())?;
        Ok(handler)
    }
}

impl StoreFileHandler for PlainFileHandler {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreRecord, PersistError> {
        let contents = fs::read(&self.path).map_err(|source| PersistError::ReadFailed {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_slice(&contents).map_err(|source| PersistError::JsonParseFailed {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, record: &StoreRecord) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json).map_err(|source| PersistError::WriteFailed {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), podcasts = record.podcasts.len(), "wrote store file");
        Ok(())
    }

    fn is_encrypted(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::make_store;
    use tempfile::TempDir;

    #[test]
    fn create_with_file_writes_empty_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pod-store.json");

        PlainFileHandler::create_with_file(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn write_then_read_returns_same_record() {
        let dir = TempDir::new().unwrap();
        let handler = PlainFileHandler::new(dir.path().join("pod-store.json"));
        let record = StoreRecord::from_podcasts(&make_store());

        handler.write(&record).unwrap();

        assert_eq!(handler.read().unwrap(), record);
    }

    #[test]
    fn read_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let handler = PlainFileHandler::new(dir.path().join("missing.json"));

        assert!(matches!(
            handler.read(),
            Err(PersistError::ReadFailed { .. })
        ));
    }

    #[test]
    fn read_invalid_json_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pod-store.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            PlainFileHandler::new(&path).read(),
            Err(PersistError::JsonParseFailed { .. })
        ));
    }
}
