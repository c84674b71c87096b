use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs4::FileExt;
use tracing::debug;

use crate::error::PersistError;

pub const LOCK_FILE_NAME: &str = ".podstore.lock";

/// Exclusive advisory lock on the store directory.
///
/// The OS releases the lock when the file is closed, including when the
/// holding process dies, so there is nothing stale to clean up.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    _file: File,
}

impl StoreLock {
    pub fn acquire(store_dir: &Path) -> Result<Self, PersistError> {
        let path = store_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| PersistError::LockFailed {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "acquired store lock");
                Ok(Self { path, _file: file })
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                Err(PersistError::StoreLocked(store_dir.to_path_buf()))
            }
            #[cfg(windows)]
            Err(err) if matches!(err.raw_os_error(), Some(32 | 33)) => {
                Err(PersistError::StoreLocked(store_dir.to_path_buf()))
            }
            Err(source) => Err(PersistError::LockFailed { path, source }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_reports_locked_store() {
        let dir = TempDir::new().unwrap();
        let lock = StoreLock::acquire(dir.path()).unwrap();

        let err = StoreLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, PersistError::StoreLocked(path) if path == dir.path()));
        assert!(lock.path().ends_with(LOCK_FILE_NAME));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = TempDir::new().unwrap();
        drop(StoreLock::acquire(dir.path()).unwrap());

        assert!(StoreLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn missing_directory_is_a_lock_failure() {
        let dir = TempDir::new().unwrap();
        let err = StoreLock::acquire(&dir.path().join("missing")).unwrap_err();

        assert!(matches!(err, PersistError::LockFailed { .. }));
    }
}
