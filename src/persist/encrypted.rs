use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Encryptor, StoreFileHandler};
use crate::error::PersistError;
use crate::record::StoreRecord;

/// Store file encrypted at rest for a single recipient.
///
/// A failed write leaves the previous ciphertext in place.
#[derive(Debug, Clone)]
pub struct EncryptedFileHandler<E> {
    path: PathBuf,
    recipient: String,
    encryptor: E,
}

impl<E: Encryptor> EncryptedFileHandler<E> {
    pub fn new(path: impl Into<PathBuf>, recipient: impl Into<String>, encryptor: E) -> Self {
        Self {
            path: path.into(),
            recipient: recipient.into(),
            encryptor,
        }
    }

    /// Build a handler and write an empty, encrypted store to `path`
    pub fn create_with_file(
        path: impl Into<PathBuf>,
        recipient: impl Into<String>,
        encryptor: E,
    ) -> Result<Self, PersistError> {
        let handler = Self::new(path, recipient, encryptor);
        handler.write(&StoreRecord::default())?;
        Ok(handler)
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    fn write_failed(&self, source: std::io::Error) -> PersistError {
        PersistError::WriteFailed {
            path: self.path.clone(),
            source,
        }
    }

    /// Current ciphertext, `None` when the file does not exist yet
    fn read_existing(&self) -> Result<Option<Vec<u8>>, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::ReadFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Stage the plaintext next to the target and encrypt it into place.
    /// The staged file is removed whether or not encryption succeeds.
    fn encrypt_into_place(&self, plaintext: &[u8]) -> Result<(), PersistError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut staged = tempfile::Builder::new()
            .prefix(".pod-store-")
            .suffix(".json")
            .tempfile_in(dir)
            .map_err(|err| self.write_failed(err))?;
        staged
            .write_all(plaintext)
            .and_then(|()| staged.flush())
            .map_err(|err| self.write_failed(err))?;

        self.encryptor
            .encrypt(staged.path(), &self.path, &self.recipient)?;

        staged.close().map_err(|err| self.write_failed(err))
    }

    fn restore(&self, original: Option<&[u8]>) {
        let result = match original {
            Some(bytes) => fs::write(&self.path, bytes),
            None => match fs::remove_file(&self.path) {
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(err) = result {
            warn!(path = %self.path.display(), error = %err, "failed to restore store file");
        }
    }
}

impl<E: Encryptor> StoreFileHandler for EncryptedFileHandler<E> {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreRecord, PersistError> {
        let plaintext = self.encryptor.decrypt(&self.path)?;
        serde_json::from_slice(&plaintext).map_err(|source| PersistError::JsonParseFailed {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, record: &StoreRecord) -> Result<(), PersistError> {
        let plaintext = serde_json::to_vec_pretty(record)?;

        let original = self.read_existing()?;
        if original.is_some() {
            fs::remove_file(&self.path).map_err(|err| self.write_failed(err))?;
        }

        if let Err(err) = self.encrypt_into_place(&plaintext) {
            warn!(path = %self.path.display(), error = %err, "encrypted write failed, restoring previous store file");
            self.restore(original.as_deref());
            return Err(err);
        }

        debug!(path = %self.path.display(), podcasts = record.podcasts.len(), "wrote encrypted store file");
        Ok(())
    }

    fn is_encrypted(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::make_store;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// "Encrypts" by reversing the bytes and recording the recipient
    #[derive(Default)]
    struct ReversingEncryptor {
        recipients: Mutex<Vec<String>>,
    }

    impl Encryptor for ReversingEncryptor {
        fn encrypt(
            &self,
            plaintext: &Path,
            ciphertext: &Path,
            recipient: &str,
        ) -> Result<(), PersistError> {
            self.recipients.lock().unwrap().push(recipient.to_string());
            let mut bytes = fs::read(plaintext).unwrap();
            bytes.reverse();
            fs::write(ciphertext, bytes).unwrap();
            Ok(())
        }

        fn decrypt(&self, ciphertext: &Path) -> Result<Vec<u8>, PersistError> {
            let mut bytes = fs::read(ciphertext).unwrap();
            bytes.reverse();
            Ok(bytes)
        }
    }

    /// Leaves a partial output behind, then fails like a crashing tool would
    struct FailingEncryptor;

    impl Encryptor for FailingEncryptor {
        fn encrypt(&self, _: &Path, ciphertext: &Path, _: &str) -> Result<(), PersistError> {
            fs::write(ciphertext, b"garbage").unwrap();
            Err(PersistError::EncryptionTool("gpg: no public key".to_string()))
        }

        fn decrypt(&self, _: &Path) -> Result<Vec<u8>, PersistError> {
            Err(PersistError::EncryptionTool("gpg: decryption failed".to_string()))
        }
    }

    fn staged_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with(".pod-store-")
            })
            .collect()
    }

    #[test]
    fn write_then_read_round_trips_through_encryptor() {
        let dir = TempDir::new().unwrap();
        let handler = EncryptedFileHandler::new(
            dir.path().join("pod-store.json"),
            "me@example.com",
            ReversingEncryptor::default(),
        );
        let record = StoreRecord::from_podcasts(&make_store());

        handler.write(&record).unwrap();

        assert_eq!(handler.read().unwrap(), record);
        assert_eq!(
            *handler.encryptor.recipients.lock().unwrap(),
            vec!["me@example.com"]
        );
        let on_disk = fs::read(handler.path()).unwrap();
        assert!(serde_json::from_slice::<StoreRecord>(&on_disk).is_err());
        assert!(staged_files(dir.path()).is_empty());
    }

    #[test]
    fn failed_encryption_restores_previous_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pod-store.json");
        fs::write(&path, b"previous ciphertext").unwrap();
        let handler = EncryptedFileHandler::new(&path, "me@example.com", FailingEncryptor);

        let err = handler
            .write(&StoreRecord::from_podcasts(&make_store()))
            .unwrap_err();

        assert!(matches!(err, PersistError::EncryptionTool(msg) if msg.contains("no public key")));
        assert_eq!(fs::read(&path).unwrap(), b"previous ciphertext");
        assert!(staged_files(dir.path()).is_empty());
    }

    #[test]
    fn failed_first_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pod-store.json");

        let result = EncryptedFileHandler::create_with_file(&path, "me", FailingEncryptor);

        assert!(result.is_err());
        assert!(!path.exists());
        assert!(staged_files(dir.path()).is_empty());
    }

    #[test]
    fn decrypt_failure_surfaces_tool_error() {
        let dir = TempDir::new().unwrap();
        let handler =
            EncryptedFileHandler::new(dir.path().join("pod-store.json"), "me", FailingEncryptor);

        assert!(matches!(
            handler.read(),
            Err(PersistError::EncryptionTool(_))
        ));
    }
}
