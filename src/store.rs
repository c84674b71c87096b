use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{PersistError, StoreError};
use crate::model::Podcasts;
use crate::persist::{
    EncryptedFileHandler, Encryptor, GpgEncryptor, LOCK_FILE_NAME, PlainFileHandler,
    StoreFileHandler, StoreLock,
};
use crate::record::StoreRecord;
use crate::vcs::VersionControl;

/// Options for setting up a new store
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub git: bool,
    pub git_url: Option<String>,
    pub gpg_id: Option<String>,
}

/// The loaded store: every podcast, the handler that persists them and the
/// lock that keeps other processes out while it is open.
pub struct Store {
    config: Config,
    handler: Box<dyn StoreFileHandler>,
    pub podcasts: Podcasts,
    _lock: StoreLock,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("store_path", &self.config.store_path)
            .field("encrypted", &self.handler.is_encrypted())
            .field("podcasts", &self.podcasts.len())
            .finish()
    }
}

impl Store {
    /// Create the store directory, the downloads directory and an empty store
    /// file, optionally encrypted and under version control.
    pub fn init<E: Encryptor + 'static>(
        config: &Config,
        options: &InitOptions,
        encryptor: E,
        vcs: &dyn VersionControl,
    ) -> Result<Self, StoreError> {
        match fs::create_dir_all(config.store_path.parent().unwrap_or(&config.store_path))
            .and_then(|()| fs::create_dir(&config.store_path))
        {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::StoreExists(config.store_path.clone()));
            }
            Err(source) => {
                return Err(StoreError::CreateDirectoryFailed {
                    path: config.store_path.clone(),
                    source,
                });
            }
        }
        fs::create_dir_all(&config.downloads_path).map_err(|source| {
            StoreError::CreateDirectoryFailed {
                path: config.downloads_path.clone(),
                source,
            }
        })?;

        let lock = StoreLock::acquire(&config.store_path)?;

        let handler: Box<dyn StoreFileHandler> = match &options.gpg_id {
            Some(gpg_id) => {
                write_gpg_id(config, gpg_id)?;
                Box::new(EncryptedFileHandler::create_with_file(
                    config.store_file_path(),
                    gpg_id.as_str(),
                    encryptor,
                )?)
            }
            None => Box::new(PlainFileHandler::create_with_file(config.store_file_path())?),
        };

        let git = options.git || options.git_url.is_some();
        if git {
            let ignore = config.store_path.join(".gitignore");
            fs::write(&ignore, format!("{LOCK_FILE_NAME}\n"))
                .map_err(|source| PersistError::WriteFailed { path: ignore, source })?;
            vcs.init()?;
            if let Some(url) = &options.git_url {
                vcs.add_remote(url)?;
            }
        }

        info!(path = %config.store_path.display(), encrypted = handler.is_encrypted(), git, "initialized store");
        Ok(Self {
            config: config.clone(),
            handler,
            podcasts: Podcasts::new(),
            _lock: lock,
        })
    }

    /// Open the store, decrypting with `gpg` when it is encrypted
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        Self::open_with(config, GpgEncryptor::new())
    }

    /// Open the store. The encrypted handler is used when a GPG id is set up.
    pub fn open_with<E: Encryptor + 'static>(
        config: &Config,
        encryptor: E,
    ) -> Result<Self, StoreError> {
        let store_file = config.store_file_path();
        if !store_file.is_file() {
            return Err(StoreError::StoreNotFound(store_file));
        }

        let lock = StoreLock::acquire(&config.store_path)?;
        let handler: Box<dyn StoreFileHandler> = match config.gpg_id()? {
            Some(gpg_id) => Box::new(EncryptedFileHandler::new(store_file, gpg_id, encryptor)),
            None => Box::new(PlainFileHandler::new(store_file)),
        };

        Self::load(config, handler, lock)
    }

    /// Read every podcast through `handler`
    pub fn load(
        config: &Config,
        handler: Box<dyn StoreFileHandler>,
        lock: StoreLock,
    ) -> Result<Self, StoreError> {
        let podcasts = handler.read()?.into_podcasts();
        debug!(path = %handler.path().display(), podcasts = podcasts.len(), "loaded store");

        Ok(Self {
            config: config.clone(),
            handler,
            podcasts,
            _lock: lock,
        })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.handler
            .write(&StoreRecord::from_podcasts(&self.podcasts))?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_encrypted(&self) -> bool {
        self.handler.is_encrypted()
    }

    /// Rewrite the store file encrypted for `gpg_id`.
    ///
    /// `.gpg-id` is written first and put back as it was if encryption fails,
    /// so it never names a format the store file is not in.
    pub fn encrypt<E: Encryptor + 'static>(
        &mut self,
        gpg_id: &str,
        encryptor: E,
    ) -> Result<(), StoreError> {
        let gpg_id_file = self.config.gpg_id_file_path();
        let previous = read_if_exists(&gpg_id_file)?;
        write_gpg_id(&self.config, gpg_id)?;

        let handler = EncryptedFileHandler::new(self.config.store_file_path(), gpg_id, encryptor);
        if let Err(err) = handler.write(&StoreRecord::from_podcasts(&self.podcasts)) {
            if let Err(restore_err) = restore_file(&gpg_id_file, previous.as_deref()) {
                warn!(path = %gpg_id_file.display(), error = %restore_err, "failed to restore gpg id file");
            }
            return Err(err.into());
        }

        self.handler = Box::new(handler);
        info!(gpg_id, "encrypted store");
        Ok(())
    }

    /// Rewrite the store file as plain JSON
    pub fn unencrypt(&mut self) -> Result<(), StoreError> {
        let handler = PlainFileHandler::new(self.config.store_file_path());
        handler.write(&StoreRecord::from_podcasts(&self.podcasts))?;

        let gpg_id_file = self.config.gpg_id_file_path();
        match fs::remove_file(&gpg_id_file) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(PersistError::WriteFailed {
                    path: gpg_id_file,
                    source,
                }
                .into());
            }
        }

        self.handler = Box::new(handler);
        info!("unencrypted store");
        Ok(())
    }
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, PersistError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Put `path` back to `contents`, removing it when there were none
fn restore_file(path: &Path, contents: Option<&[u8]>) -> std::io::Result<()> {
    match contents {
        Some(bytes) => fs::write(path, bytes),
        None => match fs::remove_file(path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        },
    }
}

fn write_gpg_id(config: &Config, gpg_id: &str) -> Result<(), PersistError> {
    let path = config.gpg_id_file_path();
    fs::write(&path, format!("{gpg_id}\n")).map_err(|source| PersistError::WriteFailed { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VcsError;
    use crate::model::{NewPodcast, make_entry};
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Stores plaintext with a marker prefix
    struct MarkerEncryptor;

    const MARKER: &[u8] = b"ENCRYPTED:";

    impl Encryptor for MarkerEncryptor {
        fn encrypt(&self, plaintext: &Path, ciphertext: &Path, _: &str) -> Result<(), PersistError> {
            let mut bytes = MARKER.to_vec();
            bytes.extend(fs::read(plaintext).unwrap());
            fs::write(ciphertext, bytes).unwrap();
            Ok(())
        }

        fn decrypt(&self, ciphertext: &Path) -> Result<Vec<u8>, PersistError> {
            let bytes = fs::read(ciphertext).unwrap();
            Ok(bytes[MARKER.len()..].to_vec())
        }
    }

    struct FailingEncryptor;

    impl Encryptor for FailingEncryptor {
        fn encrypt(&self, _: &Path, _: &Path, _: &str) -> Result<(), PersistError> {
            Err(PersistError::EncryptionTool("no secret key".to_string()))
        }

        fn decrypt(&self, _: &Path) -> Result<Vec<u8>, PersistError> {
            Err(PersistError::EncryptionTool("no secret key".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingVcs {
        calls: RefCell<Vec<String>>,
    }

    impl VersionControl for RecordingVcs {
        fn is_tracked(&self) -> bool {
            false
        }

        fn init(&self) -> Result<(), VcsError> {
            self.calls.borrow_mut().push("init".to_string());
            Ok(())
        }

        fn add_remote(&self, url: &str) -> Result<(), VcsError> {
            self.calls.borrow_mut().push(format!("remote {url}"));
            Ok(())
        }

        fn commit_all(&self, message: &str) -> Result<bool, VcsError> {
            self.calls.borrow_mut().push(format!("commit {message}"));
            Ok(true)
        }

        fn run(&self, _args: &[String]) -> Result<String, VcsError> {
            Ok(String::new())
        }
    }

    fn init_plain(config: &Config) -> Store {
        Store::init(
            config,
            &InitOptions::default(),
            MarkerEncryptor,
            &RecordingVcs::default(),
        )
        .unwrap()
    }

    #[test]
    fn init_creates_directories_and_empty_store() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());

        let store = init_plain(&config);

        assert!(config.downloads_path.is_dir());
        assert_eq!(fs::read_to_string(config.store_file_path()).unwrap(), "{}");
        assert!(!store.is_encrypted());
        assert!(store.podcasts.is_empty());
    }

    #[test]
    fn init_twice_fails_with_store_exists() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        drop(init_plain(&config));

        let err = Store::init(
            &config,
            &InitOptions::default(),
            MarkerEncryptor,
            &RecordingVcs::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::StoreExists(_)));
    }

    #[test]
    fn init_with_git_and_gpg() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let vcs = RecordingVcs::default();
        let options = InitOptions {
            git: false,
            git_url: Some("git@example.com:me/pods.git".to_string()),
            gpg_id: Some("me@example.com".to_string()),
        };

        let store = Store::init(&config, &options, MarkerEncryptor, &vcs).unwrap();

        assert!(store.is_encrypted());
        assert_eq!(config.gpg_id().unwrap().as_deref(), Some("me@example.com"));
        assert!(fs::read(config.store_file_path()).unwrap().starts_with(MARKER));
        assert_eq!(
            *vcs.calls.borrow(),
            vec!["init", "remote git@example.com:me/pods.git"]
        );
        let ignore = fs::read_to_string(config.store_path.join(".gitignore")).unwrap();
        assert!(ignore.contains(LOCK_FILE_NAME));
    }

    #[test]
    fn open_without_store_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());

        assert!(matches!(
            Store::open_with(&config, MarkerEncryptor),
            Err(StoreError::StoreNotFound(_))
        ));
    }

    #[test]
    fn open_while_another_store_is_open_is_locked() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let _store = init_plain(&config);

        let err = Store::open_with(&config, MarkerEncryptor).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Persist(PersistError::StoreLocked(_))
        ));
    }

    #[test]
    fn saved_podcasts_are_loaded_back() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let mut store = init_plain(&config);
        store
            .podcasts
            .add(
                NewPodcast::new("greetings", "http://hello.world/rss"),
                &[make_entry("aaa", 0)],
            )
            .unwrap();
        store.save().unwrap();
        let saved = store.podcasts.clone();
        drop(store);

        let reopened = Store::open_with(&config, MarkerEncryptor).unwrap();
        assert_eq!(reopened.podcasts, saved);
    }

    #[test]
    fn encrypt_then_unencrypt_keeps_data() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let mut store = init_plain(&config);
        store
            .podcasts
            .add(NewPodcast::new("farewell", "http://goodbye.world/rss"), &[])
            .unwrap();
        store.save().unwrap();

        store.encrypt("me@example.com", MarkerEncryptor).unwrap();
        assert!(store.is_encrypted());
        assert!(fs::read(config.store_file_path()).unwrap().starts_with(MARKER));
        drop(store);

        let mut reopened = Store::open_with(&config, MarkerEncryptor).unwrap();
        assert!(reopened.is_encrypted());
        assert!(reopened.podcasts.contains("farewell"));

        reopened.unencrypt().unwrap();
        assert!(!reopened.is_encrypted());
        assert_eq!(config.gpg_id().unwrap(), None);
        let plain: StoreRecord =
            serde_json::from_slice(&fs::read(config.store_file_path()).unwrap()).unwrap();
        assert!(plain.podcasts.contains_key("farewell"));
    }

    #[test]
    fn failed_encryption_leaves_store_readable_as_plain() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let mut store = init_plain(&config);
        store
            .podcasts
            .add(NewPodcast::new("farewell", "http://goodbye.world/rss"), &[])
            .unwrap();
        store.save().unwrap();

        let err = store.encrypt("me@example.com", FailingEncryptor).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Persist(PersistError::EncryptionTool(_))
        ));
        assert!(!store.is_encrypted());
        assert!(!config.gpg_id_file_path().exists());
        drop(store);

        let reopened = Store::open_with(&config, MarkerEncryptor).unwrap();
        assert!(!reopened.is_encrypted());
        assert!(reopened.podcasts.contains("farewell"));
    }

    #[test]
    fn failed_re_encryption_keeps_previous_gpg_id() {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        let mut store = init_plain(&config);
        store.encrypt("old@example.com", MarkerEncryptor).unwrap();

        assert!(store.encrypt("new@example.com", FailingEncryptor).is_err());

        assert_eq!(config.gpg_id().unwrap().as_deref(), Some("old@example.com"));
        drop(store);
        assert!(Store::open_with(&config, MarkerEncryptor).unwrap().is_encrypted());
    }
}
