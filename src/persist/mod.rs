//! Reading and writing the store file, plain or encrypted at rest.

mod encrypted;
mod gpg;
mod lock;
mod plain;

use std::path::Path;

pub use encrypted::EncryptedFileHandler;
pub use gpg::{Encryptor, GpgEncryptor};
pub use lock::{LOCK_FILE_NAME, StoreLock};
pub use plain::PlainFileHandler;

use crate::error::PersistError;
use crate::record::StoreRecord;

/// Reads and writes the whole store record
pub trait StoreFileHandler: Send {
    fn path(&self) -> &Path;

    fn read(&self) -> Result<StoreRecord, PersistError>;

    /// Replace the store file with `record`
    fn write(&self, record: &StoreRecord) -> Result<(), PersistError>;

    /// Whether the file on disk is encrypted
    fn is_encrypted(&self) -> bool;
}
