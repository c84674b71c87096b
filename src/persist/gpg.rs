use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

use tracing::debug;

use crate::error::PersistError;

/// The asymmetric-encryption tool behind the encrypted store file
pub trait Encryptor: Send + Sync {
    /// Encrypt the file at `plaintext` for `recipient`, writing `ciphertext`
    fn encrypt(&self, plaintext: &Path, ciphertext: &Path, recipient: &str)
    -> Result<(), PersistError>;

    /// Decrypt the file at `ciphertext`, returning the plaintext bytes
    fn decrypt(&self, ciphertext: &Path) -> Result<Vec<u8>, PersistError>;
}

/// Shells out to `gpg`
#[derive(Debug, Clone)]
pub struct GpgEncryptor {
    program: String,
}

impl GpgEncryptor {
    pub fn new() -> Self {
        Self::with_program("gpg")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<I, S>(&self, args: I) -> Result<Output, PersistError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|err| {
                PersistError::EncryptionTool(format!("failed to run {}: {err}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PersistError::EncryptionTool(stderr));
        }
        Ok(output)
    }
}

impl Default for GpgEncryptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Encryptor for GpgEncryptor {
    fn encrypt(
        &self,
        plaintext: &Path,
        ciphertext: &Path,
        recipient: &str,
    ) -> Result<(), PersistError> {
        debug!(recipient, output = %ciphertext.display(), "encrypting store file");
        self.run([
            OsStr::new("--batch"),
            OsStr::new("--yes"),
            OsStr::new("--quiet"),
            OsStr::new("--recipient"),
            OsStr::new(recipient),
            OsStr::new("--output"),
            ciphertext.as_os_str(),
            OsStr::new("--encrypt"),
            plaintext.as_os_str(),
        ])?;
        Ok(())
    }

    fn decrypt(&self, ciphertext: &Path) -> Result<Vec<u8>, PersistError> {
        debug!(input = %ciphertext.display(), "decrypting store file");
        let output = self.run([
            OsStr::new("--batch"),
            OsStr::new("--quiet"),
            OsStr::new("--decrypt"),
            ciphertext.as_os_str(),
        ])?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_an_encryption_tool_error() {
        let gpg = GpgEncryptor::with_program("podstore-test-no-such-gpg");

        let err = gpg.decrypt(Path::new("/nonexistent")).unwrap_err();

        assert!(matches!(err, PersistError::EncryptionTool(msg) if msg.contains("failed to run")));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_stderr() {
        let gpg = GpgEncryptor::with_program("false");

        assert!(matches!(
            gpg.decrypt(Path::new("/nonexistent")),
            Err(PersistError::EncryptionTool(_))
        ));
    }
}
