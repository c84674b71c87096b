//! Version control of the store directory, plus the commit messages written
//! after each change.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::VcsError;

/// Tracks changes to the store directory
pub trait VersionControl {
    fn is_tracked(&self) -> bool;

    fn init(&self) -> Result<(), VcsError>;

    fn add_remote(&self, url: &str) -> Result<(), VcsError>;

    /// Stage and commit everything. `Ok(false)` when there was nothing to commit.
    fn commit_all(&self, message: &str) -> Result<bool, VcsError>;

    /// Run an arbitrary command, returning its stdout
    fn run(&self, args: &[String]) -> Result<String, VcsError>;
}

/// `git`, run inside the store directory
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
}

impl GitCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn git(&self, args: &[&str]) -> Result<String, VcsError> {
        let command = args.join(" ");
        debug!(dir = %self.dir.display(), %command, "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|source| VcsError::SpawnFailed {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitCli {
    fn is_tracked(&self) -> bool {
        self.dir.join(".git").exists()
    }

    fn init(&self) -> Result<(), VcsError> {
        self.git(&["init"]).map(|_| ())
    }

    fn add_remote(&self, url: &str) -> Result<(), VcsError> {
        self.git(&["remote", "add", "origin", url]).map(|_| ())
    }

    fn commit_all(&self, message: &str) -> Result<bool, VcsError> {
        self.git(&["add", "--all"])?;
        if self.git(&["status", "--porcelain"])?.trim().is_empty() {
            debug!("nothing to commit");
            return Ok(false);
        }
        self.git(&["commit", "--quiet", "--message", message])?;
        Ok(true)
    }

    fn run(&self, args: &[String]) -> Result<String, VcsError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.git(&args)
    }
}

/// Which podcasts a command ran over, for commit messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope<'a> {
    pub podcast: Option<&'a str>,
    pub tags: &'a [String],
    /// Whether `tags` were required to be present or absent
    pub tagged: bool,
}

impl Scope<'_> {
    fn podcast(&self) -> String {
        self.podcast
            .map(|title| format!("'{title}'"))
            .unwrap_or_else(|| "all podcasts".to_string())
    }

    fn tags(&self, separator: &str) -> String {
        if self.tags.is_empty() {
            return String::new();
        }
        let qualifier = if self.tagged { "with" } else { "without" };
        format!(" {qualifier} tags{separator} '{}'", self.tags.join(", "))
    }
}

pub fn added_message(title: &str) -> String {
    format!("Added podcast: {title}.")
}

pub fn removed_message(title: &str) -> String {
    format!("Removed podcast: {title}.")
}

pub fn renamed_message(old: &str, new: &str) -> String {
    format!("Renamed podcast: {old} -> {new}")
}

pub fn refreshed_message(scope: &Scope<'_>) -> String {
    format!("Refreshed {}{}.", scope.podcast(), scope.tags(":"))
}

pub fn downloaded_message(scope: &Scope<'_>) -> String {
    format!(
        "Downloaded new episodes{} for {}.",
        scope.tags(""),
        scope.podcast()
    )
}

/// e.g. `Marked 'greetings' podcast episodes as seen in bulk mode.`
pub fn tagged_message(
    performed: &str,
    listing: &str,
    podcast: Option<&str>,
    episodes: bool,
    interactive: bool,
) -> String {
    let mut performed_chars = performed.chars();
    let performed: String = match performed_chars.next() {
        Some(first) => first.to_uppercase().chain(performed_chars).collect(),
        None => String::new(),
    };
    let target = podcast
        .map(|title| format!("'{title}'"))
        .unwrap_or_else(|| "all".to_string());
    let items = if episodes { "podcast episodes" } else { "podcasts" };
    let mode = if interactive { "interactive" } else { "bulk" };
    format!("{performed} {target} {items} as {listing} in {mode} mode.")
}

pub fn encrypted_message() -> String {
    "Encrypted the store.".to_string()
}

pub fn unencrypted_message() -> String {
    "Unencrypted the store.".to_string()
}
