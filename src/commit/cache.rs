//! Flat-file cache of previously produced commit messages.
//!
//! The store is a single JSON object in `common_messages.json` mapping the
//! canonical diff summary to a message body. Every access loads the whole
//! document and every write replaces it. There is no locking, so two writers
//! racing on the same project directory keep whichever write lands last.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::commit::message::{CommitMessage, CommitType};
use crate::error::CacheError;

/// File name of the message cache inside a project directory.
pub const CACHE_FILE_NAME: &str = "common_messages.json";

type Entries = BTreeMap<String, String>;

/// Exact-match cache keyed by canonical diff summaries.
#[derive(Debug, Clone)]
pub struct MessageCache {
    path: PathBuf,
}

impl MessageCache {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            path: project_dir.join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a body stored under `key`.
    ///
    /// The cached message takes the requester's `commit_type`, since only the
    /// body is stored. An unreadable or corrupt file counts as a miss.
    pub fn get(&self, key: &str, commit_type: &CommitType) -> Option<CommitMessage> {
        let entries = match self.load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring message cache: {e}");
                return None;
            }
        };

        let body = entries.get(key)?;
        debug!(key, "Message cache hit");
        Some(CommitMessage::cached(commit_type.clone(), body.clone()))
    }

    /// Store `message` under `key`, rewriting the whole file.
    pub fn put(&self, key: &str, message: &CommitMessage) -> Result<(), CacheError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), message.body.clone());
        self.write(&entries)
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.load()?.is_empty())
    }

    fn load(&self) -> Result<Entries, CacheError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => {
                return Err(CacheError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|source| CacheError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write through a temp file in the same directory, then rename over the target.
    fn write(&self, entries: &Entries) -> Result<(), CacheError> {
        let write_failed = |source: std::io::Error| CacheError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir).map_err(write_failed)?;
        let data = serde_json::to_vec_pretty(entries)
            .map_err(|e| write_failed(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        file.write_all(&data).map_err(write_failed)?;
        file.persist(&self.path)
            .map_err(|e| write_failed(e.error))?;

        debug!(path = %self.path.display(), entries = entries.len(), "Wrote message cache");
        Ok(())
    }
}
