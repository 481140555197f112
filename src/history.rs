//! Persisted query history
//!
//! The whole log lives in one pretty-printed JSON array and is rewritten on
//! every change. Loading never fails: a missing or unreadable file is an empty log.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// One answered query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }
}

/// JSON file backing the history log
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the log from disk
    ///
    /// Missing files, invalid JSON, and non-array content all yield an empty log.
    #[must_use]
    pub fn load(&self) -> Vec<HistoryEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no history file yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read history, starting empty"
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&content) {
            Ok(entries) => {
                tracing::debug!(
                    path = %self.path.display(),
                    entries = entries.len(),
                    "loaded history"
                );
                entries
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "history file is not a list of entries, starting empty"
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the backing file with the full log
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;

        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "saved history"
        );
        Ok(())
    }

    /// Persist an empty log
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn clear(&self) -> Result<()> {
        self.save(&[])
    }
}
