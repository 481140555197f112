//! Session state: history, last answer, and pending voice input
//!
//! One `Session` is owned by the front-end for the lifetime of the process.
//! Memory is the source of truth for the history log; the file is rewritten
//! after every change and a failed write is reported, not rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::completion::Completion;
use crate::history::{HistoryEntry, HistoryStore};
use crate::recommend::{Recommendations, recommend};
use crate::{Error, Result};

/// File name of a downloaded response
pub const DOWNLOAD_FILE_NAME: &str = "findora_response.txt";

/// A completed query
#[derive(Debug, Clone)]
pub struct Answer {
    /// The query that was sent
    pub query: String,
    /// The completion text
    pub response: String,
    /// Set when the history file could not be written
    pub history_error: Option<String>,
}

/// Application state for one interactive session
pub struct Session {
    completion: Arc<dyn Completion>,
    store: HistoryStore,
    history: Vec<HistoryEntry>,
    last_response: Option<String>,
    pending_voice: Option<String>,
}

impl Session {
    /// Open a session, loading any saved history
    #[must_use]
    pub fn open(completion: Arc<dyn Completion>, store: HistoryStore) -> Self {
        let history = store.load();
        tracing::debug!(entries = history.len(), "session opened");

        Self {
            completion,
            store,
            history,
            last_response: None,
            pending_voice: None,
        }
    }

    /// Remember a voice transcript to use as the next query
    ///
    /// A non-empty transcript overrides typed text on the next [`Session::ask`]
    /// and is consumed by it.
    pub fn set_voice_query(&mut self, transcript: impl Into<String>) {
        let transcript = transcript.into();
        self.pending_voice = (!transcript.trim().is_empty()).then_some(transcript);
    }

    /// Pending voice transcript, if any
    #[must_use]
    pub fn pending_voice(&self) -> Option<&str> {
        self.pending_voice.as_deref()
    }

    /// Ask a question and record the answer
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyQuery` when there is nothing to ask and the
    /// completion error when the remote call fails; in both cases the history
    /// is untouched.
    pub async fn ask(&mut self, typed: &str) -> Result<Answer> {
        let query = self
            .pending_voice
            .take()
            .unwrap_or_else(|| typed.to_string())
            .trim()
            .to_string();

        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let response = self.completion.complete(&query).await?;

        self.last_response = Some(response.clone());
        self.history.push(HistoryEntry::new(query.clone(), response.clone()));

        let history_error = self.store.save(&self.history).err().map(|e| {
            tracing::warn!(error = %e, path = %self.store.path().display(), "failed to save history");
            e.to_string()
        });

        Ok(Answer {
            query,
            response,
            history_error,
        })
    }

    /// Past queries in the order they were asked
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Drop all history, in memory and on disk
    ///
    /// # Errors
    ///
    /// Returns error if the history file cannot be written; memory is cleared regardless
    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear();
        self.store.clear()
    }

    /// Topic suggestions from past queries
    #[must_use]
    pub fn recommendations(&self) -> Recommendations {
        recommend(&self.history)
    }

    /// The most recent answer
    #[must_use]
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    /// Write the most recent answer to `dir/findora_response.txt`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if nothing has been answered yet, or an IO error
    pub fn download_response(&self, dir: &Path) -> Result<PathBuf> {
        let response = self
            .last_response
            .as_deref()
            .ok_or_else(|| Error::NotFound("no response to download yet".to_string()))?;

        std::fs::create_dir_all(dir)?;
        let path = dir.join(DOWNLOAD_FILE_NAME);
        std::fs::write(&path, response.as_bytes())?;

        tracing::info!(path = %path.display(), bytes = response.len(), "response downloaded");
        Ok(path)
    }
}
