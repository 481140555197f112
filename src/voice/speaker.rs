//! Speech output controller
//!
//! Speaks text on a background task, one sentence-like segment at a time.
//! A new utterance cancels and awaits the previous one before starting, so at
//! most one utterance is ever audible. `stop` takes effect within a segment:
//! the cancel token is checked between segments and the engine halts the
//! segment in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use super::engine::SpeechEngine;

/// Separator between segments of an utterance
const SEGMENT_SEPARATOR: &str = ". ";

/// Split text into the segments spoken one at a time
///
/// Whitespace-only pieces are dropped, so `n` separators give at most `n + 1` segments.
#[must_use]
pub fn split_segments(text: &str) -> Vec<String> {
    text.split(SEGMENT_SEPARATOR)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// One in-flight utterance
struct SpeechTask {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Keeps at most one utterance playing on a speech engine
pub struct SpeechController<E: SpeechEngine> {
    engine: Arc<E>,
    speaking: Arc<AtomicBool>,
    task: Mutex<Option<SpeechTask>>,
}

impl<E: SpeechEngine> SpeechController<E> {
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self::with_engine(Arc::new(engine))
    }

    /// Create a controller sharing an existing engine
    #[must_use]
    pub fn with_engine(engine: Arc<E>) -> Self {
        Self {
            engine,
            speaking: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Whether an utterance is currently playing
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Start speaking `text`, replacing any utterance in progress
    ///
    /// Returns once the previous utterance has fully stopped and the new one
    /// has been started; playback itself continues in the background.
    pub async fn speak(&self, text: &str) {
        if let Some(prior) = self.take_task() {
            prior.cancel.store(true, Ordering::SeqCst);
            self.engine.stop();
            if let Err(e) = prior.handle.await {
                tracing::warn!(error = %e, "previous utterance ended abnormally");
            }
        }
        self.engine.reset();

        let segments = split_segments(text);
        tracing::debug!(segments = segments.len(), "speaking");

        let cancel = Arc::new(AtomicBool::new(false));
        self.speaking.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(run_utterance(
            Arc::clone(&self.engine),
            segments,
            Arc::clone(&cancel),
            Arc::clone(&self.speaking),
        ));

        *self.lock_task() = Some(SpeechTask { cancel, handle });
    }

    /// Stop the current utterance; does nothing while idle
    pub fn stop(&self) {
        if !self.is_speaking() {
            return;
        }

        if let Some(task) = self.lock_task().as_ref() {
            task.cancel.store(true, Ordering::SeqCst);
        }
        self.engine.stop();
        self.speaking.store(false, Ordering::SeqCst);
        tracing::debug!("speech stopped");
    }

    /// Wait for the current utterance, if any, to finish
    pub async fn wait(&self) {
        if let Some(task) = self.take_task() {
            if let Err(e) = task.handle.await {
                tracing::warn!(error = %e, "utterance ended abnormally");
            }
        }
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<SpeechTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_task(&self) -> Option<SpeechTask> {
        self.lock_task().take()
    }
}

/// Speak segments in order until done, cancelled, or the engine fails
async fn run_utterance<E: SpeechEngine>(
    engine: Arc<E>,
    segments: Vec<String>,
    cancel: Arc<AtomicBool>,
    speaking: Arc<AtomicBool>,
) {
    let total = segments.len();

    for (index, segment) in segments.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            tracing::debug!(spoken = index, total, "utterance cancelled");
            break;
        }

        if let Err(e) = engine.say(segment).await {
            tracing::error!(error = %e, segment = index, "error in speaking, abandoning utterance");
            break;
        }
    }

    speaking.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_period_space() {
        assert_eq!(
            split_segments("First one. Second one. Third."),
            vec!["First one", "Second one", "Third."]
        );
    }

    #[test]
    fn text_without_separator_is_one_segment() {
        assert_eq!(split_segments("No breaks here"), vec!["No breaks here"]);
    }

    #[test]
    fn periods_without_space_do_not_split() {
        assert_eq!(split_segments("Version 3.12 is out"), vec!["Version 3.12 is out"]);
    }

    #[test]
    fn blank_pieces_are_dropped() {
        assert_eq!(split_segments("One. . Two. "), vec!["One", "Two"]);
        assert!(split_segments("").is_empty());
    }
}
