//! Speech engines render one segment of text to audio

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::playback::{AudioPlayback, decode_audio};
use super::tts::TextToSpeech;
use crate::{Config, Error, Result};

/// Renders text segments to audio
///
/// `stop` halts the segment currently rendering and keeps the engine halted,
/// so later `say` calls return at once until `reset` re-arms it.
#[async_trait]
pub trait SpeechEngine: Send + Sync + 'static {
    /// Render one segment, returning when playback ends or the engine is halted
    async fn say(&self, segment: &str) -> Result<()>;

    /// Halt playback immediately
    fn stop(&self);

    /// Re-arm after a stop
    fn reset(&self);
}

/// Remote synthesis with local playback
pub struct RemoteSpeechEngine {
    tts: TextToSpeech,
    playback: Arc<AudioPlayback>,
    halted: Arc<AtomicBool>,
}

impl RemoteSpeechEngine {
    /// Configure the engine once at startup
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available or no voice can be selected
    pub fn new(config: &Config) -> Result<Self> {
        let playback = AudioPlayback::new()?;
        let tts = TextToSpeech::from_config(config)?;

        tracing::info!(voice = tts.voice(), "speech engine ready");

        Ok(Self {
            tts,
            playback: Arc::new(playback),
            halted: Arc::new(AtomicBool::new(false)),
        })
    }

    fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for RemoteSpeechEngine {
    async fn say(&self, segment: &str) -> Result<()> {
        if self.is_halted() || segment.trim().is_empty() {
            return Ok(());
        }

        let audio = self.tts.synthesize(segment).await?;
        if self.is_halted() {
            return Ok(());
        }

        let (samples, sample_rate) = decode_audio(&audio)?;
        let playback = Arc::clone(&self.playback);
        let halted = Arc::clone(&self.halted);

        tokio::task::spawn_blocking(move || playback.play_blocking(&samples, sample_rate, &halted))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }

    fn stop(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.halted.store(false, Ordering::SeqCst);
    }
}
