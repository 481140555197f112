//! Voice queries: listen for one phrase and transcribe it

use std::time::{Duration, Instant};

use super::capture::{AudioCapture, SAMPLE_RATE, resample_mono, samples_to_wav};
use super::detector::{DetectorState, PhraseDetector};
use super::stt::SpeechToText;
use crate::{Config, Result};

/// How often the capture buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a listening window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Recognized text
    Text(String),
    /// No speech, or speech that produced no words
    NotUnderstood,
    /// The transcription service failed
    ServiceError(String),
}

impl Recognition {
    /// The recognized text, empty for failures
    #[must_use]
    pub fn into_query(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::NotUnderstood | Self::ServiceError(_) => String::new(),
        }
    }
}

/// Listens on the microphone for one spoken query
pub struct Listener {
    stt: SpeechToText,
    listen_timeout: Duration,
    phrase_time_limit: Duration,
}

impl Listener {
    #[must_use]
    pub const fn new(stt: SpeechToText, listen_timeout: Duration, phrase_time_limit: Duration) -> Self {
        Self {
            stt,
            listen_timeout,
            phrase_time_limit,
        }
    }

    /// Create a listener from loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SpeechToText::from_config(config),
            config.voice.listen_timeout,
            config.voice.phrase_time_limit,
        )
    }

    /// Capture one phrase from the default microphone and transcribe it
    ///
    /// # Errors
    ///
    /// Returns error only if the audio device cannot be used; recognition
    /// failures are reported through [`Recognition`]
    #[allow(clippy::future_not_send)]
    pub async fn listen(&self) -> Result<Recognition> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;

        let rate = capture.sample_rate();
        let mut detector = PhraseDetector::new(rate, self.listen_timeout, self.phrase_time_limit);
        let deadline = self.listen_timeout + self.phrase_time_limit + Duration::from_secs(1);
        let started = Instant::now();

        tracing::info!(
            timeout_secs = self.listen_timeout.as_secs(),
            limit_secs = self.phrase_time_limit.as_secs(),
            "listening"
        );

        while !detector.is_finished() {
            tokio::time::sleep(POLL_INTERVAL).await;
            detector.process(&capture.take_buffer());

            // A device that delivers nothing must not hold the window open
            if started.elapsed() > deadline {
                detector.finish();
            }
        }

        capture.stop();

        if detector.state() == DetectorState::TimedOut {
            tracing::info!("no speech heard");
            return Ok(Recognition::NotUnderstood);
        }

        let phrase = detector.take_phrase();
        Ok(self.recognize(&phrase, rate).await)
    }

    /// Transcribe an already captured phrase
    pub async fn recognize(&self, samples: &[f32], sample_rate: u32) -> Recognition {
        let wav = match resample_mono(samples, sample_rate, SAMPLE_RATE)
            .and_then(|speech| samples_to_wav(&speech, SAMPLE_RATE))
        {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode captured audio");
                return Recognition::ServiceError(e.to_string());
            }
        };

        match self.stt.transcribe(&wav).await {
            Ok(text) if text.trim().is_empty() => Recognition::NotUnderstood,
            Ok(text) => Recognition::Text(text.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "speech recognition failed");
                Recognition::ServiceError(e.to_string())
            }
        }
    }
}
