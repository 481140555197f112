//! Phrase detection for a bounded listening window
//!
//! Energy-gated: a phrase begins with the first loud chunk and ends after a
//! stretch of silence or when it reaches the phrase time limit. If no speech
//! starts before the listen timeout, the window times out.

use std::time::Duration;

/// Minimum audio energy threshold to consider speech
pub const SPEECH_ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech before trailing silence can end a phrase
const MIN_SPEECH: Duration = Duration::from_millis(300);

/// Silence that ends a phrase
const END_SILENCE: Duration = Duration::from_millis(800);

/// State of the phrase detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech to start
    Waiting,
    /// Speech started, accumulating the phrase
    Capturing,
    /// Phrase ended by silence or the phrase time limit
    Complete,
    /// No speech before the listen timeout
    TimedOut,
}

/// Detects one spoken phrase in a stream of mono samples
pub struct PhraseDetector {
    state: DetectorState,
    phrase: Vec<f32>,
    silence: usize,
    waited: usize,
    min_speech: usize,
    end_silence: usize,
    listen_timeout: usize,
    phrase_limit: usize,
}

impl PhraseDetector {
    /// Create a detector for audio at `sample_rate`
    #[must_use]
    pub fn new(sample_rate: u32, listen_timeout: Duration, phrase_limit: Duration) -> Self {
        let to_samples = |d: Duration| duration_to_samples(d, sample_rate);

        Self {
            state: DetectorState::Waiting,
            phrase: Vec::new(),
            silence: 0,
            waited: 0,
            min_speech: to_samples(MIN_SPEECH),
            end_silence: to_samples(END_SILENCE),
            listen_timeout: to_samples(listen_timeout),
            phrase_limit: to_samples(phrase_limit).max(1),
        }
    }

    /// Feed captured samples and return the resulting state
    pub fn process(&mut self, samples: &[f32]) -> DetectorState {
        let energy = rms_energy(samples);
        let is_speech = energy > SPEECH_ENERGY_THRESHOLD;

        match self.state {
            DetectorState::Waiting => {
                if is_speech {
                    self.state = DetectorState::Capturing;
                    self.phrase.clear();
                    self.phrase.extend_from_slice(samples);
                    self.silence = 0;
                    tracing::trace!(energy, "speech detected, capturing");
                    self.check_limit();
                } else {
                    self.waited += samples.len();
                    if self.waited >= self.listen_timeout {
                        tracing::debug!(waited = self.waited, "no speech before timeout");
                        self.state = DetectorState::TimedOut;
                    }
                }
            }
            DetectorState::Capturing => {
                self.phrase.extend_from_slice(samples);

                if is_speech {
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                tracing::trace!(
                    phrase_len = self.phrase.len(),
                    silence = self.silence,
                    is_speech,
                    energy,
                    "capturing"
                );

                let speech_len = self.phrase.len().saturating_sub(self.silence);
                if self.silence > self.end_silence {
                    if speech_len > self.min_speech {
                        tracing::debug!(samples = self.phrase.len(), "phrase complete");
                        self.state = DetectorState::Complete;
                    } else {
                        // Click or cough: go back to waiting, the timeout keeps running
                        tracing::trace!("false start, waiting again");
                        self.waited += self.phrase.len();
                        self.phrase.clear();
                        self.silence = 0;
                        self.state = if self.waited >= self.listen_timeout {
                            DetectorState::TimedOut
                        } else {
                            DetectorState::Waiting
                        };
                    }
                } else {
                    self.check_limit();
                }
            }
            DetectorState::Complete | DetectorState::TimedOut => {}
        }

        self.state
    }

    fn check_limit(&mut self) {
        if self.phrase.len() >= self.phrase_limit {
            tracing::debug!(samples = self.phrase.len(), "phrase time limit reached");
            self.phrase.truncate(self.phrase_limit);
            self.state = DetectorState::Complete;
        }
    }

    /// Get the accumulated phrase
    #[must_use]
    pub fn phrase(&self) -> &[f32] {
        &self.phrase
    }

    /// Take the phrase, clearing it
    pub fn take_phrase(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.phrase)
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    /// Whether the window has reached a final state
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, DetectorState::Complete | DetectorState::TimedOut)
    }

    /// Force the window closed, keeping any captured speech
    pub fn finish(&mut self) -> DetectorState {
        self.state = match self.state {
            DetectorState::Capturing if self.phrase.len() > self.min_speech => {
                DetectorState::Complete
            }
            DetectorState::Complete => DetectorState::Complete,
            _ => DetectorState::TimedOut,
        };
        self.state
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_to_samples(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)) as usize
}

/// RMS energy of audio samples, zero for an empty slice
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
