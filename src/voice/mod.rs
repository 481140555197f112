//! Voice processing module
//!
//! Input: microphone capture, phrase detection, and remote transcription.
//! Output: remote synthesis, local playback, and the speech controller that
//! keeps at most one utterance playing.

mod capture;
mod detector;
mod engine;
mod listen;
mod playback;
mod speaker;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, resample_mono, samples_to_wav};
pub use detector::{DetectorState, PhraseDetector, SPEECH_ENERGY_THRESHOLD, rms_energy};
pub use engine::{RemoteSpeechEngine, SpeechEngine};
pub use listen::{Listener, Recognition};
pub use playback::{AudioPlayback, decode_audio};
pub use speaker::{SpeechController, split_segments};
pub use stt::SpeechToText;
pub use tts::{TextToSpeech, select_voice, voice_catalogue};
