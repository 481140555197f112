//! Text-to-speech (TTS) processing

use secrecy::{ExposeSecret, SecretString};

use crate::{Config, Error, Result};

/// Voices offered by the Groq `playai-tts` model
const PLAYAI_VOICES: &[&str] = &[
    "Arista-PlayAI",
    "Fritz-PlayAI",
    "Atlas-PlayAI",
    "Basil-PlayAI",
    "Celeste-PlayAI",
    "Cheyenne-PlayAI",
    "Chip-PlayAI",
    "Deedee-PlayAI",
    "Mason-PlayAI",
    "Quinn-PlayAI",
];

/// Voices offered by the `OpenAI` speech models
const OPENAI_VOICES: &[&str] = &["alloy", "nova", "echo", "fable", "onyx", "shimmer"];

/// Known voices for a TTS model, empty when the model is not recognized
#[must_use]
pub fn voice_catalogue(model: &str) -> &'static [&'static str] {
    match model {
        "playai-tts" => PLAYAI_VOICES,
        "tts-1" | "tts-1-hd" | "gpt-4o-mini-tts" => OPENAI_VOICES,
        _ => &[],
    }
}

/// Pick the voice to use, once, at startup
///
/// The preferred voice wins when the catalogue offers it. Otherwise the second
/// catalogue voice is used when there is more than one, else the only one.
/// Unknown models have no catalogue, so the preferred voice is taken as given.
///
/// # Errors
///
/// Returns error if no voice can be determined
pub fn select_voice(catalogue: &[&str], preferred: Option<&str>) -> Result<String> {
    if let Some(wanted) = preferred {
        if catalogue.is_empty() {
            return Ok(wanted.to_string());
        }
        if let Some(found) = catalogue.iter().find(|v| v.eq_ignore_ascii_case(wanted)) {
            return Ok((*found).to_string());
        }
        tracing::warn!(voice = wanted, "configured voice not offered, using fallback");
    }

    catalogue
        .get(1)
        .or_else(|| catalogue.first())
        .map(|v| (*v).to_string())
        .ok_or_else(|| Error::Config("no TTS voice configured for this model".to_string()))
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    voice: String,
    speed: f64,
}

impl TextToSpeech {
    /// Create a new TTS instance
    #[must_use]
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        speed: f64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            voice: voice.into(),
            speed,
        }
    }

    /// Create a TTS instance from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns error if no voice can be selected for the configured model
    pub fn from_config(config: &Config) -> Result<Self> {
        let voice = select_voice(
            voice_catalogue(&config.voice.tts_model),
            config.voice.tts_voice.as_deref(),
        )?;

        tracing::debug!(
            model = %config.voice.tts_model,
            voice = %voice,
            speed = config.voice.tts_speed,
            "text-to-speech configured"
        );

        Ok(Self::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            config.voice.tts_model.clone(),
            voice,
            config.voice.tts_speed,
        ))
    }

    /// Selected voice
    #[must_use]
    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Synthesize text to speech
    ///
    /// # Returns
    ///
    /// Encoded audio bytes (WAV requested, MP3 accepted)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "wav",
        };

        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
