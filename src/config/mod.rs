//! Configuration management for Findora
//!
//! Values resolve with priority: environment variable, then the TOML file
//! (`~/.config/findora/config.toml`), then built-in defaults. The API key is the
//! only required value; without it nothing can be asked.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use self::file::FindoraConfigFile;
use crate::completion::DEFAULT_SYSTEM_PROMPT;
use crate::{Error, Result};

/// Environment variable holding the completion API key
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default OpenAI-compatible API base URL (Groq)
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Default speech-to-text model
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3";

/// Default text-to-speech model
pub const DEFAULT_TTS_MODEL: &str = "playai-tts";

/// Default TTS speed, roughly 165 words per minute
pub const DEFAULT_TTS_SPEED: f64 = 1.1;

/// Findora configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the completion, STT, and TTS endpoints
    pub api_key: SecretString,

    /// Base URL of the OpenAI-compatible API
    pub api_base_url: String,

    /// LLM model identifier for chat completions
    pub llm_model: String,

    /// System instruction sent ahead of every question
    pub system_prompt: String,

    /// Path of the persisted history file
    pub history_path: PathBuf,

    /// Directory that receives `findora_response.txt`
    pub download_dir: PathBuf,

    /// Voice configuration
    pub voice: VoiceConfig,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// STT model (e.g. "whisper-large-v3")
    pub stt_model: String,

    /// TTS model (e.g. "playai-tts")
    pub tts_model: String,

    /// Preferred TTS voice; falls back to the provider catalogue when unset or unknown
    pub tts_voice: Option<String>,

    /// TTS speed multiplier (0.5 to 5.0)
    pub tts_speed: f64,

    /// How long to wait for speech to start
    pub listen_timeout: Duration,

    /// Maximum length of one spoken phrase
    pub phrase_time_limit: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: DEFAULT_STT_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice: None,
            tts_speed: DEFAULT_TTS_SPEED,
            listen_timeout: Duration::from_secs(5),
            phrase_time_limit: Duration::from_secs(10),
        }
    }
}

/// Return the data directory (`~/.local/share/findora` on Linux)
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "findora")
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().to_path_buf())
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured
    pub fn load(disable_voice: bool) -> Result<Self> {
        let file = file::load_config_file();
        Self::from_sources(&file, |key| std::env::var(key).ok(), disable_voice)
    }

    /// Resolve configuration from a parsed config file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured
    pub fn from_sources<F>(file: &FindoraConfigFile, env: F, disable_voice: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |k: &String| !k.trim().is_empty();
        let api_key = env(API_KEY_ENV)
            .filter(non_blank)
            .or_else(|| file.api_key.clone().filter(non_blank))
            .ok_or_else(|| {
                Error::Config(format!(
                    "{API_KEY_ENV} not found, add it to your environment or .env file"
                ))
            })?;

        let api_base_url = env("FINDORA_API_BASE")
            .or_else(|| file.llm.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let llm_model = env("FINDORA_MODEL")
            .or_else(|| file.llm.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let system_prompt = file
            .llm
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let history_path = env("FINDORA_HISTORY_PATH")
            .or_else(|| file.storage.history_path.clone())
            .map_or_else(|| data_dir().join("history.json"), PathBuf::from);

        let download_dir = env("FINDORA_DOWNLOAD_DIR")
            .or_else(|| file.storage.download_dir.clone())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);

        let defaults = VoiceConfig::default();
        let fv = &file.voice;
        let voice = VoiceConfig {
            enabled: !disable_voice && fv.enabled.unwrap_or(true),
            stt_model: env("FINDORA_STT_MODEL")
                .or_else(|| fv.stt_model.clone())
                .unwrap_or(defaults.stt_model),
            tts_model: env("FINDORA_TTS_MODEL")
                .or_else(|| fv.tts_model.clone())
                .unwrap_or(defaults.tts_model),
            tts_voice: env("FINDORA_TTS_VOICE").or_else(|| fv.tts_voice.clone()),
            tts_speed: fv.tts_speed.unwrap_or(defaults.tts_speed).clamp(0.5, 5.0),
            listen_timeout: fv
                .listen_timeout_secs
                .map_or(defaults.listen_timeout, Duration::from_secs),
            phrase_time_limit: fv
                .phrase_time_limit_secs
                .map_or(defaults.phrase_time_limit, Duration::from_secs),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base_url,
            llm_model,
            system_prompt,
            history_path,
            download_dir,
            voice,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_sources(&FindoraConfigFile::default(), env_from(&[]), false)
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains(API_KEY_ENV)));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let result = Config::from_sources(
            &FindoraConfigFile::default(),
            env_from(&[(API_KEY_ENV, "   ")]),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_sources(
            &FindoraConfigFile::default(),
            env_from(&[(API_KEY_ENV, "gsk-test")]),
            false,
        )
        .unwrap();

        assert_eq!(config.api_key.expose_secret(), "gsk-test");
        assert_eq!(config.llm_model, DEFAULT_MODEL);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(config.history_path.ends_with("history.json"));
        assert!(config.voice.enabled);
        assert!((config.voice.tts_speed - DEFAULT_TTS_SPEED).abs() < f64::EPSILON);
    }

    #[test]
    fn env_overrides_file() {
        let mut file = FindoraConfigFile::default();
        file.api_key = Some("from-file".to_string());
        file.llm.model = Some("file-model".to_string());
        file.storage.history_path = Some("/tmp/file-history.json".to_string());

        let config = Config::from_sources(
            &file,
            env_from(&[(API_KEY_ENV, "from-env"), ("FINDORA_MODEL", "env-model")]),
            false,
        )
        .unwrap();

        assert_eq!(config.api_key.expose_secret(), "from-env");
        assert_eq!(config.llm_model, "env-model");
        assert_eq!(config.history_path, PathBuf::from("/tmp/file-history.json"));
    }

    #[test]
    fn file_key_is_used_without_env() {
        let mut file = FindoraConfigFile::default();
        file.api_key = Some("from-file".to_string());

        let config = Config::from_sources(&file, env_from(&[]), false).unwrap();
        assert_eq!(config.api_key.expose_secret(), "from-file");
    }

    #[test]
    fn blank_env_key_falls_back_to_file() {
        let mut file = FindoraConfigFile::default();
        file.api_key = Some("from-file".to_string());

        let config = Config::from_sources(&file, env_from(&[(API_KEY_ENV, "")]), false).unwrap();
        assert_eq!(config.api_key.expose_secret(), "from-file");
    }

    #[test]
    fn blank_keys_everywhere_are_fatal() {
        let mut file = FindoraConfigFile::default();
        file.api_key = Some("  ".to_string());

        let err = Config::from_sources(&file, env_from(&[(API_KEY_ENV, "")]), false).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn disable_voice_wins_over_file() {
        let mut file = FindoraConfigFile::default();
        file.voice.enabled = Some(true);

        let config =
            Config::from_sources(&file, env_from(&[(API_KEY_ENV, "k")]), true).unwrap();
        assert!(!config.voice.enabled);
    }

    #[test]
    fn tts_speed_is_clamped() {
        let mut file = FindoraConfigFile::default();
        file.voice.tts_speed = Some(12.0);

        let config =
            Config::from_sources(&file, env_from(&[(API_KEY_ENV, "k")]), false).unwrap();
        assert!((config.voice.tts_speed - 5.0).abs() < f64::EPSILON);
    }
}
