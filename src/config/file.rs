//! TOML configuration file loading
//!
//! Supports `~/.config/findora/config.toml` as a persistent config source.
//! All fields are optional, the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FindoraConfigFile {
    /// API key for the completion endpoint (prefer `GROQ_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Storage locations
    #[serde(default)]
    pub storage: StorageFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "llama-3.1-8b-instant")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// System instruction sent ahead of every question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// STT model (e.g. "whisper-large-v3")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_model: Option<String>,

    /// TTS model (e.g. "playai-tts")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_model: Option<String>,

    /// Preferred TTS voice identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_speed: Option<f64>,

    /// Seconds to wait for speech to start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_timeout_secs: Option<u64>,

    /// Maximum seconds of a single spoken phrase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrase_time_limit_secs: Option<u64>,
}

/// History and download locations
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageFileConfig {
    /// Path of the history JSON file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_path: Option<String>,

    /// Directory that receives downloaded responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `FindoraConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> FindoraConfigFile {
    config_file_path().map_or_else(FindoraConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
pub fn load_from(path: &Path) -> FindoraConfigFile {
    if !path.exists() {
        return FindoraConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                FindoraConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            FindoraConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/findora/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("findora").join("config.toml"))
}
