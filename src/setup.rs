//! Interactive first-run setup wizard (`findora setup`)

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{FindoraConfigFile, LlmFileConfig, VoiceFileConfig};
use crate::config::{API_KEY_ENV, DEFAULT_MODEL, DEFAULT_STT_MODEL, DEFAULT_TTS_MODEL, DEFAULT_TTS_SPEED};
use crate::voice::voice_catalogue;

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Findora Setup\n");

    // Load existing config if present
    let existing = crate::config::file::load_config_file();
    let config_path = crate::config::file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/findora/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. API key
    let existing_key = existing.api_key.as_deref();
    let prompt = existing_key.map_or_else(
        || format!("Groq API key (or set {API_KEY_ENV})"),
        |k| format!("Groq API key (current: {}, leave blank to keep)", mask_key(k)),
    );

    let api_key_input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    let api_key = if api_key_input.trim().is_empty() {
        existing_key.map(str::to_string)
    } else {
        Some(api_key_input.trim().to_string())
    };

    // 2. LLM model
    let default_model = existing.llm.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let model: String = Input::new()
        .with_prompt("LLM model")
        .default(default_model.to_string())
        .interact_text()?;

    // 3. Voice (optional)
    let voice_default = existing.voice.enabled.unwrap_or(true);
    let enable_voice = Confirm::new()
        .with_prompt("Enable voice (speak questions, hear answers)?")
        .default(voice_default)
        .interact()?;

    let voice = if enable_voice {
        let tts_model = existing
            .voice
            .tts_model
            .clone()
            .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string());

        let catalogue = voice_catalogue(&tts_model);
        let tts_voice = if catalogue.is_empty() {
            existing.voice.tts_voice.clone()
        } else {
            let default_voice = existing
                .voice
                .tts_voice
                .as_deref()
                .and_then(|v| catalogue.iter().position(|&c| c == v))
                .unwrap_or_else(|| usize::from(catalogue.len() > 1));
            let idx = Select::new()
                .with_prompt("Select a voice")
                .items(catalogue)
                .default(default_voice)
                .interact()?;
            Some(catalogue[idx].to_string())
        };

        let tts_speed: f64 = Input::new()
            .with_prompt("Speech speed")
            .default(existing.voice.tts_speed.unwrap_or(DEFAULT_TTS_SPEED))
            .interact_text()?;

        VoiceFileConfig {
            enabled: Some(true),
            stt_model: Some(
                existing
                    .voice
                    .stt_model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            ),
            tts_model: Some(tts_model),
            tts_voice,
            tts_speed: Some(tts_speed),
            listen_timeout_secs: existing.voice.listen_timeout_secs,
            phrase_time_limit_secs: existing.voice.phrase_time_limit_secs,
        }
    } else {
        VoiceFileConfig {
            enabled: Some(false),
            ..VoiceFileConfig::default()
        }
    };

    // 4. Build and write config
    let config_file = FindoraConfigFile {
        api_key,
        llm: LlmFileConfig {
            model: Some(model),
            base_url: existing.llm.base_url,
            system_prompt: existing.llm.system_prompt,
        },
        voice,
        storage: existing.storage,
    };

    write_config(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());
    println!("\nSetup complete! Run `findora` to start asking.");

    Ok(())
}

/// Show only the ends of a secret
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

/// Serialize and write the config file
fn write_config(path: &Path, config: &FindoraConfigFile) -> anyhow::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}
