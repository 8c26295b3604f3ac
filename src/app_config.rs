use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

use crate::errors::TranslationError;
use crate::providers::gemini::DEFAULT_API_URL;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Spoken language of the input; detected when absent
    #[serde(default)]
    pub source_language: Option<String>,

    /// Language to translate into, as a name ("Chinese") or ISO code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Speech recognition config
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Audio extraction config
    #[serde(default)]
    pub audio: AudioConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Full generateContent endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    // @field: API key (GEMINI_API_KEY overrides)
    #[serde(default)]
    pub api_key: String,

    // @field: Cues per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    // @field: Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Retries per cue after the first request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    // @field: Timeout seconds per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 2.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: Split misaligned batches before retrying
    #[serde(default = "default_true")]
    pub subdivide_on_retry: bool,

    /// Backoff before the first retry (in milliseconds), doubled on each further retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            batch_size: default_batch_size(),
            concurrent_requests: default_concurrent_requests(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            subdivide_on_retry: true,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Speech recognition (whisper.cpp) configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    // @field: whisper.cpp CLI executable
    #[serde(default = "default_whisper_binary")]
    pub whisper_binary: String,

    // @field: Model name, resolved to ggml-<model>.bin
    #[serde(default = "default_whisper_model")]
    pub model: String,

    // @field: Directory holding the ggml models
    #[serde(default)]
    pub models_dir: Option<PathBuf>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            whisper_binary: default_whisper_binary(),
            model: default_whisper_model(),
            models_dir: None,
        }
    }
}

impl TranscriptionConfig {
    /// Configured models directory, else `<data dir>/movsub/models`
    pub fn resolved_models_dir(&self) -> PathBuf {
        self.models_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("movsub").join("models"))
                .unwrap_or_else(|| PathBuf::from("models"))
        })
    }
}

/// Audio extraction (ffmpeg) configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    // @field: Explicit ffmpeg executable; searched on PATH otherwise
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    // @field: Upper bound for one extraction
    #[serde(default = "default_audio_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout_secs: default_audio_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "Chinese".to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_batch_size() -> usize {
    30
}

fn default_concurrent_requests() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.2
}

fn default_true() -> bool {
    true
}

fn default_retry_backoff_ms() -> u64 {
    2000 // doubled on each retry
}

fn default_whisper_binary() -> String {
    "whisper-cli".to_string()
}

fn default_whisper_model() -> String {
    "large-v3-turbo".to_string()
}

fn default_audio_timeout_secs() -> u64 {
    3600
}

impl Config {
    /// Load the configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the values every run needs, remote service or not
    pub fn validate_settings(&self) -> Result<(), TranslationError> {
        let invalid = |message: &str| Err(TranslationError::InvalidConfig(message.to_string()));
        let translation = &self.translation;

        if self.target_language.trim().is_empty() {
            return invalid("target language must not be empty");
        }
        if translation.batch_size == 0 {
            return invalid("translation.batch_size must be a positive integer");
        }
        if translation.concurrent_requests == 0 {
            return invalid("translation.concurrent_requests must be a positive integer");
        }
        if translation.timeout_secs == 0 {
            return invalid("translation.timeout_secs must be a positive integer");
        }
        if !(0.0..=2.0).contains(&translation.temperature) {
            return invalid("translation.temperature must be between 0.0 and 2.0");
        }
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), TranslationError> {
        self.validate_settings()?;

        Url::parse(&self.translation.api_url).map_err(|e| {
            TranslationError::InvalidConfig(format!(
                "translation.api_url '{}' is not a valid URL: {}",
                self.translation.api_url, e
            ))
        })?;

        if self.translation.api_key.trim().is_empty() {
            return Err(TranslationError::InvalidConfig(
                "Translation API key is required (set GEMINI_API_KEY or translation.api_key)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: None,
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            transcription: TranscriptionConfig::default(),
            audio: AudioConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
