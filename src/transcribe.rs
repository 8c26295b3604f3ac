/*!
 * Speech recognition through the whisper.cpp command line tool.
 *
 * `whisper-cli -m MODEL -f AUDIO -osrt -of OUT_DIR/STEM -l LANG` writes `OUT_DIR/STEM.srt`,
 * which is then read back as a cue store.
 */

use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::app_config::TranscriptionConfig;
use crate::errors::AppError;
use crate::language_utils;

/// whisper.cpp CLI driver
#[derive(Debug, Clone)]
pub struct Transcriber {
    binary: String,
    model_path: PathBuf,
}

impl Transcriber {
    pub fn new(binary: impl Into<String>, model_path: PathBuf) -> Self {
        Self {
            binary: binary.into(),
            model_path,
        }
    }

    /// Resolve the model name to `MODELS_DIR/ggml-<name>.bin`
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        let model_path = Self::model_file(&config.resolved_models_dir(), &config.model);
        Self::new(config.whisper_binary.clone(), model_path)
    }

    /// Use a different model from the same models directory
    pub fn with_model(mut self, model: &str) -> Self {
        if let Some(dir) = self.model_path.parent() {
            self.model_path = Self::model_file(dir, model);
        }
        self
    }

    pub fn model_file(models_dir: &Path, model: &str) -> PathBuf {
        models_dir.join(format!("ggml-{}.bin", model))
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Arguments passed to the whisper CLI
    pub fn build_args(&self, audio: &Path, output_base: &Path, language: &str) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.model_path.to_string_lossy().to_string(),
            "-f".to_string(),
            audio.to_string_lossy().to_string(),
            "-osrt".to_string(),
            "-of".to_string(),
            output_base.to_string_lossy().to_string(),
            "-l".to_string(),
            language.to_string(),
        ]
    }

    /// Transcribe `audio` into `output_dir/<audio stem>.srt` and return that path
    pub async fn transcribe(
        &self,
        audio: &Path,
        output_dir: &Path,
        source_language: Option<&str>,
    ) -> Result<PathBuf, AppError> {
        if !audio.is_file() {
            return Err(AppError::Transcription(format!("Audio file does not exist: {}", audio.display())));
        }
        if !self.model_path.is_file() {
            return Err(AppError::Transcription(format!(
                "Whisper model not found at {}",
                self.model_path.display()
            )));
        }

        let language = language_utils::whisper_language_code(source_language)
            .map_err(|e| AppError::Transcription(e.to_string()))?;

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "transcript".to_string());
        let output_base = output_dir.join(&stem);
        let srt_path = output_dir.join(format!("{}.srt", stem));

        std::fs::create_dir_all(output_dir)?;

        let args = self.build_args(audio, &output_base, &language);
        info!("Transcribing {} (language: {})", audio.display(), language);
        debug!("Executing {} {:?}", self.binary, args);

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to execute {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "{} exited with {}: {}",
                self.binary, output.status, last_line
            )));
        }

        if !srt_path.is_file() {
            return Err(AppError::Transcription(format!(
                "Expected transcript {} was not produced",
                srt_path.display()
            )));
        }

        info!("Transcript written to {}", srt_path.display());
        Ok(srt_path)
    }
}
