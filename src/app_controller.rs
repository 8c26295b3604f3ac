use anyhow::{Result, Context, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, warn, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::cleaner::{self, CleanStats};
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::media::AudioExtractor;
use crate::subtitle_processor::{Cue, CueStore};
use crate::transcribe::Transcriber;
use crate::translation::{BatchTranslator, EngineSettings, TranslationClient, TranslationOutcome};

// @module: Application controller for the video to translated subtitle pipeline

/// Per-run switches that do not belong in the config file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    // @field: Replace an existing output file
    pub force_overwrite: bool,

    // @field: Keep extracted audio and transcripts in <stem>.work
    pub keep_temp: bool,

    // @field: Whisper model override
    pub whisper_model: Option<String>,
}

/// Counts for one folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Shared translation client
    client: TranslationClient,
}

impl Controller {
    // @method: Create a controller talking to the configured remote service
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let client = TranslationClient::from_config(&config.translation)?;
        Ok(Self { config, client })
    }

    /// Create a controller around an existing client (used with the mock provider)
    pub fn with_client(config: Config, client: TranslationClient) -> Result<Self> {
        config.validate_settings()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output path for `input_file` in `output_dir`
    pub fn output_path_for(&self, input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(input_file, output_dir, &self.config.target_language)
    }

    /// Run the whole pipeline for one file.
    ///
    /// Returns the written subtitle path, or `None` when the output already existed.
    pub async fn run(&self, input_file: &Path, output_dir: &Path, options: &RunOptions) -> Result<Option<PathBuf>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, output_dir, options, &multi_progress).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        options: &RunOptions,
        multi_progress: &MultiProgress,
    ) -> Result<Option<PathBuf>> {
        let start_time = Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(output_dir)?;

        let output_path = self.output_path_for(input_file, output_dir);
        if output_path.exists() && !options.force_overwrite {
            warn!(
                "Skipping {}, {} already exists (use -f to force overwrite)",
                input_file.display(),
                output_path.display()
            );
            return Ok(None);
        }

        let file_type = FileManager::detect_file_type(input_file)?;
        let cues = match file_type {
            FileType::Subtitle => {
                info!("Detected subtitle file, skipping extraction and transcription");
                CueStore::from_srt_file(input_file)?.cues
            }
            FileType::Video | FileType::Audio => {
                self.transcribe_to_cues(input_file, output_dir, options).await?
            }
            FileType::Unknown => {
                return Err(anyhow!("Unsupported input file: {}", input_file.display()));
            }
        };

        let preparation_time = start_time.elapsed();

        let outcome = self.translate_cues_with_progress(&cues, multi_progress).await?;

        CueStore::new(output_path.clone(), outcome.cues).write_to_srt(&output_path)?;
        info!("Success: {}", output_path.display());

        info!(
            "Done in {}. Preparation: {} - Translation: {}",
            Self::format_duration(start_time.elapsed()),
            Self::format_duration(preparation_time),
            Self::format_duration(outcome.report.elapsed)
        );

        Ok(Some(output_path))
    }

    /// Extract audio, transcribe and clean a media file
    async fn transcribe_to_cues(&self, input_file: &Path, output_dir: &Path, options: &RunOptions) -> Result<Vec<Cue>> {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());

        // Temporary files vanish with the guard unless asked to keep them
        let (work_dir, _guard) = if options.keep_temp {
            let dir = output_dir.join(format!("{}.work", stem));
            FileManager::ensure_dir(&dir)?;
            (dir, None)
        } else {
            let temp = tempfile::Builder::new()
                .prefix("movsub-")
                .tempdir()
                .context("Failed to create temporary directory")?;
            (temp.path().to_path_buf(), Some(temp))
        };

        let audio_path = work_dir.join(format!("{}.wav", stem));
        let audio = Self::extractor(&self.config)?
            .extract(input_file, &audio_path, options.force_overwrite)
            .await?;

        let mut transcriber = Transcriber::from_config(&self.config.transcription);
        if let Some(model) = &options.whisper_model {
            transcriber = transcriber.with_model(model);
        }
        let transcript = transcriber
            .transcribe(&audio, &work_dir, self.config.source_language.as_deref())
            .await?;

        let store = CueStore::from_srt_file(&transcript)?;
        let (cues, _stats) = cleaner::clean_cues(store.cues);

        if options.keep_temp {
            let cleaned_path = work_dir.join(format!("{}.clean.srt", stem));
            CueStore::new(cleaned_path.clone(), cues.clone()).write_to_srt(&cleaned_path)?;
            info!("Intermediate files kept in {}", work_dir.display());
        }

        if cues.is_empty() {
            warn!("No speech left after cleaning {}", input_file.display());
        }

        Ok(cues)
    }

    /// Translate cues with a batch progress bar; fallback warnings come after the bar is gone
    async fn translate_cues_with_progress(&self, cues: &[Cue], multi_progress: &MultiProgress) -> Result<TranslationOutcome> {
        let mut settings = EngineSettings::from_config(&self.config);
        settings.target_language = language_utils::display_name(&self.config.target_language);
        let translator = BatchTranslator::new(self.client.clone(), settings)?;

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let outcome = translator
            .translate(cues, move |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            })
            .await?;

        progress_bar.finish_and_clear();

        let report = &outcome.report;
        if !report.is_complete() {
            warn!(
                "{} of {} cues kept their source text after {} repair attempt(s)",
                report.fallback_indices.len(),
                report.total_cues,
                translator.settings().max_attempts
            );
            for index in &report.fallback_indices {
                warn!("Cue {} was not translated", index);
            }
        }

        if report.token_usage.total_tokens > 0 {
            info!("{}", report.token_usage.summary());
        }

        Ok(outcome)
    }

    /// Process every media or subtitle file beneath `input_dir`.
    ///
    /// Outputs go to `output_dir` when given, otherwise next to each input.
    pub async fn run_folder(&self, input_dir: &Path, output_dir: Option<&Path>, options: &RunOptions) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_media_files(input_dir)?;
        if files.is_empty() {
            return Err(anyhow!("No video, audio or subtitle files found in directory: {:?}", input_dir));
        }

        if let Err(e) = self.client.test_connection().await {
            warn!("Translation service check failed, continuing anyway: {}", e);
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut summary = FolderSummary::default();

        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = match output_dir {
                Some(dir) => dir.to_path_buf(),
                None => file.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.to_path_buf()),
            };

            match self.run_with_progress(file, &output_dir, options, &multi_progress).await {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed in {}: {} processed, {} skipped, {} errors",
            Self::format_duration(start_time.elapsed()),
            summary.processed,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    /// Clean an SRT file in place, or into `output` when given
    pub fn clean_file(input: &Path, output: Option<&Path>) -> Result<CleanStats> {
        let store = CueStore::from_srt_file(input)?;
        let (cues, stats) = cleaner::clean_cues(store.cues);

        let out_path = output.unwrap_or(input);
        CueStore::new(out_path.to_path_buf(), cues).write_to_srt(out_path)?;
        info!("Cleaned subtitles written to {}", out_path.display());

        Ok(stats)
    }

    /// Extract recognizer-ready audio; defaults to `<input stem>.wav` next to the input
    pub async fn extract_audio(config: &Config, input: &Path, output: Option<&Path>, force: bool) -> Result<PathBuf> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("wav"));
        let path = Self::extractor(config)?.extract(input, &output, force).await?;
        Ok(path)
    }

    fn extractor(config: &Config) -> Result<AudioExtractor> {
        Ok(AudioExtractor::new(config.audio.ffmpeg_path.clone())?
            .with_timeout(Duration::from_secs(config.audio.timeout_secs)))
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
