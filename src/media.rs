/*!
 * Audio extraction with ffmpeg.
 *
 * Speech recognition wants 16 kHz mono 16-bit PCM, so every input is converted with
 * `ffmpeg -vn -acodec pcm_s16le -ar 16000 -ac 1`. ffmpeg reports progress on stderr as
 * `time=HH:MM:SS.ss` stats lines, which feed a progress bar sized from ffprobe's duration.
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::errors::AppError;

static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("ffmpeg time regex is valid")
});

// Bundled fallback next to the working directory
const BUNDLED_FFMPEG: &str = "tools/ffmpeg/ffmpeg";

/// Runs ffmpeg/ffprobe to turn a media file into recognizer-ready audio
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    ffmpeg: PathBuf,
    ffprobe: Option<PathBuf>,
    timeout: Duration,
}

impl AudioExtractor {
    /// Resolve ffmpeg from the explicit path, then `PATH`, then the bundled copy
    pub fn new(ffmpeg_path: Option<PathBuf>) -> Result<Self, AppError> {
        let ffmpeg = match ffmpeg_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(AppError::Media(format!("ffmpeg not found at {}", path.display())));
                }
                path
            }
            None => find_executable("ffmpeg")
                .or_else(|| {
                    let bundled = PathBuf::from(BUNDLED_FFMPEG);
                    bundled.is_file().then_some(bundled)
                })
                .ok_or_else(|| {
                    AppError::Media("ffmpeg was not found on PATH; install it or set audio.ffmpeg_path".to_string())
                })?,
        };

        // ffprobe usually ships next to ffmpeg
        let ffprobe = ffmpeg
            .parent()
            .and_then(|dir| find_executable_in("ffprobe", dir))
            .or_else(|| find_executable("ffprobe"));

        if ffprobe.is_none() {
            warn!("ffprobe not found, extraction progress will not show a total");
        }

        debug!("Using ffmpeg at {}", ffmpeg.display());
        Ok(Self {
            ffmpeg,
            ffprobe,
            timeout: Duration::from_secs(3600),
        })
    }

    /// Upper bound for one extraction
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe_path(&self) -> Option<&Path> {
        self.ffprobe.as_deref()
    }

    /// Media duration in seconds, 0.0 when it cannot be determined
    pub async fn probe_duration(&self, input: &Path) -> f64 {
        let Some(ffprobe) = &self.ffprobe else {
            return 0.0;
        };

        let output = Command::new(ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(input)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .trim()
                .parse::<f64>()
                .unwrap_or(0.0),
            Ok(output) => {
                debug!("ffprobe failed: {}", String::from_utf8_lossy(&output.stderr).trim());
                0.0
            }
            Err(e) => {
                debug!("Failed to run ffprobe: {}", e);
                0.0
            }
        }
    }

    /// Extract 16 kHz mono PCM audio from `input` into `output`.
    ///
    /// An existing output is reused unless `force` is set.
    pub async fn extract(&self, input: &Path, output: &Path, force: bool) -> Result<PathBuf, AppError> {
        if !input.is_file() {
            return Err(AppError::Media(format!("Input file does not exist: {}", input.display())));
        }
        if output.is_file() && !force {
            info!("Reusing extracted audio {}", output.display());
            return Ok(output.to_path_buf());
        }
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let duration = self.probe_duration(input).await;
        let progress = extraction_progress_bar(duration);

        info!("Extracting audio from {}", input.display());
        let mut child = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-stats"])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Media(format!("Failed to execute ffmpeg: {}", e)))?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Media("ffmpeg stderr was not captured".to_string()))?;

        let pb = progress.clone();
        let run = async move {
            let mut tail = String::new();
            let mut pending = String::new();
            let mut buf = [0u8; 4096];
            loop {
                let read = stderr.read(&mut buf).await?;
                if read == 0 {
                    break;
                }
                pending.push_str(&String::from_utf8_lossy(&buf[..read]));

                // Stats lines end with \r, everything else with \n
                while let Some(pos) = pending.find(['\r', '\n']) {
                    let line: String = pending.drain(..=pos).collect();
                    let line = line.trim();
                    if let Some(seconds) = parse_stats_time(line) {
                        pb.set_position(seconds as u64);
                    } else if !line.is_empty() {
                        tail = line.to_string();
                    }
                }
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, tail))
        };

        let (status, tail) = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                progress.abandon();
                return Err(AppError::Media(format!(
                    "ffmpeg timed out after {}s on {}",
                    self.timeout.as_secs(),
                    input.display()
                )));
            }
        };

        if !status.success() {
            progress.abandon();
            return Err(AppError::Media(format!("Audio extraction failed ({}): {}", status, tail)));
        }

        progress.finish_and_clear();
        info!("Audio written to {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// Seconds encoded in an ffmpeg `time=HH:MM:SS.ss` stats line
pub fn parse_stats_time(line: &str) -> Option<f64> {
    let caps = TIME_REGEX.captures(line)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn extraction_progress_bar(duration_secs: f64) -> ProgressBar {
    let pb = if duration_secs > 0.0 {
        ProgressBar::new(duration_secs.ceil() as u64)
    } else {
        ProgressBar::new_spinner()
    };
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}s audio ({percent}%) {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style.progress_chars("█▓▒░"));
    pb
}

/// First executable named `name` on `PATH`
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// First executable named `name` in the `PATH`-style list `paths`
pub fn find_executable_in(name: &str, paths: impl AsRef<OsStr>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(name, Some(paths), cwd).ok()
}
