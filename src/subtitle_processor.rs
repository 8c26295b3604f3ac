use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use log::{warn, debug};

// @module: Cue store and SRT reading/writing

// @const: SRT timestamp regex (whisper sometimes emits '.' instead of ',')
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp regex is valid")
});

// @struct: Single timed subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Stable identity, original order
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Cue text
    pub text: String,
}

impl Cue {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Cue {
            index,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    // @creates: Validated cue
    // @validates: start <= end and non-empty text
    pub fn new_validated(index: usize, start_ms: u64, end_ms: u64, text: String) -> Result<Self> {
        if end_ms < start_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} < start time {}",
                end_ms, start_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty subtitle text for cue {}", index));
        }

        Ok(Cue {
            index,
            start_ms,
            end_ms,
            text: trimmed_text.to_string(),
        })
    }

    /// Cue with the same identity and timing but different text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Cue {
            text: text.into(),
            ..self.clone()
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Ordered cues of one subtitle file
#[derive(Debug, Clone)]
pub struct CueStore {
    /// File the cues were read from
    pub source_file: PathBuf,

    /// Cues in original order
    pub cues: Vec<Cue>,
}

impl CueStore {
    pub fn new(source_file: PathBuf, cues: Vec<Cue>) -> Self {
        CueStore { source_file, cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Read and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        let cues = Self::parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;
        Ok(Self::new(path.to_path_buf(), cues))
    }

    /// Render all cues as SRT text
    pub fn to_srt_string(&self) -> String {
        self.cues.iter().map(|cue| cue.to_string()).collect()
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        for cue in &self.cues {
            write!(file, "{}", cue)?;
        }

        Ok(())
    }

    /// Parse SRT format string into cues.
    ///
    /// Blocks with empty text or broken timestamps are skipped with a warning. The result is
    /// sorted by start time and renumbered from 1. An input without a single usable block is
    /// an error; an input that is entirely blank yields an empty list.
    pub fn parse_srt_string(content: &str) -> Result<Vec<Cue>> {
        let content = content.trim_start_matches('\u{feff}');
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut cues = Vec::new();

        let mut current_index: Option<usize> = None;
        let mut current_start_ms: Option<u64> = None;
        let mut current_end_ms: Option<u64> = None;
        let mut current_text = String::new();

        let mut push_cue = |index: usize, start_ms: u64, end_ms: u64, text: &str| {
            match Cue::new_validated(index, start_ms, end_ms, text.to_string()) {
                Ok(cue) => cues.push(cue),
                Err(e) => warn!("Skipping invalid subtitle cue {}: {}", index, e),
            }
        };

        for (line_no, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                if let (Some(index), Some(start_ms), Some(end_ms)) = (current_index, current_start_ms, current_end_ms) {
                    push_cue(index, start_ms, end_ms, &current_text);
                    current_index = None;
                    current_start_ms = None;
                    current_end_ms = None;
                    current_text.clear();
                }
                continue;
            }

            if current_index.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_index = Some(num);
                    continue;
                }
            }

            if current_index.is_some() && current_start_ms.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    current_start_ms = Some(Self::captures_to_ms(&caps, 1));
                    current_end_ms = Some(Self::captures_to_ms(&caps, 5));
                    continue;
                }
                warn!("Invalid timestamp at line {}: {}", line_no + 1, trimmed);
                current_index = None;
                continue;
            }

            if current_start_ms.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                debug!("Ignoring stray text at line {}: {}", line_no + 1, trimmed);
            }
        }

        if let (Some(index), Some(start_ms), Some(end_ms)) = (current_index, current_start_ms, current_end_ms) {
            push_cue(index, start_ms, end_ms, &current_text);
        }

        if cues.is_empty() {
            return Err(anyhow!("No valid subtitle cues were found in the SRT content"));
        }

        // Stable sort keeps equal start times in file order
        cues.sort_by_key(|cue| cue.start_ms);

        for (i, cue) in cues.iter_mut().enumerate() {
            cue.index = i + 1;
        }

        Ok(cues)
    }

    fn captures_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        let part = |offset: usize| -> u64 {
            caps.get(start_idx + offset)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
    }
}

impl fmt::Display for CueStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cue Store")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
