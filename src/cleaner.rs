/*!
 * Transcript cleaning.
 *
 * Speech recognition output carries sound descriptions, markup and the occasional
 * invented credit line. Cleaning strips those, drops cues left with nothing to say,
 * merges consecutive repeats and renumbers the result from 1.
 */

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::subtitle_processor::Cue;

static HTML_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static BRACKET_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("valid regex"));
// Only all-caps parentheses; "(laughs)" style lowercase asides may be dialog
static CAPS_PAREN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([A-Z\s]+\)").expect("valid regex"));
static ASTERISK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*.*?\*").expect("valid regex"));
static MUSIC_NOTE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[♪♫♬]").expect("valid regex"));
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static PUNCTUATION_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\w\s]+$").expect("valid regex"));

/// Credit and watermark lines the recognizer tends to invent, matched case-insensitively
pub const HALLUCINATION_MARKERS: &[&str] = &[
    "Subtitle by",
    "Translated by",
    "Amara.org",
    "Captioning by",
    "www.",
    ".com",
    "Sync and corrections by",
];

/// Cue counts through the cleaning stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanStats {
    pub original: usize,
    pub after_filter: usize,
    pub after_merge: usize,
}

impl fmt::Display for CleanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} (filtered) -> {} (merged) cues",
            self.original, self.after_filter, self.after_merge
        )
    }
}

/// Clean one cue's text; an empty result means the cue carries nothing worth keeping
pub fn clean_text(text: &str) -> String {
    let text = HTML_TAG_REGEX.replace_all(text, "");
    let text = BRACKET_TAG_REGEX.replace_all(&text, "");
    let text = CAPS_PAREN_REGEX.replace_all(&text, "");
    let text = ASTERISK_REGEX.replace_all(&text, "");
    let text = MUSIC_NOTE_REGEX.replace_all(&text, "");

    let lowered = text.to_lowercase();
    if HALLUCINATION_MARKERS
        .iter()
        .any(|marker| lowered.contains(&marker.to_lowercase()))
    {
        return String::new();
    }

    WHITESPACE_REGEX.replace_all(&text, " ").trim().to_string()
}

/// Empty or punctuation-only
pub fn is_garbage(text: &str) -> bool {
    text.is_empty() || PUNCTUATION_ONLY_REGEX.is_match(text)
}

/// Merge runs of identical text into their first cue, extending its end time
pub fn merge_consecutive_duplicates(cues: Vec<Cue>) -> Vec<Cue> {
    let mut merged: Vec<Cue> = Vec::with_capacity(cues.len());

    for cue in cues {
        match merged.last_mut() {
            Some(last) if last.text.trim() == cue.text.trim() => {
                last.end_ms = last.end_ms.max(cue.end_ms);
            }
            _ => merged.push(cue),
        }
    }

    merged
}

/// Run the whole cleaning pass over `cues`
pub fn clean_cues(cues: Vec<Cue>) -> (Vec<Cue>, CleanStats) {
    let original = cues.len();

    let filtered: Vec<Cue> = cues
        .into_iter()
        .filter_map(|cue| {
            let text = clean_text(&cue.text);
            (!is_garbage(&text)).then(|| Cue { text, ..cue })
        })
        .collect();
    let after_filter = filtered.len();

    let mut merged = merge_consecutive_duplicates(filtered);
    for (i, cue) in merged.iter_mut().enumerate() {
        cue.index = i + 1;
    }

    let stats = CleanStats {
        original,
        after_filter,
        after_merge: merged.len(),
    };
    info!("Cleaning: {}", stats);

    (merged, stats)
}
