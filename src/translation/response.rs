/*!
 * Decomposition of a free-form model reply into translated lines.
 *
 * The parser normalises what it safely can (code fences, blank lines, preambles,
 * numbering, reordering) and never pads. A reply with the wrong number of lines
 * comes out with the wrong number of lines. A numbered line with no text counts as
 * missing. The line numbers of a numbered reply are kept so alignment can check them.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ProviderError;

// `[3] text`, or `3. text` / `3) text` / `3: text` with whitespace after the punctuation
static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\[(\d+)\]\s*|(\d+)[.):](?:\s+|$))(.*)$").expect("marker regex is valid")
});

/// Lines of one reply, with the numbers the model put in front of them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    pub lines: Vec<String>,

    /// One number per line, in output order; empty when the reply was not numbered
    pub markers: Vec<usize>,
}

impl ParsedReply {
    /// Reply without line numbers
    pub fn unnumbered(lines: Vec<String>) -> Self {
        Self {
            lines,
            markers: Vec::new(),
        }
    }

    pub fn is_numbered(&self) -> bool {
        !self.markers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Parser for translation replies
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Split a reply into ordered output lines
    pub fn parse(text: &str) -> Result<ParsedReply, ProviderError> {
        let candidates: Vec<(Option<usize>, String)> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("```"))
            .map(Self::split_marker)
            .collect();

        if candidates.is_empty() {
            return Err(ProviderError::ParseError("response contains no lines".to_string()));
        }

        if !candidates.iter().any(|(marker, _)| marker.is_some()) {
            return Ok(ParsedReply::unnumbered(
                candidates.into_iter().map(|(_, line)| line).collect(),
            ));
        }

        // Unnumbered lines next to numbered ones are commentary
        let mut numbered: Vec<(usize, String)> = candidates
            .into_iter()
            .filter_map(|(marker, line)| marker.map(|m| (m, line)))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        if Self::is_permutation(&numbered) {
            numbered.sort_by_key(|(marker, _)| *marker);
        }

        let (markers, lines) = numbered.into_iter().unzip();
        Ok(ParsedReply { lines, markers })
    }

    fn split_marker(line: &str) -> (Option<usize>, String) {
        match MARKER_REGEX.captures(line) {
            Some(caps) => {
                let marker = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .and_then(|m| m.as_str().parse::<usize>().ok());
                let rest = caps.get(3).map_or("", |m| m.as_str()).trim().to_string();
                match marker {
                    Some(marker) => (Some(marker), rest),
                    None => (None, line.to_string()),
                }
            }
            None => (None, line.to_string()),
        }
    }

    /// True when the markers are exactly 1..=k in some order
    fn is_permutation(numbered: &[(usize, String)]) -> bool {
        let mut seen = vec![false; numbered.len()];
        for (marker, _) in numbered {
            match marker.checked_sub(1).and_then(|i| seen.get_mut(i)) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}
