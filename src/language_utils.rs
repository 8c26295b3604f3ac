use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Languages reach the program either as ISO 639 codes ("zh", "deu", "fre") or as
/// English names ("Chinese"). The model is happy with either; whisper wants an ISO
/// 639-1 code and output files want a short suffix.

// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a code or an English language name
fn lookup(input: &str) -> Option<Language> {
    let normalized = input.trim().to_lowercase();

    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == normalized)
                .map_or(normalized.as_str(), |(_, t)| *t);
            Language::from_639_3(part2t)
        }
        _ => Language::from_name(input.trim()).or_else(|| Language::from_name(&title_case(&normalized))),
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    lookup(code)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang.to_639_1().unwrap_or_else(|| lang.to_639_3()).to_string())
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    lookup(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))
}

/// Name to put in the prompt: codes become English names, anything else is kept as typed
pub fn display_name(language: &str) -> String {
    get_language_name(language).unwrap_or_else(|_| language.trim().to_string())
}

/// Language argument for whisper: an ISO 639-1 code, or `auto` to detect
pub fn whisper_language_code(language: Option<&str>) -> Result<String> {
    match language.map(str::trim) {
        None | Some("") => Ok("auto".to_string()),
        Some(lang) if lang.eq_ignore_ascii_case("auto") => Ok("auto".to_string()),
        Some(lang) => normalize_to_part1_or_part2t(lang),
    }
}

/// Suffix for output files: "Chinese" -> "chinese", "Brazilian Portuguese" -> "brazilian_portuguese"
pub fn output_suffix(target_language: &str) -> String {
    target_language
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
