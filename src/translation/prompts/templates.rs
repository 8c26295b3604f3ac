/*!
 * Prompt templates for subtitle translation.
 *
 * The instruction is fixed; only the line count and the languages vary. The source
 * lines follow as `[1] text` ... `[N] text`, one cue per line.
 */

/// System prompt template for subtitle translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for subtitle translation.
    pub const SUBTITLE_TRANSLATOR: &'static str = r#"You are a professional movie subtitle translator.
Translate the following {count} subtitle segments{source_clause} into {target_language}.

## Important Rules
1. Fix ASR errors: if a segment has repetition (e.g. "no no no no"), translate it naturally. Ignore hallucinated metadata.
2. Strict alignment: output exactly {count} lines. Line N must correspond to input N.
3. Translate each segment independently. Never merge two segments or split one across lines.
4. Start every output line with the marker of its input segment, e.g. "[3] ...".
5. No extras: do not include explanations, notes, or the original text."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default subtitle translator template.
    pub fn subtitle_translator() -> Self {
        Self::new(Self::SUBTITLE_TRANSLATOR)
    }

    /// Render the template for a batch of `count` lines.
    pub fn render(&self, count: usize, source_language: Option<&str>, target_language: &str) -> String {
        let source_clause = source_language
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!(" from {}", s))
            .unwrap_or_default();

        self.template
            .replace("{count}", &count.to_string())
            .replace("{source_clause}", &source_clause)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_translator()
    }
}

/// Builder for the instruction and numbered lines of one request.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: Option<String>,
    target_language: String,
    template: PromptTemplate,
    lines: Vec<String>,
}

impl TranslationPromptBuilder {
    /// Create a new prompt builder.
    pub fn new(source_language: Option<&str>, target_language: &str) -> Self {
        Self {
            source_language: source_language.map(str::to_string),
            target_language: target_language.to_string(),
            template: PromptTemplate::default(),
            lines: Vec::new(),
        }
    }

    /// Set the source lines. Embedded line breaks become spaces.
    pub fn with_lines<S: AsRef<str>>(mut self, lines: &[S]) -> Self {
        self.lines = lines.iter().map(|l| flatten_line(l.as_ref())).collect();
        self
    }

    /// Build the system prompt.
    pub fn build_system_prompt(&self) -> String {
        self.template
            .render(self.lines.len(), self.source_language.as_deref(), &self.target_language)
    }

    /// Build the numbered user prompt.
    pub fn build_user_prompt(&self) -> String {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("[{}] {}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build both system and user prompts.
    pub fn build(&self) -> (String, String) {
        (self.build_system_prompt(), self.build_user_prompt())
    }
}

fn flatten_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promptTemplate_render_shouldReplaceVariables() {
        let rendered = PromptTemplate::subtitle_translator().render(3, Some("English"), "French");

        assert!(rendered.contains("3 subtitle segments from English into French"));
        assert!(rendered.contains("output exactly 3 lines"));
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn test_promptTemplate_render_withoutSource_shouldOmitClause() {
        let rendered = PromptTemplate::subtitle_translator().render(1, None, "Chinese");
        assert!(rendered.contains("1 subtitle segments into Chinese"));
    }

    #[test]
    fn test_translationPromptBuilder_build_shouldNumberFlattenedLines() {
        let (system, user) = TranslationPromptBuilder::new(None, "German")
            .with_lines(&["Hello\nthere", "  Bye  "])
            .build();

        assert!(system.contains("exactly 2 lines"));
        assert_eq!(user, "[1] Hello there\n[2] Bye");
    }
}
