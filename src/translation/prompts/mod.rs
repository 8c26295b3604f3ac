/*!
 * Prompt construction for subtitle translation.
 *
 * This module provides:
 * - The fixed instruction template
 * - Numbering of the source lines of one batch
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptTemplate, TranslationPromptBuilder};
