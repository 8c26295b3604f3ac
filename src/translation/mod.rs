/*!
 * Concurrent batch translation of subtitle cues.
 *
 * The engine is split into several submodules:
 *
 * - `batch`: partitioning of cues into contiguous batches
 * - `prompts`: instruction template and numbered source lines
 * - `response`: decomposition of a model reply into lines
 * - `core`: translation client and token usage statistics
 * - `state`: per-batch results and pipeline bookkeeping
 * - `dispatcher`: bounded fan-out over the client
 * - `alignment`: line-count verification
 * - `repair`: bounded retry, subdivision and passthrough fallback
 * - `assembler`: reassembly onto the original cues
 * - `engine`: the whole run wired together
 */

// Re-export main types for easier usage
pub use self::batch::{split_into_batches, Batch};
pub use self::core::{TokenUsageStats, TranslationClient};
pub use self::engine::{BatchTranslator, EngineSettings, TranslationOutcome, TranslationReport};
pub use self::state::{BatchState, BatchStatus, PipelineState, TranslationResult};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod alignment;
pub mod assembler;
pub mod batch;
pub mod core;
pub mod dispatcher;
pub mod engine;
pub mod prompts;
pub mod repair;
pub mod response;
pub mod state;
