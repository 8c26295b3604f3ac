/*!
 * Per-batch results and pipeline bookkeeping.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::errors::ProviderError;
use crate::translation::alignment::AlignmentVerifier;
use crate::translation::batch::Batch;
use crate::translation::response::ParsedReply;

/// Outcome class of one translation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Line count matches the batch
    Ok,
    /// The reply had the wrong number of lines
    Misaligned,
    /// The request itself failed
    Failed,
    /// Retries exhausted; some lines are source passthrough
    GaveUp,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "ok",
            Self::Misaligned => "misaligned",
            Self::Failed => "failed",
            Self::GaveUp => "gave up",
        };
        write!(f, "{}", label)
    }
}

/// Lifecycle of a top-level batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Dispatched,
    Retrying,
    Ok,
    GaveUp,
}

impl BatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ok | Self::GaveUp)
    }
}

/// Result of translating one batch or sub-batch
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Top-level batch the lines belong to
    pub batch_id: usize,

    /// Position of the first line inside the top-level batch
    pub offset: usize,

    /// Translated lines; length equals the batch length when `Ok` or `GaveUp`
    pub lines: Vec<String>,

    pub status: BatchStatus,

    /// Attempt that produced this result (0 = first dispatch)
    pub attempt: u32,

    /// Error text of a failed request
    pub error: Option<String>,

    /// Cue indices whose line is the untranslated source text
    pub fallback_indices: Vec<usize>,

    /// Line numbers the reply carried; empty when it was unnumbered or merged from units
    pub markers: Vec<usize>,
}

impl TranslationResult {
    /// Classify a successful request by its line count and numbering
    pub fn from_reply(batch: &Batch, reply: ParsedReply) -> Self {
        let alignment = AlignmentVerifier::check_numbered(batch.len(), reply.lines.len(), &reply.markers);
        let status = if alignment.is_aligned() {
            BatchStatus::Ok
        } else {
            BatchStatus::Misaligned
        };

        Self {
            batch_id: batch.batch_id,
            offset: batch.offset,
            lines: reply.lines,
            status,
            attempt: batch.attempt_count,
            error: None,
            fallback_indices: Vec::new(),
            markers: reply.markers,
        }
    }

    /// Classify unnumbered lines by count alone
    pub fn from_lines(batch: &Batch, lines: Vec<String>) -> Self {
        Self::from_reply(batch, ParsedReply::unnumbered(lines))
    }

    /// A failed request
    pub fn failed(batch: &Batch, error: &ProviderError) -> Self {
        Self::failed_with_message(batch, error.to_string())
    }

    pub fn failed_with_message(batch: &Batch, message: impl Into<String>) -> Self {
        Self {
            batch_id: batch.batch_id,
            offset: batch.offset,
            lines: Vec::new(),
            status: BatchStatus::Failed,
            attempt: batch.attempt_count,
            error: Some(message.into()),
            fallback_indices: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Untranslated source text for every cue of the batch
    pub fn passthrough(batch: &Batch) -> Self {
        Self {
            batch_id: batch.batch_id,
            offset: batch.offset,
            lines: batch.texts(),
            status: BatchStatus::GaveUp,
            attempt: batch.attempt_count,
            error: None,
            fallback_indices: batch.cue_indices(),
            markers: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == BatchStatus::Ok
    }

    /// Ok or GaveUp: nothing more will happen to this batch
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, BatchStatus::Ok | BatchStatus::GaveUp)
    }
}

/// Bookkeeping of one translation run, keyed by top-level batch id
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// Batches not yet in a terminal state
    pub pending: BTreeSet<usize>,

    /// Terminal results (Ok or GaveUp)
    pub completed: BTreeMap<usize, TranslationResult>,

    /// Latest non-terminal failure per batch
    pub failed: BTreeMap<usize, TranslationResult>,

    /// Lifecycle per batch
    pub states: BTreeMap<usize, BatchState>,
}

impl PipelineState {
    /// Fresh state with every batch pending
    pub fn new(batches: &[Batch]) -> Self {
        Self {
            pending: batches.iter().map(|b| b.batch_id).collect(),
            completed: BTreeMap::new(),
            failed: BTreeMap::new(),
            states: batches.iter().map(|b| (b.batch_id, BatchState::Pending)).collect(),
        }
    }

    pub fn mark_dispatched(&mut self, batch_id: usize) {
        self.states.insert(batch_id, BatchState::Dispatched);
    }

    /// Record a first-pass result that still needs repair
    pub fn record_failure(&mut self, result: TranslationResult) {
        self.states.insert(result.batch_id, BatchState::Retrying);
        self.failed.insert(result.batch_id, result);
    }

    /// Record a terminal result. Returns false if the result is not terminal.
    pub fn record_terminal(&mut self, result: TranslationResult) -> bool {
        let state = match result.status {
            BatchStatus::Ok => BatchState::Ok,
            BatchStatus::GaveUp => BatchState::GaveUp,
            _ => return false,
        };

        self.pending.remove(&result.batch_id);
        self.failed.remove(&result.batch_id);
        self.states.insert(result.batch_id, state);
        self.completed.insert(result.batch_id, result);
        true
    }

    pub fn state_of(&self, batch_id: usize) -> Option<BatchState> {
        self.states.get(&batch_id).copied()
    }

    /// Number of batches in a terminal state
    pub fn done(&self) -> usize {
        self.completed.len()
    }

    pub fn total(&self) -> usize {
        self.states.len()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle_processor::Cue;

    fn batch(id: usize, count: usize) -> Batch {
        let cues = (1..=count).map(|i| Cue::new(id * 10 + i, 0, 1, format!("src {}", i))).collect();
        Batch::new(id, cues)
    }

    #[test]
    fn test_from_lines_shouldClassifyByCount() {
        let b = batch(0, 3);
        let ok = TranslationResult::from_lines(&b, vec!["a".into(), "b".into(), "c".into()]);
        let short = TranslationResult::from_lines(&b, vec!["a".into(), "b".into()]);
        assert_eq!(ok.status, BatchStatus::Ok);
        assert_eq!(short.status, BatchStatus::Misaligned);
    }

    #[test]
    fn test_from_reply_withWrongNumbering_shouldBeMisaligned() {
        let b = batch(0, 3);
        let lines: Vec<String> = vec!["A".into(), "B C".into(), "stray".into()];
        let reply = ParsedReply { lines, markers: vec![1, 2, 7] };
        assert_eq!(TranslationResult::from_reply(&b, reply).status, BatchStatus::Misaligned);
    }

    #[test]
    fn test_passthrough_shouldListEveryCue() {
        let b = batch(2, 2);
        let result = TranslationResult::passthrough(&b);
        assert_eq!(result.status, BatchStatus::GaveUp);
        assert_eq!(result.lines, vec!["src 1", "src 2"]);
        assert_eq!(result.fallback_indices, vec![21, 22]);
    }

    #[test]
    fn test_pipelineState_shouldMoveBatchesToTerminal() {
        let batches = vec![batch(0, 1), batch(1, 1)];
        let mut state = PipelineState::new(&batches);
        assert_eq!(state.state_of(0), Some(BatchState::Pending));

        state.mark_dispatched(0);
        state.mark_dispatched(1);
        state.record_failure(TranslationResult::failed_with_message(&batches[1], "boom"));
        assert_eq!(state.state_of(1), Some(BatchState::Retrying));

        assert!(state.record_terminal(TranslationResult::from_lines(&batches[0], vec!["x".into()])));
        assert!(!state.is_finished());
        assert!(state.record_terminal(TranslationResult::passthrough(&batches[1])));

        assert!(state.is_finished());
        assert!(state.failed.is_empty());
        assert_eq!(state.done(), 2);
        assert_eq!(state.state_of(1), Some(BatchState::GaveUp));
    }

    #[test]
    fn test_record_terminal_withMisaligned_shouldRefuse() {
        let b = batch(0, 2);
        let mut state = PipelineState::new(std::slice::from_ref(&b));
        let result = TranslationResult::from_lines(&b, vec!["only".into()]);
        assert!(!state.record_terminal(result));
        assert!(!state.is_finished());
    }
}
