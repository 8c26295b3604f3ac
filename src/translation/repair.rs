/*!
 * Repair of batches whose first dispatch was not aligned.
 *
 * A batch is retried until it aligns or its attempt budget is spent. After a
 * misaligned reply the retry is split in halves, since smaller requests are merged
 * less often; after a failed request the batch is retried whole. Whatever is still
 * unresolved at the end keeps its source text and is reported as a fallback.
 */

use std::time::Duration;
use futures::future::{join_all, BoxFuture, FutureExt};
use log::{info, warn};
use rand::Rng;

use crate::translation::batch::Batch;
use crate::translation::dispatcher::Dispatcher;
use crate::translation::state::{BatchStatus, TranslationResult};

/// What to do with a batch that is not aligned yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    /// Dispatch these units (attempt already incremented)
    Retry(Vec<Batch>),
    /// Budget spent; fall back to the source text
    GiveUp,
}

/// Bounded retry with optional subdivision
#[derive(Debug, Clone)]
pub struct RepairPolicy {
    /// Retries allowed per cue, on top of the first dispatch
    pub max_attempts: u32,

    /// Split misaligned batches in halves before retrying
    pub subdivide_on_retry: bool,

    /// Base delay before the first retry; doubles with every further attempt
    pub retry_backoff: Duration,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            subdivide_on_retry: true,
            retry_backoff: Duration::from_millis(2000),
        }
    }
}

impl RepairPolicy {
    pub fn new(max_attempts: u32, subdivide_on_retry: bool, retry_backoff: Duration) -> Self {
        Self {
            max_attempts,
            subdivide_on_retry,
            retry_backoff,
        }
    }

    /// Decide the next step for `batch` given the result of its latest attempt
    pub fn next_action(&self, batch: &Batch, last_result: &TranslationResult) -> RepairAction {
        if batch.attempt_count >= self.max_attempts {
            return RepairAction::GiveUp;
        }

        let retry = batch.retry();
        if last_result.status == BatchStatus::Misaligned && self.subdivide_on_retry && batch.len() > 1 {
            RepairAction::Retry(retry.subdivide())
        } else {
            RepairAction::Retry(vec![retry])
        }
    }

    /// Delay before dispatching attempt number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if self.retry_backoff.is_zero() || attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(attempt - 1);
        let base = self.retry_backoff.saturating_mul(factor);
        let jitter_ms = rand::rng().random_range(0..=(base.as_millis() / 4) as u64);
        base.saturating_add(Duration::from_millis(jitter_ms))
    }

    /// Drive `batch` to a terminal result.
    ///
    /// Retry units are dispatched concurrently through the shared pool and repaired
    /// recursively; their results are merged back in cue order.
    pub fn repair<'a>(
        &'a self,
        dispatcher: &'a Dispatcher,
        batch: Batch,
        last_result: TranslationResult,
    ) -> BoxFuture<'a, TranslationResult> {
        async move {
            if last_result.is_terminal() {
                return last_result;
            }

            let units = match self.next_action(&batch, &last_result) {
                RepairAction::GiveUp => return self.fallback(&batch),
                RepairAction::Retry(units) => units,
            };

            let attempt = batch.attempt_count + 1;
            let delay = self.backoff_delay(attempt);
            info!(
                "Retrying batch {} (offset {}, {} cues) as {} unit(s), attempt {}/{}{}",
                batch.batch_id,
                batch.offset,
                batch.len(),
                units.len(),
                attempt,
                self.max_attempts,
                match &last_result.error {
                    Some(e) => format!(" after error: {}", e),
                    None => format!(" after {} misaligned lines", last_result.lines.len()),
                }
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let first_pass = join_all(units.iter().map(|unit| dispatcher.dispatch(unit))).await;
            let unit_results = join_all(units.into_iter().zip(first_pass).map(move |(unit, result)| async move {
                if result.is_ok() {
                    result
                } else {
                    self.repair(dispatcher, unit, result).await
                }
            }))
            .await;

            self.merge(&batch, unit_results)
        }
        .boxed()
    }

    /// Passthrough result for a batch that could not be repaired
    pub fn fallback(&self, batch: &Batch) -> TranslationResult {
        let result = TranslationResult::passthrough(batch);
        warn!(
            "Batch {} gave up after {} attempt(s); cues {:?} keep their source text",
            batch.batch_id,
            batch.attempt_count + 1,
            result.fallback_indices
        );
        result
    }

    /// Join the terminal results of contiguous units back into one result for `batch`
    pub fn merge(&self, batch: &Batch, unit_results: Vec<TranslationResult>) -> TranslationResult {
        let mut lines = Vec::with_capacity(batch.len());
        let mut fallback_indices = Vec::new();
        let mut attempt = batch.attempt_count;
        let mut all_ok = true;

        for result in unit_results {
            all_ok &= result.is_ok();
            attempt = attempt.max(result.attempt);
            fallback_indices.extend(result.fallback_indices);
            lines.extend(result.lines);
        }

        if lines.len() != batch.len() {
            warn!(
                "Repaired units of batch {} produced {} lines for {} cues",
                batch.batch_id,
                lines.len(),
                batch.len()
            );
            return self.fallback(batch);
        }

        TranslationResult {
            batch_id: batch.batch_id,
            offset: batch.offset,
            lines,
            status: if all_ok { BatchStatus::Ok } else { BatchStatus::GaveUp },
            attempt,
            error: None,
            fallback_indices,
            markers: Vec::new(),
        }
    }
}
