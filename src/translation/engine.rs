/*!
 * Batch translation engine.
 *
 * One run goes through four steps: split the cues into batches, fan all of them out
 * once, repair every batch that did not come back aligned, then reassemble. Failures
 * stay local to their batch; only configuration and assembly errors end a run.
 */

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{info, warn};

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::subtitle_processor::Cue;
use crate::translation::assembler::Assembler;
use crate::translation::batch::{split_into_batches, Batch};
use crate::translation::core::{TokenUsageStats, TranslationClient};
use crate::translation::dispatcher::Dispatcher;
use crate::translation::repair::RepairPolicy;
use crate::translation::state::PipelineState;

/// Tunables of one translation run
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Cues per request
    pub batch_size: usize,

    /// Requests in flight at once
    pub concurrency: usize,

    /// Retries per cue after the first dispatch
    pub max_attempts: u32,

    pub target_language: String,

    /// Left to the model when absent
    pub source_language: Option<String>,

    pub subdivide_on_retry: bool,

    pub retry_backoff: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            batch_size: 30,
            concurrency: 10,
            max_attempts: 2,
            target_language: "Chinese".to_string(),
            source_language: None,
            subdivide_on_retry: true,
            retry_backoff: Duration::from_millis(2000),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.translation.batch_size,
            concurrency: config.translation.concurrent_requests,
            max_attempts: config.translation.max_attempts,
            target_language: config.target_language.clone(),
            source_language: config.source_language.clone(),
            subdivide_on_retry: config.translation.subdivide_on_retry,
            retry_backoff: Duration::from_millis(config.translation.retry_backoff_ms),
        }
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<(), TranslationError> {
        if self.batch_size == 0 {
            return Err(TranslationError::InvalidConfig("batch size must be a positive integer".to_string()));
        }
        if self.concurrency == 0 {
            return Err(TranslationError::InvalidConfig("concurrency must be a positive integer".to_string()));
        }
        if self.target_language.trim().is_empty() {
            return Err(TranslationError::InvalidConfig("target language must not be empty".to_string()));
        }
        Ok(())
    }
}

/// What happened during one run
#[derive(Debug, Clone)]
pub struct TranslationReport {
    pub total_cues: usize,
    pub total_batches: usize,

    /// Batches aligned on their first dispatch
    pub first_pass_ok: usize,

    /// Batches that needed and survived repair
    pub repaired_batches: Vec<usize>,

    /// Batches with at least one passthrough cue
    pub gave_up_batches: Vec<usize>,

    /// Cue indices left untranslated, ascending
    pub fallback_indices: Vec<usize>,

    pub token_usage: TokenUsageStats,
    pub elapsed: Duration,
}

impl TranslationReport {
    fn empty(token_usage: TokenUsageStats) -> Self {
        Self {
            total_cues: 0,
            total_batches: 0,
            first_pass_ok: 0,
            repaired_batches: Vec::new(),
            gave_up_batches: Vec::new(),
            fallback_indices: Vec::new(),
            token_usage,
            elapsed: Duration::ZERO,
        }
    }

    /// Every cue was translated
    pub fn is_complete(&self) -> bool {
        self.fallback_indices.is_empty()
    }

    /// Generate a human readable summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Translated {} cues in {} batches in {:.1}s: {} aligned first time, {} repaired, {} gave up",
            self.total_cues,
            self.total_batches,
            self.elapsed.as_secs_f64(),
            self.first_pass_ok,
            self.repaired_batches.len(),
            self.gave_up_batches.len()
        );
        if !self.is_complete() {
            summary.push_str(&format!(
                "\n{} cue(s) kept their source text: {:?}",
                self.fallback_indices.len(),
                self.fallback_indices
            ));
        }
        summary
    }
}

impl fmt::Display for TranslationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Translated cues plus the run report
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub cues: Vec<Cue>,
    pub report: TranslationReport,
}

/// Batch translator for a whole cue sequence
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    client: TranslationClient,
    settings: EngineSettings,
    policy: RepairPolicy,
}

impl BatchTranslator {
    /// Create a translator; invalid settings fail here, before any request
    pub fn new(client: TranslationClient, settings: EngineSettings) -> Result<Self, TranslationError> {
        settings.validate()?;
        let policy = RepairPolicy::new(settings.max_attempts, settings.subdivide_on_retry, settings.retry_backoff);
        Ok(Self { client, settings, policy })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    /// Translate `cues`, preserving count, order, indices and timing.
    ///
    /// `progress(done, total)` is called each time a batch reaches a terminal state.
    pub async fn translate(
        &self,
        cues: &[Cue],
        progress: impl Fn(usize, usize) + Send + Sync,
    ) -> Result<TranslationOutcome, TranslationError> {
        if cues.is_empty() {
            return Ok(TranslationOutcome {
                cues: Vec::new(),
                report: TranslationReport::empty(self.client.token_usage()),
            });
        }

        let start = Instant::now();
        let batches = split_into_batches(cues, self.settings.batch_size)?;
        let dispatcher = Dispatcher::new(
            self.client.clone(),
            self.settings.concurrency,
            self.settings.target_language.clone(),
            self.settings.source_language.clone(),
        )?;

        let total = batches.len();
        info!(
            "Translating {} cues in {} batches of up to {} ({} concurrent requests)",
            cues.len(),
            total,
            self.settings.batch_size,
            self.settings.concurrency
        );

        let mut state = PipelineState::new(&batches);
        for batch in &batches {
            state.mark_dispatched(batch.batch_id);
        }

        dispatcher
            .run_with_callback(&batches, |result| {
                if result.is_ok() {
                    state.record_terminal(result.clone());
                    progress(state.done(), total);
                } else {
                    state.record_failure(result.clone());
                }
            })
            .await;

        let first_pass_ok = state.done();
        let by_id: HashMap<usize, &Batch> = batches.iter().map(|b| (b.batch_id, b)).collect();

        let mut repairs: FuturesUnordered<_> = state
            .failed
            .values()
            .filter_map(|result| {
                by_id
                    .get(&result.batch_id)
                    .map(|batch| self.policy.repair(&dispatcher, (*batch).clone(), result.clone()))
            })
            .collect();

        if !repairs.is_empty() {
            info!("{} of {} batches need repair", repairs.len(), total);
        }

        let mut repaired_batches = Vec::new();
        let mut gave_up_batches = Vec::new();

        while let Some(result) = repairs.next().await {
            let batch_id = result.batch_id;
            let result = if result.is_terminal() {
                result
            } else {
                match by_id.get(&batch_id) {
                    Some(batch) => self.policy.fallback(batch),
                    None => continue,
                }
            };

            if result.is_ok() {
                repaired_batches.push(batch_id);
            } else {
                gave_up_batches.push(batch_id);
            }
            state.record_terminal(result);
            progress(state.done(), total);
        }
        drop(repairs);

        if !state.is_finished() {
            return Err(TranslationError::IncompleteAssembly(format!(
                "batches {:?} never reached a terminal state",
                state.pending
            )));
        }

        let translated = Assembler::assemble(cues, &state.completed, &batches)?;

        repaired_batches.sort_unstable();
        gave_up_batches.sort_unstable();
        let mut fallback_indices: Vec<usize> = state
            .completed
            .values()
            .flat_map(|r| r.fallback_indices.iter().copied())
            .collect();
        fallback_indices.sort_unstable();

        let report = TranslationReport {
            total_cues: cues.len(),
            total_batches: total,
            first_pass_ok,
            repaired_batches,
            gave_up_batches,
            fallback_indices,
            token_usage: self.client.token_usage(),
            elapsed: start.elapsed(),
        };

        if report.is_complete() {
            info!("{}", report.summary());
        } else {
            warn!("{}", report.summary());
        }

        Ok(TranslationOutcome { cues: translated, report })
    }
}
