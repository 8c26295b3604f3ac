/*!
 * Bounded fan-out of batches over the translation client.
 *
 * Every batch gets its own task up front; a semaphore sized to the configured
 * concurrency decides how many of them are talking to the service at once. The
 * dispatcher classifies each reply and never retries.
 */

use std::collections::HashMap;
use std::sync::Arc;
use log::{debug, error, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::errors::TranslationError;
use crate::translation::alignment::{Alignment, AlignmentVerifier};
use crate::translation::batch::Batch;
use crate::translation::core::TranslationClient;
use crate::translation::state::TranslationResult;

/// Worker pool shared by the first pass and all repairs
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: TranslationClient,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    target_language: String,
    source_language: Option<String>,
}

impl Dispatcher {
    pub fn new(
        client: TranslationClient,
        concurrency: usize,
        target_language: impl Into<String>,
        source_language: Option<String>,
    ) -> Result<Self, TranslationError> {
        if concurrency == 0 {
            return Err(TranslationError::InvalidConfig(
                "concurrency must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            target_language: target_language.into(),
            source_language,
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    /// Translate one unit of work once, holding a pool permit for the request
    pub async fn dispatch(&self, batch: &Batch) -> TranslationResult {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return TranslationResult::failed_with_message(batch, "worker pool is closed"),
        };

        let texts = batch.texts();
        match self
            .client
            .translate(&texts, &self.target_language, self.source_language.as_deref())
            .await
        {
            Ok(reply) => {
                let result = TranslationResult::from_reply(batch, reply);
                match AlignmentVerifier::verify(batch, &result) {
                    Alignment::Aligned => {}
                    Alignment::Misaligned { expected, actual } => debug!(
                        "Batch {} (offset {}, attempt {}): expected {} lines, got {}",
                        batch.batch_id, batch.offset, batch.attempt_count, expected, actual
                    ),
                    Alignment::Misnumbered { expected, position, marker } => debug!(
                        "Batch {} (offset {}, attempt {}): line {} of {} is numbered [{}]",
                        batch.batch_id, batch.offset, batch.attempt_count, position, expected, marker
                    ),
                }
                result
            }
            Err(e) => {
                warn!(
                    "Batch {} (offset {}, attempt {}) failed with {} error: {}",
                    batch.batch_id,
                    batch.offset,
                    batch.attempt_count,
                    e.category(),
                    e
                );
                TranslationResult::failed(batch, &e)
            }
        }
    }

    /// Dispatch every batch once and collect the results by batch id
    pub async fn run(&self, batches: &[Batch]) -> HashMap<usize, TranslationResult> {
        self.run_with_callback(batches, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_result` as each result arrives
    pub async fn run_with_callback<F>(&self, batches: &[Batch], mut on_result: F) -> HashMap<usize, TranslationResult>
    where
        F: FnMut(&TranslationResult),
    {
        let mut tasks = JoinSet::new();
        for batch in batches {
            let dispatcher = self.clone();
            let batch = batch.clone();
            tasks.spawn(async move { dispatcher.dispatch(&batch).await });
        }

        let mut results = HashMap::with_capacity(batches.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    on_result(&result);
                    results.insert(result.batch_id, result);
                }
                Err(e) => error!("Translation task did not complete: {}", e),
            }
        }

        // A task that panicked left no result behind
        for batch in batches {
            if !results.contains_key(&batch.batch_id) {
                let result = TranslationResult::failed_with_message(batch, "translation task did not complete");
                on_result(&result);
                results.insert(batch.batch_id, result);
            }
        }

        results
    }
}
