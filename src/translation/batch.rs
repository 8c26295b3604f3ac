/*!
 * Batch partitioning of the cue store.
 *
 * Batches are contiguous, ordered and cover the input exactly once. Given the same
 * cues and size the boundaries are always the same, which keeps retries reproducible.
 */

use crate::errors::TranslationError;
use crate::subtitle_processor::Cue;

/// A contiguous run of cues sent as one translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Identity of the top-level batch this unit belongs to
    pub batch_id: usize,

    /// Position of the first cue inside the top-level batch
    pub offset: usize,

    /// Cues in original order
    pub cues: Vec<Cue>,

    /// Number of retries already spent on these cues
    pub attempt_count: u32,
}

impl Batch {
    /// Create a top-level batch
    pub fn new(batch_id: usize, cues: Vec<Cue>) -> Self {
        Self {
            batch_id,
            offset: 0,
            cues,
            attempt_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Source texts in order
    pub fn texts(&self) -> Vec<String> {
        self.cues.iter().map(|cue| cue.text.clone()).collect()
    }

    /// Cue indices in order
    pub fn cue_indices(&self) -> Vec<usize> {
        self.cues.iter().map(|cue| cue.index).collect()
    }

    /// Same cues, one more attempt spent
    pub fn retry(&self) -> Self {
        Self {
            attempt_count: self.attempt_count + 1,
            ..self.clone()
        }
    }

    /// Split into two contiguous halves (the first takes the extra cue).
    ///
    /// A batch with fewer than two cues cannot be split and comes back unchanged.
    pub fn subdivide(&self) -> Vec<Self> {
        if self.cues.len() < 2 {
            return vec![self.clone()];
        }

        let half = self.cues.len().div_ceil(2);
        self.cues
            .chunks(half)
            .scan(self.offset, |offset, chunk| {
                let unit = Self {
                    batch_id: self.batch_id,
                    offset: *offset,
                    cues: chunk.to_vec(),
                    attempt_count: self.attempt_count,
                };
                *offset += chunk.len();
                Some(unit)
            })
            .collect()
    }
}

/// Split cues into contiguous batches of at most `size` cues
pub fn split_into_batches(cues: &[Cue], size: usize) -> Result<Vec<Batch>, TranslationError> {
    if size == 0 {
        return Err(TranslationError::InvalidConfig(
            "batch size must be a positive integer".to_string(),
        ));
    }

    Ok(cues
        .chunks(size)
        .enumerate()
        .map(|(batch_id, chunk)| Batch::new(batch_id, chunk.to_vec()))
        .collect())
}
