/*!
 * Alignment verification: does a result have exactly one line per cue?
 *
 * Counting lines is not enough on its own: a reply can merge two lines and invent a
 * third, keeping the count. When the reply was numbered, the numbers must be
 * exactly 1..=N in order.
 */

use crate::translation::batch::Batch;
use crate::translation::state::{BatchStatus, TranslationResult};

/// Verdict of the alignment check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Aligned,
    Misaligned { expected: usize, actual: usize },
    /// Right count, but the reply numbered its lines wrong starting at `position`
    Misnumbered { expected: usize, position: usize, marker: usize },
}

impl Alignment {
    pub fn is_aligned(self) -> bool {
        self == Self::Aligned
    }
}

/// Pure line-count check between a batch and its translation
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentVerifier;

impl AlignmentVerifier {
    pub fn check(expected: usize, actual: usize) -> Alignment {
        if expected == actual {
            Alignment::Aligned
        } else {
            Alignment::Misaligned { expected, actual }
        }
    }

    /// Line count plus, for a numbered reply, the numbers themselves
    pub fn check_numbered(expected: usize, actual: usize, markers: &[usize]) -> Alignment {
        let by_count = Self::check(expected, actual);
        if !by_count.is_aligned() || markers.is_empty() {
            return by_count;
        }
        if markers.len() != actual {
            return Alignment::Misaligned { expected, actual: markers.len() };
        }

        match markers.iter().enumerate().find(|&(i, &marker)| marker != i + 1) {
            Some((i, &marker)) => Alignment::Misnumbered {
                expected,
                position: i + 1,
                marker,
            },
            None => Alignment::Aligned,
        }
    }

    /// A failed request is never aligned, whatever its line count.
    pub fn verify(batch: &Batch, result: &TranslationResult) -> Alignment {
        match result.status {
            BatchStatus::Failed => Alignment::Misaligned {
                expected: batch.len(),
                actual: 0,
            },
            _ => Self::check_numbered(batch.len(), result.lines.len(), &result.markers),
        }
    }
}
