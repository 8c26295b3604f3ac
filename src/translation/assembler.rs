/*!
 * Reassembly of translated lines into the original cue sequence.
 */

use std::collections::BTreeMap;

use crate::errors::TranslationError;
use crate::subtitle_processor::Cue;
use crate::translation::batch::Batch;
use crate::translation::state::TranslationResult;

/// Stitches per-batch results back onto the original cues
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler;

impl Assembler {
    /// Replace the text of every cue with its translated line.
    ///
    /// `layout` is the batch partition the results were produced for. Indices and
    /// timings are taken from `original` untouched.
    pub fn assemble(
        original: &[Cue],
        results: &BTreeMap<usize, TranslationResult>,
        layout: &[Batch],
    ) -> Result<Vec<Cue>, TranslationError> {
        let covered: usize = layout.iter().map(Batch::len).sum();
        if covered != original.len() {
            return Err(TranslationError::IncompleteAssembly(format!(
                "batch layout covers {} cues, input has {}",
                covered,
                original.len()
            )));
        }

        let mut assembled = Vec::with_capacity(original.len());
        let mut position = 0;

        for batch in layout {
            let result = results.get(&batch.batch_id).ok_or_else(|| {
                TranslationError::IncompleteAssembly(format!("no result for batch {}", batch.batch_id))
            })?;

            if result.lines.len() != batch.len() {
                return Err(TranslationError::IncompleteAssembly(format!(
                    "batch {} has {} lines for {} cues",
                    batch.batch_id,
                    result.lines.len(),
                    batch.len()
                )));
            }

            for (cue, line) in batch.cues.iter().zip(&result.lines) {
                let source = &original[position];
                if source.index != cue.index {
                    return Err(TranslationError::IncompleteAssembly(format!(
                        "batch {} is out of order: expected cue {}, found cue {}",
                        batch.batch_id, source.index, cue.index
                    )));
                }
                assembled.push(source.with_text(line.clone()));
                position += 1;
            }
        }

        Ok(assembled)
    }
}
