/*!
 * Tests for batch partitioning and subdivision
 */

use movsub::errors::TranslationError;
use movsub::translation::{split_into_batches, Batch};
use crate::common;

#[test]
fn test_split_into_batches_withTenCuesOfFour_shouldGiveFourFourTwo() {
    let cues = common::sample_cues(10);
    let batches = split_into_batches(&cues, 4).unwrap();

    let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
    assert_eq!(sizes, vec![4, 4, 2]);

    let ids: Vec<usize> = batches.iter().map(|b| b.batch_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(batches.iter().all(|b| b.offset == 0 && b.attempt_count == 0));
}

#[test]
fn test_split_into_batches_shouldPreserveOrderAndCoverage() {
    let cues = common::sample_cues(23);
    let batches = split_into_batches(&cues, 5).unwrap();

    let flattened: Vec<usize> = batches.iter().flat_map(|b| b.cue_indices()).collect();
    let expected: Vec<usize> = (1..=23).collect();
    assert_eq!(flattened, expected);
}

#[test]
fn test_split_into_batches_withEmptyInput_shouldBeEmpty() {
    assert!(split_into_batches(&[], 30).unwrap().is_empty());
}

#[test]
fn test_split_into_batches_withZeroSize_shouldBeInvalidConfig() {
    let cues = common::sample_cues(3);
    assert!(matches!(
        split_into_batches(&cues, 0),
        Err(TranslationError::InvalidConfig(_))
    ));
}

#[test]
fn test_subdivide_withOddBatch_shouldKeepIdentityAndOffsets() {
    let cues = common::sample_cues(5);
    let batch = Batch::new(7, cues).retry();

    let halves = batch.subdivide();
    assert_eq!(halves.len(), 2);
    assert_eq!(halves[0].cue_indices(), vec![1, 2, 3]);
    assert_eq!(halves[1].cue_indices(), vec![4, 5]);
    assert_eq!(halves[1].offset, 3);
    assert!(halves.iter().all(|h| h.batch_id == 7 && h.attempt_count == 1));

    let quarters = halves[1].subdivide();
    assert_eq!(quarters[0].offset, 3);
    assert_eq!(quarters[1].offset, 4);
}

#[test]
fn test_subdivide_withSingleCue_shouldReturnItself() {
    let batch = Batch::new(0, common::sample_cues(1));
    let units = batch.subdivide();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].cue_indices(), vec![1]);
}
