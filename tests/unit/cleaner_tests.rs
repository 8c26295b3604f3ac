/*!
 * Tests for transcript cleaning
 */

use movsub::cleaner::{clean_cues, CleanStats};
use movsub::subtitle_processor::Cue;

#[test]
fn test_clean_cues_withWhisperTranscript_shouldDropNoiseAndMergeRepeats() {
    let cues = vec![
        Cue::new(1, 0, 2000, "♪ ♪"),
        Cue::new(2, 2000, 4000, "Where were you?"),
        Cue::new(3, 4000, 6000, "Where were you?"),
        Cue::new(4, 6000, 8000, "Where were you?"),
        Cue::new(5, 8000, 9000, "[DOOR SLAMS] Out."),
        Cue::new(6, 9000, 10000, "..."),
        Cue::new(7, 10000, 12000, "Subtitles by the Amara.org community"),
    ];

    let (cleaned, stats) = clean_cues(cues);

    assert_eq!(stats, CleanStats { original: 7, after_filter: 4, after_merge: 2 });
    assert_eq!(cleaned.len(), 2);
    assert_eq!(cleaned[0], Cue::new(1, 2000, 8000, "Where were you?"));
    assert_eq!(cleaned[1], Cue::new(2, 8000, 9000, "Out."));
}

#[test]
fn test_clean_cues_withNonConsecutiveRepeats_shouldKeepBoth() {
    let cues = vec![
        Cue::new(1, 0, 1000, "Yes."),
        Cue::new(2, 1000, 2000, "No."),
        Cue::new(3, 2000, 3000, "Yes."),
    ];

    let (cleaned, stats) = clean_cues(cues);
    assert_eq!(stats.after_merge, 3);
    assert_eq!(cleaned.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_clean_cues_withEmptyInput_shouldReturnZeroStats() {
    let (cleaned, stats) = clean_cues(Vec::new());
    assert!(cleaned.is_empty());
    assert_eq!(stats, CleanStats::default());
}
