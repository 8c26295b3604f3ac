/*!
 * Tests for cue parsing and SRT output
 */

use std::fmt::Write;
use anyhow::Result;
use movsub::subtitle_processor::{Cue, CueStore};
use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = Cue::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5025678);
    assert_eq!(Cue::format_timestamp(ms), ts);
}

#[test]
fn test_cue_display_withMultilineText_shouldRenderOneBlock() {
    let cue = Cue::new(3, 61234, 65432, "Hello\nWorld");
    let mut output = String::new();
    write!(output, "{}", cue).unwrap();
    assert_eq!(output, "3\n00:01:01,234 --> 00:01:05,432\nHello\nWorld\n\n");
}

#[test]
fn test_from_srt_file_withWrittenStore_shouldKeepTimingAndText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "input.srt", 4)?;

    let store = CueStore::from_srt_file(&path)?;
    assert_eq!(store.cues, common::sample_cues(4));

    let out = temp_dir.path().join("nested").join("out.srt");
    store.write_to_srt(&out)?;
    let reread = CueStore::from_srt_file(&out)?;
    assert_eq!(reread.cues, store.cues);
    Ok(())
}

#[test]
fn test_parse_srt_string_withCrlfAndBom_shouldParse() -> Result<()> {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,500\r\nBonjour\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nSalut\r\n";
    let cues = CueStore::parse_srt_string(content)?;
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0], Cue::new(1, 1000, 2500, "Bonjour"));
    assert_eq!(cues[1].text, "Salut");
    Ok(())
}

#[test]
fn test_parse_srt_string_withUnsortedBlocks_shouldSortAndRenumber() -> Result<()> {
    let content = "5\n00:00:09,000 --> 00:00:10,000\nLater\n\n2\n00:00:01,000 --> 00:00:02,000\nEarlier\n";
    let cues = CueStore::parse_srt_string(content)?;
    assert_eq!(cues[0], Cue::new(1, 1000, 2000, "Earlier"));
    assert_eq!(cues[1], Cue::new(2, 9000, 10000, "Later"));
    Ok(())
}
