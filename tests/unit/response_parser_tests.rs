/*!
 * Tests for decomposing model replies into lines
 */

use movsub::errors::{FailureCategory, ProviderError};
use movsub::translation::alignment::AlignmentVerifier;
use movsub::translation::response::ResponseParser;

#[test]
fn test_parse_withChattyReply_shouldDropCommentary() {
    let reply = "Sure! Here are the 3 translated lines:\n\n[1] 一\n[2] 二\n[3] 三\n\nLet me know if you need anything else.";
    assert_eq!(ResponseParser::parse(reply).unwrap().lines, vec!["一", "二", "三"]);
}

#[test]
fn test_parse_withMergedLines_shouldNotPad() {
    // Two markers for three inputs stays two lines
    let reply = "[1] 一 二\n[2] 三";
    let parsed = ResponseParser::parse(reply).unwrap();
    assert_eq!(parsed.len(), 2);
    assert!(!AlignmentVerifier::check_numbered(3, parsed.len(), &parsed.markers).is_aligned());
}

#[test]
fn test_parse_withDuplicateMarkers_shouldKeepEmittedOrderAndFailAlignment() {
    let parsed = ResponseParser::parse("[1] a\n[1] b\n[2] c").unwrap();
    assert_eq!(parsed.lines, vec!["a", "b", "c"]);
    assert_eq!(parsed.markers, vec![1, 1, 2]);
    assert!(!AlignmentVerifier::check_numbered(3, parsed.len(), &parsed.markers).is_aligned());
}

#[test]
fn test_parse_withInventedMarker_shouldFailAlignmentDespiteCount() {
    let parsed = ResponseParser::parse("[1] A\n[2] B C\n[7] stray").unwrap();
    assert_eq!(parsed.len(), 3);
    assert!(!AlignmentVerifier::check_numbered(3, parsed.len(), &parsed.markers).is_aligned());
}

#[test]
fn test_parse_withOnlyWhitespace_shouldBeParseError() {
    let error = ResponseParser::parse(" \n\n```\n```").unwrap_err();
    assert!(matches!(error, ProviderError::ParseError(_)));
    assert_eq!(error.category(), FailureCategory::Parse);
}

#[test]
fn test_parse_withEmptyMarkedLine_shouldTreatItAsMissing() {
    let parsed = ResponseParser::parse("[1] a\n[2]\n[3] c").unwrap();
    assert_eq!(parsed.lines, vec!["a", "c"]);
    assert!(!AlignmentVerifier::check_numbered(3, parsed.len(), &parsed.markers).is_aligned());
}
