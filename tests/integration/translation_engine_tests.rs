/*!
 * End-to-end runs of the batch translation engine against the mock provider
 */

use std::time::Duration;

use movsub::errors::TranslationError;
use movsub::providers::mock::{MockProvider, MockReply};
use movsub::subtitle_processor::Cue;
use movsub::translation::{BatchTranslator, EngineSettings};
use tokio_test::assert_ok;
use crate::common;

fn translator(provider: &MockProvider, settings: EngineSettings) -> BatchTranslator {
    BatchTranslator::new(common::mock_client(provider, Duration::from_secs(5)), settings).unwrap()
}

fn assert_same_timing(input: &[Cue], output: &[Cue]) {
    assert_eq!(input.len(), output.len());
    for (before, after) in input.iter().zip(output) {
        assert_eq!(before.index, after.index);
        assert_eq!(before.start_ms, after.start_ms);
        assert_eq!(before.end_ms, after.end_ms);
    }
}

/// Reply with `n` numbered lines for whatever was asked
fn numbered_reply(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| format!("[{}] [TRANSLATED] {}", i + 1, l))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_translate_withTenCuesInBatchesOfFour_shouldSendThreeRequests() {
    common::init_test_logging();
    let provider = MockProvider::working();
    let engine = translator(&provider, common::engine_settings(4, 3));
    let input = common::sample_cues(10);

    let outcome = assert_ok!(engine.translate(&input, |_, _| {}).await);

    let mut sizes = provider.batch_sizes();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![2, 4, 4]);
    assert_same_timing(&input, &outcome.cues);
    for cue in &outcome.cues {
        assert_eq!(cue.text, format!("[TRANSLATED] line {}", cue.index));
    }
    assert_eq!(outcome.report.total_batches, 3);
    assert_eq!(outcome.report.first_pass_ok, 3);
    assert!(outcome.report.is_complete());
}

#[tokio::test]
async fn test_translate_withMergedReply_shouldRecoverBySubdivision() {
    common::init_test_logging();
    let provider = MockProvider::merging(3);
    let engine = translator(&provider, common::engine_settings(3, 2));
    let input = common::sample_cues(3);

    let outcome = engine.translate(&input, |_, _| {}).await.unwrap();

    let mut sizes = provider.batch_sizes();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1, 2, 3]);
    assert_eq!(outcome.report.repaired_batches, vec![0]);
    assert!(outcome.report.fallback_indices.is_empty());
    assert_eq!(outcome.cues[1].text, "[TRANSLATED] line 2");
    assert_same_timing(&input, &outcome.cues);
}

#[tokio::test]
async fn test_translate_withIntermittentFailure_shouldRetryWholeBatchAndRecover() {
    common::init_test_logging();
    // Every third request fails: exactly one of the three first-pass requests
    let provider = MockProvider::intermittent(3);
    let engine = translator(&provider, common::engine_settings(4, 3));
    let input = common::sample_cues(10);

    let outcome = assert_ok!(engine.translate(&input, |_, _| {}).await);

    assert_eq!(outcome.report.repaired_batches.len(), 1);
    assert!(outcome.report.gave_up_batches.is_empty());
    assert!(outcome.report.fallback_indices.is_empty());
    // Three first-pass requests plus one whole-batch retry
    assert_eq!(provider.request_count(), 4);

    let repaired = outcome.report.repaired_batches[0];
    let retried_size = if repaired == 2 { 2 } else { 4 };
    let mut sizes = provider.batch_sizes();
    sizes.sort_unstable();
    let mut expected = vec![2, 4, 4, retried_size];
    expected.sort_unstable();
    assert_eq!(sizes, expected);

    assert_same_timing(&input, &outcome.cues);
    for cue in &outcome.cues {
        assert_eq!(cue.text, format!("[TRANSLATED] line {}", cue.index));
    }
}

#[tokio::test]
async fn test_translate_withStalledService_shouldFallBackAfterTimeouts() {
    common::init_test_logging();
    let provider = MockProvider::slow(5_000);
    let client = common::mock_client(&provider, Duration::from_millis(50));
    let settings = EngineSettings { max_attempts: 1, ..common::engine_settings(2, 4) };
    let engine = BatchTranslator::new(client, settings).unwrap();
    let input = common::sample_cues(4);

    let outcome = tokio::time::timeout(Duration::from_secs(10), engine.translate(&input, |_, _| {}))
        .await
        .expect("engine should not wait for the stalled service")
        .unwrap();

    assert_eq!(outcome.cues, input);
    assert_eq!(outcome.report.fallback_indices, vec![1, 2, 3, 4]);
    assert_eq!(outcome.report.gave_up_batches, vec![0, 1]);
    // First request plus one retry per batch
    assert_eq!(provider.request_count(), 4);
}

#[tokio::test]
async fn test_translate_withAlwaysMisalignedReplies_shouldStopAfterSevenCalls() {
    common::init_test_logging();
    let provider = MockProvider::scripted(|call| {
        let mut lines = call.lines.clone();
        lines.push("extra".to_string());
        MockReply::Text(numbered_reply(&lines))
    });
    let engine = translator(&provider, common::engine_settings(4, 4));
    let input = common::sample_cues(4);

    let outcome = engine.translate(&input, |_, _| {}).await.unwrap();

    // 4, then 2 + 2, then 1 + 1 + 1 + 1
    assert_eq!(provider.request_count(), 7);
    assert_eq!(outcome.cues, input);
    assert_eq!(outcome.report.fallback_indices, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_translate_withOneStubbornCue_shouldOnlyFallBackThatCue() {
    common::init_test_logging();
    let provider = MockProvider::scripted(|call| {
        let stubborn = call.lines.iter().any(|l| l == "line 3");
        if !stubborn {
            return MockReply::Text(call.translated());
        }
        if call.lines.len() == 1 {
            return MockReply::Text(String::new());
        }
        // Drop the stubborn line
        let kept: Vec<String> = call.lines.iter().filter(|l| *l != "line 3").cloned().collect();
        MockReply::Text(numbered_reply(&kept))
    });
    let engine = translator(&provider, common::engine_settings(4, 2));
    let input = common::sample_cues(4);

    let outcome = engine.translate(&input, |_, _| {}).await.unwrap();

    assert_eq!(outcome.report.fallback_indices, vec![3]);
    assert_eq!(outcome.report.gave_up_batches, vec![0]);
    assert_eq!(outcome.cues[2].text, "line 3");
    assert_eq!(outcome.cues[0].text, "[TRANSLATED] line 1");
    assert_eq!(outcome.cues[3].text, "[TRANSLATED] line 4");
    assert!(outcome.report.summary().contains("kept their source text"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_translate_withDifferentConcurrency_shouldProduceIdenticalOutput() {
    common::init_test_logging();
    let input = common::sample_cues(37);

    let serial = translator(&MockProvider::merging(4), common::engine_settings(5, 1))
        .translate(&input, |_, _| {})
        .await
        .unwrap();
    let parallel = translator(&MockProvider::merging(4), common::engine_settings(5, 8))
        .translate(&input, |_, _| {})
        .await
        .unwrap();

    assert_eq!(serial.cues, parallel.cues);
    assert_eq!(serial.report.fallback_indices, parallel.report.fallback_indices);
    assert_same_timing(&input, &parallel.cues);
}

#[tokio::test]
async fn test_translate_withChattyOrReorderedReplies_shouldStillAlign() {
    common::init_test_logging();
    let input = common::sample_cues(6);

    for provider in [MockProvider::preamble(), MockProvider::reordered()] {
        let outcome = translator(&provider, common::engine_settings(3, 2))
            .translate(&input, |_, _| {})
            .await
            .unwrap();
        assert!(outcome.report.is_complete());
        assert_eq!(outcome.report.first_pass_ok, 2);
        assert_eq!(outcome.cues[5].text, "[TRANSLATED] line 6");
    }
}

#[test]
fn test_new_withZeroConcurrency_shouldFailBeforeAnyRequest() {
    let provider = MockProvider::working();
    let client = common::mock_client(&provider, Duration::from_secs(1));

    let result = BatchTranslator::new(client, common::engine_settings(10, 0));

    assert!(matches!(result, Err(TranslationError::InvalidConfig(_))));
    assert_eq!(provider.request_count(), 0);
}
