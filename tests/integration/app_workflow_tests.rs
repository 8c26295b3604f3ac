/*!
 * Controller runs over SRT inputs with the mock provider
 */

use anyhow::Result;
use std::time::Duration;

use movsub::app_config::Config;
use movsub::app_controller::{Controller, FolderSummary, RunOptions};
use movsub::providers::mock::MockProvider;
use movsub::subtitle_processor::CueStore;
use crate::common;

fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.batch_size = 3;
    config.translation.concurrent_requests = 2;
    config.translation.retry_backoff_ms = 0;
    config
}

fn controller(provider: &MockProvider) -> Controller {
    let client = common::mock_client(provider, Duration::from_secs(5));
    Controller::with_client(test_config(), client).unwrap()
}

#[tokio::test]
async fn test_run_withSrtInput_shouldWriteTranslatedFile() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt", 7)?;
    let output_dir = temp_dir.path().join("out");
    let provider = MockProvider::working();

    let written = controller(&provider)
        .run(&input, &output_dir, &RunOptions::default())
        .await?
        .expect("output should be written");

    assert_eq!(written, output_dir.join("episode.chinese.srt"));
    let translated = CueStore::from_srt_file(&written)?;
    let original = common::sample_cues(7);
    assert_eq!(translated.len(), 7);
    for (before, after) in original.iter().zip(&translated.cues) {
        assert_eq!(before.start_ms, after.start_ms);
        assert_eq!(before.end_ms, after.end_ms);
        assert_eq!(after.text, format!("[TRANSLATED] {}", before.text));
    }
    assert_eq!(provider.request_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "film.srt", 2)?;
    common::create_test_file(temp_dir.path(), "film.chinese.srt", "already here")?;
    let provider = MockProvider::working();
    let controller = controller(&provider);

    let skipped = controller.run(&input, temp_dir.path(), &RunOptions::default()).await?;
    assert!(skipped.is_none());
    assert_eq!(provider.request_count(), 0);

    let forced = RunOptions { force_overwrite: true, ..RunOptions::default() };
    let written = controller.run(&input, temp_dir.path(), &forced).await?;
    assert!(written.is_some());
    assert_eq!(CueStore::from_srt_file(temp_dir.path().join("film.chinese.srt"))?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_run_folder_shouldTranslateEachFileOnce() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("season1");
    std::fs::create_dir_all(&nested)?;
    common::create_test_subtitle(temp_dir.path(), "a.srt", 4)?;
    common::create_test_subtitle(&nested, "b.srt", 5)?;
    common::create_test_file(temp_dir.path(), "notes.txt", "not a subtitle")?;
    let controller = controller(&MockProvider::working());

    let first = controller.run_folder(temp_dir.path(), None, &RunOptions::default()).await?;
    assert_eq!(first, FolderSummary { processed: 2, skipped: 0, failed: 0 });
    assert!(nested.join("b.chinese.srt").is_file());

    let second = controller.run_folder(temp_dir.path(), None, &RunOptions::default()).await?;
    assert_eq!(second, FolderSummary { processed: 0, skipped: 2, failed: 0 });
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingService_shouldKeepSourceText() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "talk.srt", 3)?;

    let written = controller(&MockProvider::failing())
        .run(&input, temp_dir.path(), &RunOptions::default())
        .await?
        .expect("output should be written");

    assert_eq!(CueStore::from_srt_file(&written)?.cues, common::sample_cues(3));
    Ok(())
}

#[test]
fn test_with_client_withInvalidSettings_shouldFail() {
    let mut config = test_config();
    config.translation.concurrent_requests = 0;
    let provider = MockProvider::working();
    let client = common::mock_client(&provider, Duration::from_secs(1));

    assert!(Controller::with_client(config, client).is_err());
}

#[test]
fn test_clean_file_shouldWriteCleanedCopy() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "raw.srt",
        "1\n00:00:01,000 --> 00:00:02,000\n[MUSIC]\n\n2\n00:00:02,000 --> 00:00:03,000\n<i>Hi.</i>\n\n3\n00:00:03,000 --> 00:00:04,000\nHi.\n",
    )?;
    let output = temp_dir.path().join("clean.srt");

    let stats = Controller::clean_file(&input, Some(&output))?;

    assert_eq!(stats.after_merge, 1);
    let cleaned = CueStore::from_srt_file(&output)?;
    assert_eq!(cleaned.cues[0].text, "Hi.");
    assert_eq!(cleaned.cues[0].start_ms, 2000);
    assert_eq!(cleaned.cues[0].end_ms, 4000);
    Ok(())
}
