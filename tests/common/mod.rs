/*!
 * Common test utilities for the movsub test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use movsub::providers::mock::MockProvider;
use movsub::subtitle_processor::Cue;
use movsub::translation::{EngineSettings, TranslationClient};

/// Install a test logger once; later calls are no-ops
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// `count` cues, one second apart, with text "line N"
pub fn sample_cues(count: usize) -> Vec<Cue> {
    (1..=count)
        .map(|i| {
            let start = i as u64 * 1000;
            Cue::new(i, start, start + 800, format!("line {}", i))
        })
        .collect()
}

/// Creates an SRT file holding `sample_cues(count)`
pub fn create_test_subtitle(dir: &Path, filename: &str, count: usize) -> Result<PathBuf> {
    let content: String = sample_cues(count).iter().map(|cue| cue.to_string()).collect();
    create_test_file(dir, filename, &content)
}

/// Client around a mock provider
pub fn mock_client(provider: &MockProvider, timeout: Duration) -> TranslationClient {
    TranslationClient::new(Arc::new(provider.clone()), timeout, 0.2)
}

/// Engine settings without retry backoff
pub fn engine_settings(batch_size: usize, concurrency: usize) -> EngineSettings {
    EngineSettings {
        batch_size,
        concurrency,
        retry_backoff: Duration::ZERO,
        ..EngineSettings::default()
    }
}
