/*!
 * Translation client.
 *
 * Turns a batch of source lines into one prompt, sends it through the configured
 * provider under a per-request timeout and decomposes the reply into lines. The
 * client never retries; that is the repair policy's job.
 */

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::debug;
use parking_lot::Mutex;

use crate::app_config::TranslationConfig;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::gemini::Gemini;
use crate::providers::{CompletionRequest, Provider};
use crate::translation::prompts::TranslationPromptBuilder;
use crate::translation::response::{ParsedReply, ResponseParser};

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Number of requests that returned a reply
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    /// Create a new empty token usage stats instance
    pub fn new() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
        }
    }

    /// Add the usage numbers of one reply
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // Use the API duration for rate calculation, with fallback to elapsed time
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token Usage Summary:\n\
             Requests: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.api_duration.as_secs_f64() / 60.0,
            self.tokens_per_minute()
        )
    }
}

/// Client that translates one batch of lines per call
#[derive(Clone)]
pub struct TranslationClient {
    provider: Arc<dyn Provider>,

    /// Upper bound for one request, including reading the reply
    timeout: Duration,

    temperature: f32,

    /// Shared by all clones
    token_usage: Arc<Mutex<TokenUsageStats>>,
}

impl fmt::Debug for TranslationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationClient")
            .field("provider", &self.provider)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl TranslationClient {
    /// Create a client around any provider
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration, temperature: f32) -> Self {
        Self {
            provider,
            timeout,
            temperature,
            token_usage: Arc::new(Mutex::new(TokenUsageStats::new())),
        }
    }

    /// Create a Gemini-backed client from configuration
    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslationError> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(TranslationError::InvalidConfig(
                "no API key configured (set GEMINI_API_KEY or translation.api_key)".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        // The HTTP client gets a little headroom so the outer timeout fires first
        let gemini = Gemini::new(api_key, &config.api_url, timeout + Duration::from_secs(5))
            .map_err(|e| TranslationError::InvalidConfig(e.to_string()))?;

        Ok(Self::new(Arc::new(gemini), timeout, config.temperature))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Translate `texts` in one request.
    ///
    /// The reply may hold fewer or more lines than `texts`; the caller decides
    /// what a count or numbering mismatch means.
    pub async fn translate(
        &self,
        texts: &[String],
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<ParsedReply, ProviderError> {
        let (system, prompt) = TranslationPromptBuilder::new(source_language, target_language)
            .with_lines(texts)
            .build();
        let request = CompletionRequest::new(prompt)
            .system(system)
            .temperature(self.temperature);

        let start = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))??;
        let elapsed = start.elapsed();

        {
            let mut stats = self.token_usage.lock();
            stats.add_token_usage(response.prompt_tokens, response.completion_tokens);
            stats.requests += 1;
            stats.api_duration += elapsed;
        }

        let reply = ResponseParser::parse(&response.text)?;
        debug!(
            "Translated {} lines into {} lines in {:.2}s",
            texts.len(),
            reply.len(),
            elapsed.as_secs_f64()
        );
        Ok(reply)
    }

    /// Probe the service with a one-line request
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        tokio::time::timeout(self.timeout, self.provider.test_connection())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
    }

    /// Snapshot of the usage accumulated so far
    pub fn token_usage(&self) -> TokenUsageStats {
        self.token_usage.lock().clone()
    }
}
