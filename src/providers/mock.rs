/*!
 * Mock provider implementation for testing.
 *
 * The mock reads the numbered `[n] text` lines out of the prompt and answers the
 * way a real model sometimes does:
 * - `MockProvider::working()` - one `[n] [TRANSLATED] text` line per input line
 * - `MockProvider::merging(k)` - merges the first two lines of batches with k or more lines
 * - `MockProvider::preamble()` - chatty introduction before the numbered lines
 * - `MockProvider::reordered()` - numbered lines in reverse order
 * - `MockProvider::failing()` - always fails with a service error
 * - `MockProvider::scripted(..)` - arbitrary replies per call
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};

static PROMPT_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d+)\] ?(.*)$").expect("prompt line regex is valid"));

/// What the mock saw in one request
#[derive(Debug, Clone)]
pub struct MockCall {
    /// 1-based number of this call across all clones
    pub call_number: usize,
    /// Source lines without their markers
    pub lines: Vec<String>,
}

impl MockCall {
    /// Aligned reply for these lines
    pub fn translated(&self) -> String {
        render_lines(self.lines.iter().map(|l| format!("[TRANSLATED] {}", l)))
    }
}

/// Reply chosen by a scripted mock
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this raw text
    Text(String),
    /// Fail with this error
    Fail(ProviderError),
    /// Sleep, then answer aligned
    Stall(Duration),
}

type Responder = Arc<dyn Fn(&MockCall) -> MockReply + Send + Sync>;

/// Behavior mode for the mock provider
#[derive(Clone)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Merges the first two lines when the batch has at least `min_lines` lines
    Merging { min_lines: usize },
    /// Adds an unnumbered introduction before the numbered lines
    Preamble,
    /// Emits the numbered lines in reverse order
    Reordered,
    /// Always fails with an error
    Failing,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
    /// Returns empty response
    Empty,
    /// Reply decided per call
    Scripted(Responder),
}

impl fmt::Debug for MockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Working => write!(f, "Working"),
            Self::Merging { min_lines } => write!(f, "Merging {{ min_lines: {} }}", min_lines),
            Self::Preamble => write!(f, "Preamble"),
            Self::Reordered => write!(f, "Reordered"),
            Self::Failing => write!(f, "Failing"),
            Self::Intermittent { fail_every } => write!(f, "Intermittent {{ fail_every: {} }}", fail_every),
            Self::Slow { delay_ms } => write!(f, "Slow {{ delay_ms: {} }}", delay_ms),
            Self::Empty => write!(f, "Empty"),
            Self::Scripted(_) => write!(f, "Scripted"),
        }
    }
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared by clones
    request_count: Arc<AtomicUsize>,
    /// Line count of every request, in arrival order
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn merging(min_lines: usize) -> Self {
        Self::new(MockBehavior::Merging { min_lines })
    }

    pub fn preamble() -> Self {
        Self::new(MockBehavior::Preamble)
    }

    pub fn reordered() -> Self {
        Self::new(MockBehavior::Reordered)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock whose replies come from `responder`
    pub fn scripted<F>(responder: F) -> Self
    where
        F: Fn(&MockCall) -> MockReply + Send + Sync + 'static,
    {
        Self::new(MockBehavior::Scripted(Arc::new(responder)))
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Line counts of the requests received so far
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }

    /// Extract the numbered source lines from a prompt
    pub fn parse_prompt_lines(prompt: &str) -> Vec<String> {
        prompt
            .lines()
            .filter_map(|line| PROMPT_LINE_REGEX.captures(line.trim_end()))
            .map(|caps| caps.get(2).map_or(String::new(), |m| m.as_str().to_string()))
            .collect()
    }

    fn reply(&self, call: &MockCall) -> MockReply {
        match &self.behavior {
            MockBehavior::Working => MockReply::Text(call.translated()),

            MockBehavior::Merging { min_lines } => {
                if call.lines.len() >= (*min_lines).max(2) {
                    let mut merged = vec![format!("{} {}", call.lines[0], call.lines[1])];
                    merged.extend(call.lines[2..].iter().cloned());
                    MockReply::Text(render_lines(merged.iter().map(|l| format!("[TRANSLATED] {}", l))))
                } else {
                    MockReply::Text(call.translated())
                }
            }

            MockBehavior::Preamble => MockReply::Text(format!(
                "Sure! Here are the {} translated lines:\n\n{}\n\nLet me know if you need anything else.",
                call.lines.len(),
                call.translated()
            )),

            MockBehavior::Reordered => {
                let mut numbered: Vec<String> = call
                    .lines
                    .iter()
                    .enumerate()
                    .map(|(i, l)| format!("[{}] [TRANSLATED] {}", i + 1, l))
                    .collect();
                numbered.reverse();
                MockReply::Text(numbered.join("\n"))
            }

            MockBehavior::Failing => MockReply::Fail(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Intermittent { fail_every } => {
                if call.call_number % fail_every == 0 {
                    MockReply::Fail(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", call.call_number),
                        status_code: 503,
                    })
                } else {
                    MockReply::Text(call.translated())
                }
            }

            MockBehavior::Slow { delay_ms } => MockReply::Stall(Duration::from_millis(*delay_ms)),

            MockBehavior::Empty => MockReply::Text(String::new()),

            MockBehavior::Scripted(responder) => responder(call),
        }
    }
}

fn render_lines<I: Iterator<Item = String>>(lines: I) -> String {
    lines
        .enumerate()
        .map(|(i, l)| format!("[{}] {}", i + 1, l))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let call_number = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        let lines = Self::parse_prompt_lines(&request.prompt);
        self.batch_sizes.lock().push(lines.len());

        let call = MockCall { call_number, lines };
        let text = match self.reply(&call) {
            MockReply::Text(text) => text,
            MockReply::Fail(error) => return Err(error),
            MockReply::Stall(delay) => {
                tokio::time::sleep(delay).await;
                call.translated()
            }
        };

        Ok(CompletionResponse {
            prompt_tokens: Some((request.prompt.len() / 4) as u64),
            completion_tokens: Some((text.len() / 4) as u64),
            text,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }
}
