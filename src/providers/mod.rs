/*!
 * Provider implementations for the translation service.
 *
 * This module contains the client for the remote language model and a scripted
 * stand-in used by the tests:
 * - Gemini: `generateContent` REST API
 * - Mock: deterministic replies, failures and stalls
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One completion request, provider independent
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Instruction placed ahead of the user prompt
    pub system: Option<String>,

    /// User prompt
    pub prompt: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.2,
        }
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Raw reply text plus the usage numbers the service reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Common trait for language model providers
///
/// Implementations perform exactly one request per call. Retrying is left to the caller.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<CompletionResponse, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod gemini;
pub mod mock;
