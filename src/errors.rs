/*!
 * Error types for the movsub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Broad class of a provider failure, as seen by the repair logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Network failure or timeout
    Transport,
    /// The service answered with a non-success response
    Service,
    /// The reply could not be decomposed into lines
    Parse,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transport => "transport",
            Self::Service => "service",
            Self::Parse => "parse",
        };
        write!(f, "{}", label)
    }
}

/// Errors that can occur when talking to the translation service
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the per-request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Map this error onto the transport / service / parse taxonomy
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::Timeout(_) => {
                FailureCategory::Transport
            }
            Self::ApiError { .. } | Self::RateLimitExceeded(_) | Self::AuthenticationError(_) => {
                FailureCategory::Service
            }
            Self::ParseError(_) => FailureCategory::Parse,
        }
    }
}

/// Errors that are fatal to a whole translation run
#[derive(Error, Debug)]
pub enum TranslationError {
    /// A configuration value is unusable; raised before any network activity
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The assembler was handed results that do not cover the batch layout
    #[error("Incomplete assembly: {0}")]
    IncompleteAssembly(String),

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Audio extraction failed
    #[error("Media error: {0}")]
    Media(String),

    /// Speech recognition failed
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
