//! Error types for the provider crate.

use std::fmt;

/// Errors from language-model backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// No API key was supplied, or it was blank.
    MissingCredentials { provider: String },
    /// The provider rejected the supplied credentials.
    Unauthorized { provider: String, reason: String },
    /// Request failed.
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout { after_secs: u64 },
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Invalid configuration.
    InvalidConfig { reason: String },
    /// The provider answered without any completion choice.
    EmptyResponse,
}

impl LlmError {
    /// Returns true if the error means the credentials are absent or invalid.
    #[must_use]
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials { .. } | Self::Unauthorized { .. }
        )
    }

    /// Returns true if the error is a round-trip timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials { provider } => {
                write!(f, "no API key configured for provider '{provider}'")
            }
            Self::Unauthorized { provider, reason } => {
                write!(f, "provider '{provider}' rejected credentials: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout { after_secs } => {
                write!(f, "LLM request timed out after {after_secs}s")
            }
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
            Self::EmptyResponse => write!(f, "LLM response contained no choices"),
        }
    }
}

impl std::error::Error for LlmError {}
