//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConversationError`: a failed turn, reported to the caller of `submit`
//! - `SessionError`: session manager operations
//! - `ToolError`: tool lookup and argument decoding, fed back to the model
//! - `PersistenceError`: snapshot writes, always logged and swallowed
//! - `ContextError`: loading the business knowledge documents

use frontdesk_ai::LlmError;
use frontdesk_core::SessionId;
use std::fmt;
use std::path::PathBuf;

/// Errors that abort a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// The provider rejected or never received usable credentials.
    Credential { reason: String },
    /// A provider round-trip exceeded its timeout.
    ProviderTimeout { after_secs: u64 },
    /// Any other provider failure.
    ProviderFailed { reason: String },
}

impl ConversationError {
    /// Classifies a provider error.
    #[must_use]
    pub fn from_provider(error: &LlmError) -> Self {
        match error {
            LlmError::Timeout { after_secs } => Self::ProviderTimeout {
                after_secs: *after_secs,
            },
            err if err.is_credential() => Self::Credential {
                reason: err.to_string(),
            },
            err => Self::ProviderFailed {
                reason: err.to_string(),
            },
        }
    }
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential { reason } => write!(f, "provider credentials rejected: {reason}"),
            Self::ProviderTimeout { after_secs } => {
                write!(f, "provider did not answer within {after_secs}s")
            }
            Self::ProviderFailed { reason } => write!(f, "provider call failed: {reason}"),
        }
    }
}

impl std::error::Error for ConversationError {}

/// Errors from session manager operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session not found.
    NotFound { id: SessionId },
    /// Credentials were absent or invalid.
    Credential { reason: String },
    /// The provider backend could not be constructed.
    BackendUnavailable { reason: String },
    /// Every session slot is in use.
    Capacity { max: usize },
    /// A turn failed inside the session.
    Turn {
        id: SessionId,
        cause: ConversationError,
    },
}

impl SessionError {
    /// Returns true if the failure is a credential problem, whether found at
    /// initialization or at first use.
    #[must_use]
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            Self::Credential { .. }
                | Self::Turn {
                    cause: ConversationError::Credential { .. },
                    ..
                }
        )
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "session not found: {id}"),
            Self::Credential { reason } => write!(f, "invalid credentials: {reason}"),
            Self::BackendUnavailable { reason } => {
                write!(f, "provider backend unavailable: {reason}")
            }
            Self::Capacity { max } => write!(f, "session limit of {max} reached"),
            Self::Turn { id, cause } => write!(f, "turn failed in session {id}: {cause}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from tool lookup and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Tool not found.
    NotFound { name: String },
    /// The arguments could not be decoded against the tool's schema.
    InvalidInput { name: String, reason: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "tool not found: {name}"),
            Self::InvalidInput { name, reason } => {
                write!(f, "Invalid arguments for tool '{name}': {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {}

/// Errors from writing a recorder snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The records could not be serialized.
    Serialize { reason: String },
    /// The snapshot file could not be written.
    Write { path: PathBuf, reason: String },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize { reason } => write!(f, "failed to serialize records: {reason}"),
            Self::Write { path, reason } => {
                write!(f, "failed to write snapshot {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Errors from loading the business knowledge documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A source document exists but could not be read.
    Unreadable { path: PathBuf, reason: String },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, reason } => {
                write!(f, "failed to read {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for ContextError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_classified_separately() {
        let err = ConversationError::from_provider(&LlmError::Timeout { after_secs: 30 });
        assert_eq!(err, ConversationError::ProviderTimeout { after_secs: 30 });
    }

    #[test]
    fn unauthorized_is_a_credential_error() {
        let err = ConversationError::from_provider(&LlmError::Unauthorized {
            provider: "openai".to_string(),
            reason: "HTTP 401".to_string(),
        });
        assert!(matches!(err, ConversationError::Credential { .. }));
    }

    #[test]
    fn other_provider_errors_keep_their_reason() {
        let err = ConversationError::from_provider(&LlmError::RequestFailed {
            reason: "connection reset".to_string(),
        });
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn session_error_credential_covers_first_use() {
        let err = SessionError::Turn {
            id: SessionId::new(),
            cause: ConversationError::Credential {
                reason: "HTTP 401".to_string(),
            },
        };
        assert!(err.is_credential());
        assert!(!SessionError::NotFound { id: SessionId::new() }.is_credential());
    }

    #[test]
    fn tool_error_display() {
        let err = ToolError::InvalidInput {
            name: "record_feedback".to_string(),
            reason: "expected an object".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid arguments for tool 'record_feedback': expected an object"
        );
    }
}
