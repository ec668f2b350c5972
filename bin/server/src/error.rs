//! HTTP error responses.
//!
//! Failures reach callers as a short apology with a status code per error
//! kind; the detail goes to the log only.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use frontdesk_conversation::{ConversationError, SessionError};
use rootcause::prelude::Report;
use serde::Serialize;

/// Errors returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The session id is unknown or malformed.
    SessionNotFound { detail: String },
    /// No session slot is free.
    TooManySessions { detail: String },
    /// The API key was missing or rejected by the provider.
    InvalidCredentials { detail: String },
    /// The provider did not answer in time.
    ProviderTimeout { detail: String },
    /// Any other provider failure.
    ProviderFailed { detail: String },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    /// Classifies a session manager failure.
    #[must_use]
    pub fn from_session(error: &SessionError) -> Self {
        let detail = error.to_string();
        match error {
            SessionError::NotFound { .. } => Self::SessionNotFound { detail },
            SessionError::Capacity { .. } => Self::TooManySessions { detail },
            err if err.is_credential() => Self::InvalidCredentials { detail },
            SessionError::Turn {
                cause: ConversationError::ProviderTimeout { .. },
                ..
            } => Self::ProviderTimeout { detail },
            _ => Self::ProviderFailed { detail },
        }
    }

    /// Returns the status code for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            Self::TooManySessions { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidCredentials { .. } => StatusCode::BAD_REQUEST,
            Self::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::ProviderFailed { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn apology(&self) -> &'static str {
        match self {
            Self::SessionNotFound { .. } => {
                "Please initialize the agent first by entering your OpenAI API key."
            }
            Self::TooManySessions { .. } => {
                "Sorry, too many conversations are open right now. Please try again later."
            }
            Self::InvalidCredentials { .. } => "Please enter a valid OpenAI API key.",
            Self::ProviderTimeout { .. } => {
                "Sorry, the assistant is taking too long to respond. Please try again."
            }
            Self::ProviderFailed { .. } => {
                "Sorry, something went wrong while answering. Please try again."
            }
        }
    }
}

impl From<Report<SessionError>> for ApiError {
    fn from(report: Report<SessionError>) -> Self {
        Self::from_session(report.current_context())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::SessionNotFound { detail } => tracing::debug!(%detail, "session not found"),
            Self::TooManySessions { detail } => tracing::warn!(%detail, "session limit reached"),
            Self::InvalidCredentials { detail } => tracing::warn!(%detail, "invalid credentials"),
            Self::ProviderTimeout { detail } | Self::ProviderFailed { detail } => {
                tracing::error!(%detail, "provider failure");
            }
        }

        (
            status,
            Json(ErrorBody {
                error: self.apology(),
            }),
        )
            .into_response()
    }
}
