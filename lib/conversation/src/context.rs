//! Business knowledge that grounds every session's system prompt.
//!
//! The context is assembled once at startup from a plain-text summary and
//! any number of additional plain-text documents, then shared read-only.

use crate::error::ContextError;
use frontdesk_core::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary used when the summary document is missing.
pub const DEFAULT_FALLBACK: &str = "TutorBee - Interactive Tutoring Service";

/// Label placed before each additional document.
pub const DOCUMENT_LABEL: &str = "Additional Business Information:\n";

/// Immutable grounding text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessContext {
    text: String,
}

impl BusinessContext {
    /// Wraps already-assembled text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Assembles the context from a summary and additional documents.
    ///
    /// A missing summary is replaced by `fallback`.
    #[must_use]
    pub fn assemble(summary: Option<&str>, fallback: &str, documents: &[String]) -> Self {
        let mut text = String::new();
        text.push_str(summary.unwrap_or(fallback));
        text.push_str("\n\n");

        let extra: Vec<String> = documents
            .iter()
            .map(|document| format!("{DOCUMENT_LABEL}{document}"))
            .collect();
        text.push_str(&extra.join("\n\n"));

        Self { text }
    }

    /// Loads the summary and documents from disk.
    ///
    /// Missing files are logged and skipped; a file that exists but cannot
    /// be read is an error.
    pub async fn load(
        summary_path: &Path,
        documents: &[PathBuf],
        fallback: &str,
    ) -> Result<Self, ContextError> {
        let summary = read_optional(summary_path).await?;
        match &summary {
            Some(_) => info!(path = %summary_path.display(), "loaded business summary"),
            None => warn!(path = %summary_path.display(), "business summary not found, using fallback"),
        }

        let mut loaded = Vec::with_capacity(documents.len());
        for path in documents {
            match read_optional(path).await? {
                Some(text) => {
                    info!(path = %path.display(), "loaded business document");
                    loaded.push(text);
                }
                None => warn!(path = %path.display(), "business document not found, skipping"),
            }
        }

        Ok(Self::assemble(summary.as_deref(), fallback, &loaded))
    }

    /// Returns the context text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, ContextError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ContextError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()),
    }
}
