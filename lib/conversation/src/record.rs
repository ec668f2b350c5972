//! Lead and feedback records captured by the built-in tools.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A record kind a recorder can store and snapshot.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Short name of the record kind, used in logs.
    const KIND: &'static str;

    /// Emits the structured event for a freshly appended record.
    fn log_appended(&self, position: usize);
}

/// A captured prospective-customer contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// When the lead was recorded.
    pub timestamp: DateTime<Utc>,
    /// The customer's full name.
    pub name: Option<String>,
    /// The customer's email address.
    pub email: Option<String>,
    /// What the customer is interested in.
    pub message: Option<String>,
}

impl LeadRecord {
    /// Creates a lead stamped with the current time.
    #[must_use]
    pub fn new(name: Option<String>, email: Option<String>, message: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            name,
            email,
            message,
        }
    }
}

impl Record for LeadRecord {
    const KIND: &'static str = "lead";

    fn log_appended(&self, position: usize) {
        info!(
            position,
            timestamp = %self.timestamp,
            name = self.name.as_deref(),
            email = self.email.as_deref(),
            interest = self.message.as_deref(),
            "lead recorded"
        );
    }
}

/// A question the agent could not answer from the business documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// When the question was recorded.
    pub timestamp: DateTime<Utc>,
    /// The unanswered question or feedback text.
    pub question: Option<String>,
}

impl FeedbackRecord {
    /// Creates a feedback record stamped with the current time.
    #[must_use]
    pub fn new(question: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            question,
        }
    }
}

impl Record for FeedbackRecord {
    const KIND: &'static str = "feedback";

    fn log_appended(&self, position: usize) {
        info!(
            position,
            timestamp = %self.timestamp,
            question = self.question.as_deref(),
            "feedback recorded"
        );
    }
}
