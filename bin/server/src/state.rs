//! Shared application state.

use frontdesk_conversation::{FeedbackRecord, LeadRecord, Recorder, SessionManager};
use std::sync::Arc;

/// State shared by every handler.
pub struct AppState {
    /// Active conversation sessions.
    pub sessions: SessionManager,
    /// Recorded leads.
    pub leads: Arc<dyn Recorder<LeadRecord>>,
    /// Recorded unanswered questions.
    pub feedback: Arc<dyn Recorder<FeedbackRecord>>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        sessions: SessionManager,
        leads: Arc<dyn Recorder<LeadRecord>>,
        feedback: Arc<dyn Recorder<FeedbackRecord>>,
    ) -> Self {
        Self {
            sessions,
            leads,
            feedback,
        }
    }
}
