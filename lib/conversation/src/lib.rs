//! Conversation service for the frontdesk agent.
//!
//! This crate provides:
//!
//! - **Tool Registry**: the actions the model may call, and the two
//!   built-in front-desk tools
//! - **Recorders**: append-only lead and feedback logs with JSON snapshots
//! - **Conversation Engine**: per-session history and the tool-calling turn
//! - **Session Manager**: active session lifecycle

pub mod context;
pub mod engine;
pub mod error;
pub mod message;
pub mod prompt;
pub mod record;
pub mod recorder;
pub mod session;
pub mod tool;
pub mod tools;

#[cfg(test)]
mod testing;

pub use context::BusinessContext;
pub use engine::ConversationEngine;
pub use error::{ContextError, ConversationError, PersistenceError, SessionError, ToolError};
pub use message::{Message, MessageRole, ToolCall};
pub use prompt::AgentPersona;
pub use record::{FeedbackRecord, LeadRecord, Record};
pub use recorder::{JsonFileRecorder, Recorder};
pub use session::{
    BackendFactory, OpenAiBackendFactory, ProviderCredentials, SessionLimits, SessionManager,
};
pub use tool::{ParameterProperty, ParametersSchema, Tool, ToolDefinition, ToolRegistry};
