//! Language-model provider primitives for frontdesk.
//!
//! This crate provides:
//!
//! - **Backend**: the `ChatBackend` trait and the chat-completion request
//!   and response types the conversation engine speaks
//! - **OpenAI**: an OpenAI-compatible HTTP implementation of that trait

pub mod backend;
pub mod error;
pub mod openai;

pub use backend::{
    ChatBackend, ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmBackendConfig, LlmProvider,
    TokenUsage, ToolCallRequest, ToolChoice, ToolSpec,
};
pub use error::LlmError;
pub use openai::OpenAiBackend;
