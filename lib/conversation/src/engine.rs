//! Conversation engine.
//!
//! One engine owns one conversation history. A turn appends the user's
//! message, asks the model for a decision while offering every registered
//! tool, runs any requested tools in order and, if tools ran, asks the model
//! once more with no tools offered for the final reply.
//!
//! A turn that fails or is abandoned leaves the history exactly as it was
//! before the turn began. Tool side effects that already happened are not
//! undone.

use crate::error::ConversationError;
use crate::message::{Message, MessageRole};
use crate::tool::ToolRegistry;
use frontdesk_ai::{ChatBackend, ChatMessage, ChatRequest, ChatResponse};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Drives one conversation against a provider backend.
pub struct ConversationEngine {
    backend: Arc<dyn ChatBackend>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    history: Vec<Message>,
}

impl ConversationEngine {
    /// Creates an engine whose history holds only the system message.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let system_prompt = system_prompt.into();
        let history = vec![Message::system(system_prompt.clone())];
        Self {
            backend,
            tools,
            system_prompt,
            history,
        }
    }

    /// Returns the full history, system message first.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Returns the system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns the number of completed turns since the last reset.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.history
            .iter()
            .filter(|message| message.role == MessageRole::User)
            .count()
    }

    /// Drops everything but the first system message.
    pub fn reset(&mut self) {
        self.history.truncate(1);
        debug!("conversation reset");
    }

    /// Runs one turn and returns the assistant's reply.
    ///
    /// The turn's messages are committed to the history only once the final
    /// reply arrives, so a failed turn, or one whose future is dropped, leaves
    /// the history as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider round-trip fails.
    #[instrument(skip(self, text), fields(model = self.backend.model(), history = self.history.len()))]
    pub async fn submit(&mut self, text: &str) -> Result<String, Report<ConversationError>> {
        match self.run_turn(text).await {
            Ok((reply, turn)) => {
                self.history.extend(turn);
                Ok(reply)
            }
            Err(error) => {
                warn!(%error, "turn failed, history unchanged");
                Err(error.into())
            }
        }
    }

    async fn run_turn(&self, text: &str) -> Result<(String, Vec<Message>), ConversationError> {
        let mut turn = vec![Message::user(text)];

        let decision =
            ChatRequest::new(self.chat_messages(&turn)).with_tools(self.tools.to_llm_format());
        let response = self.complete(&decision).await?;

        if !response.has_tool_calls() {
            let reply = response.content.unwrap_or_default();
            turn.push(Message::assistant(reply.clone()));
            return Ok((reply, turn));
        }

        let calls = response.tool_calls;
        debug!(count = calls.len(), "model requested tool calls");
        turn.push(Message::assistant_tool_calls(response.content, calls.clone()));

        for call in &calls {
            let output = self.tools.execute(call).await;
            turn.push(Message::tool(&call.id, &call.name, output));
        }

        let finalize = ChatRequest::new(self.chat_messages(&turn));
        let response = self.complete(&finalize).await?;
        if response.has_tool_calls() {
            debug!(
                count = response.tool_calls.len(),
                "ignoring tool calls in final response"
            );
        }

        let reply = response.content.unwrap_or_default();
        turn.push(Message::assistant(reply.clone()));
        Ok((reply, turn))
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ConversationError> {
        self.backend
            .complete(request)
            .await
            .map_err(|e| ConversationError::from_provider(&e))
    }

    fn chat_messages(&self, pending: &[Message]) -> Vec<ChatMessage> {
        self.history
            .iter()
            .chain(pending)
            .map(Message::to_chat)
            .collect()
    }
}
