//! Scripted provider backend for engine and session tests.

use async_trait::async_trait;
use frontdesk_ai::{ChatBackend, ChatRequest, ChatResponse, LlmError, LlmProvider};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
enum Step {
    Respond(Result<ChatResponse, LlmError>),
    /// Never answers.
    Stall,
}

/// Backend that replays queued responses and records every request.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<ChatResponse, LlmError>) {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Step::Respond(response));
    }

    pub fn then(self, response: Result<ChatResponse, LlmError>) -> Self {
        self.push(response);
        self
    }

    /// Queues a call that never completes.
    pub fn then_stall(self) -> Self {
        self.script.lock().expect("script lock").push_back(Step::Stall);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let step = self.script.lock().expect("script lock").pop_front();
        match step {
            Some(Step::Respond(response)) => response,
            Some(Step::Stall) => std::future::pending().await,
            None => Err(LlmError::EmptyResponse),
        }
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAiCompatible
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
