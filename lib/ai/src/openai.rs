//! OpenAI-compatible chat-completion backend.
//!
//! Speaks `POST {base_url}/chat/completions` with function tools. Every
//! round-trip is bounded by the configured timeout.

use crate::backend::{
    ChatBackend, ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmBackendConfig, LlmProvider,
    TokenUsage, ToolCallRequest, ToolChoice,
};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Chat backend for OpenAI and OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: LlmBackendConfig,
    api_key: String,
    endpoint: String,
}

impl OpenAiBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if no usable API key is configured and
    /// `InvalidConfig` if the HTTP client cannot be built.
    pub fn new(config: LlmBackendConfig) -> Result<Self, LlmError> {
        let api_key = config
            .usable_api_key()
            .ok_or_else(|| LlmError::MissingCredentials {
                provider: config.provider.to_string(),
            })?
            .to_string();

        if config.timeout_secs == 0 {
            return Err(LlmError::InvalidConfig {
                reason: "timeout must be at least one second".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            config,
            api_key,
            endpoint,
        })
    }

    fn wire_request<'a>(&'a self, request: &'a ChatRequest) -> WireRequest<'a> {
        WireRequest {
            model: &self.config.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools: request
                .tools
                .iter()
                .map(|tool| WireTool {
                    kind: "function",
                    function: WireFunctionSpec {
                        name: &tool.name,
                        description: &tool.description,
                        parameters: &tool.parameters,
                    },
                })
                .collect(),
            tool_choice: if request.offers_tools() {
                request.tool_choice
            } else {
                None
            },
        }
    }

    fn map_send_error(&self, error: &reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout {
                after_secs: self.config.timeout_secs,
            }
        } else {
            LlmError::RequestFailed {
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    #[instrument(
        skip(self, request),
        fields(messages = request.messages.len(), tools = request.tools.len())
    )]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = self.wire_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint = %self.endpoint, "chat completion request failed");
                self.map_send_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok());
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "chat completion endpoint returned error");

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized {
                    provider: self.config.provider.to_string(),
                    reason: format!("HTTP {status}"),
                },
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { retry_after_secs },
                _ => LlmError::RequestFailed {
                    reason: format!("HTTP {status}: {body}"),
                },
            });
        }

        let parsed: WireResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_send_error(&e)
            } else {
                LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        let completion = ChatResponse::try_from_wire(parsed, &self.config.model)?;
        debug!(
            model = %completion.model,
            tool_calls = completion.tool_calls.len(),
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "chat completion received"
        );
        Ok(completion)
    }

    fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: ChatRole,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.as_deref(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: &call.id,
                    kind: "function",
                    function: WireFunctionCall {
                        name: &call.name,
                        arguments: &call.arguments,
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.as_deref(),
            name: message.name.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionSpec<'a>,
}

#[derive(Serialize)]
struct WireFunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a JsonValue,
}

#[derive(Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionCall<'a>,
}

#[derive(Serialize)]
struct WireFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireResponseToolCall>>,
}

#[derive(Deserialize)]
struct WireResponseToolCall {
    id: String,
    function: WireResponseFunction,
}

#[derive(Deserialize)]
struct WireResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl ChatResponse {
    fn try_from_wire(wire: WireResponse, requested_model: &str) -> Result<Self, LlmError> {
        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest::new(call.id, call.function.name, call.function.arguments))
            .collect();

        Ok(Self {
            content: choice.message.content,
            tool_calls,
            usage: wire
                .usage
                .map(|usage| TokenUsage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                })
                .unwrap_or_default(),
            model: wire.model.unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ToolSpec;
    use mockito::Matcher;
    use serde_json::json;

    fn backend_for(server: &mockito::ServerGuard) -> OpenAiBackend {
        let config = LlmBackendConfig::openai("sk-test").with_timeout_secs(5);
        OpenAiBackend::new(LlmBackendConfig {
            base_url: server.url(),
            ..config
        })
        .expect("backend")
    }

    fn feedback_tool() -> ToolSpec {
        ToolSpec {
            name: "record_feedback".to_string(),
            description: "Record an unanswered question".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"question": {"type": "string"}},
                "required": ["question"]
            }),
        }
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let config = LlmBackendConfig::openai_compatible("http://localhost:8080/v1", "local");
        let err = OpenAiBackend::new(config).expect_err("should fail");
        assert!(err.is_credential());
    }

    #[test]
    fn wire_request_omits_tools_for_plain_completion() {
        let backend = OpenAiBackend::new(LlmBackendConfig::openai("sk-test")).expect("backend");
        let request = ChatRequest::new(vec![ChatMessage::user("hello")]);
        let json = serde_json::to_value(backend.wire_request(&request)).expect("serialize");

        assert_eq!(json["model"], "gpt-4o-mini");
        let mut keys: Vec<&str> = json
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, ["messages", "model"]);
    }

    #[test]
    fn wire_request_encodes_assistant_tool_calls() {
        let backend = OpenAiBackend::new(LlmBackendConfig::openai("sk-test")).expect("backend");
        let mut assistant = ChatMessage {
            content: None,
            ..ChatMessage::assistant("")
        };
        assistant.tool_calls.push(ToolCallRequest::new(
            "call_1",
            "record_feedback",
            r#"{"question":"refunds?"}"#,
        ));
        let request = ChatRequest::new(vec![assistant]).with_tools(vec![feedback_tool()]);
        let json = serde_json::to_value(backend.wire_request(&request)).expect("serialize");

        let message = &json["messages"][0];
        assert!(message["content"].is_null());
        assert_eq!(message["tool_calls"][0]["type"], "function");
        assert_eq!(message["tool_calls"][0]["function"]["name"], "record_feedback");
        assert_eq!(json["tools"][0]["function"]["name"], "record_feedback");
        assert_eq!(json["tool_choice"], "auto");
    }

    #[tokio::test]
    async fn parses_tool_call_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({"tool_choice": "auto"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "model": "gpt-4o-mini-2024-07-18",
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_abc",
                                "type": "function",
                                "function": {
                                    "name": "record_feedback",
                                    "arguments": "{\"question\":\"Do you offer refunds?\"}"
                                }
                            }]
                        }
                    }],
                    "usage": {"prompt_tokens": 50, "completion_tokens": 12}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = backend_for(&server);
        let request =
            ChatRequest::new(vec![ChatMessage::user("refunds?")]).with_tools(vec![feedback_tool()]);
        let response = backend.complete(&request).await.expect("completion");

        mock.assert_async().await;
        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].name, "record_feedback");
        assert_eq!(response.usage.total(), 62);
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
    }

    #[tokio::test]
    async fn parses_plain_text_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = backend_for(&server);
        let response = backend
            .complete(&ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect("completion");

        assert_eq!(response.content.as_deref(), Some("Hello!"));
        assert!(!response.has_tool_calls());
        assert_eq!(response.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_credential_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let backend = backend_for(&server);
        let err = backend
            .complete(&ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect_err("should fail");

        assert!(err.is_credential());
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let backend = backend_for(&server);
        let err = backend
            .complete(&ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect_err("should fail");

        assert_eq!(
            err,
            LlmError::RateLimited {
                retry_after_secs: Some(7)
            }
        );
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let backend = backend_for(&server);
        let err = backend
            .complete(&ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect_err("should fail");

        assert_eq!(err, LlmError::EmptyResponse);
    }

    #[tokio::test]
    async fn unanswered_request_maps_to_timeout() {
        // Accepts connections and never writes a byte back.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = LlmBackendConfig::openai_compatible(format!("http://{addr}/v1"), "local")
            .with_api_key("sk-test")
            .with_timeout_secs(1);
        let backend = OpenAiBackend::new(config).expect("backend");
        let err = backend
            .complete(&ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect_err("should time out");

        assert_eq!(err, LlmError::Timeout { after_secs: 1 });
        silent.abort();
    }
}
