//! Tool registry for conversation mode.
//!
//! Tools are the actions the model may request during a turn. Each tool
//! declares a parameter schema and decodes its own arguments; the registry
//! dispatches calls by name and always produces text to feed back to the
//! model.

use crate::error::ToolError;
use crate::message::ToolCall;
use async_trait::async_trait;
use frontdesk_ai::ToolSpec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Result text returned for a call to a tool that is not registered.
pub const TOOL_NOT_FOUND: &str = "Function not found.";

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterProperty {
    /// JSON type of the parameter.
    #[serde(rename = "type")]
    pub kind: String,
    /// What the parameter holds.
    pub description: String,
}

impl ParameterProperty {
    /// Creates a string parameter.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            kind: "string".to_string(),
            description: description.into(),
        }
    }
}

/// JSON schema for a tool's parameters. Always an object schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, ParameterProperty>,
    pub required: Vec<String>,
}

impl Default for ParametersSchema {
    fn default() -> Self {
        Self {
            kind: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl ParametersSchema {
    /// Creates an empty object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::default()
    }

    /// Adds a required parameter.
    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>, property: ParameterProperty) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(name, property);
        self
    }

    /// Adds an optional parameter.
    #[must_use]
    pub fn with_optional(mut self, name: impl Into<String>, property: ParameterProperty) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Renders the schema as JSON.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let properties: serde_json::Map<String, JsonValue> = self
            .properties
            .iter()
            .map(|(name, property)| {
                (
                    name.clone(),
                    serde_json::json!({
                        "type": property.kind,
                        "description": property.description,
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "type": self.kind,
            "properties": properties,
            "required": self.required,
        })
    }
}

/// Definition of a tool available during conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description, shown to the model.
    pub description: String,
    /// Parameter schema.
    pub parameters: ParametersSchema,
}

impl ToolDefinition {
    /// Creates a new tool definition with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ParametersSchema::object(),
        }
    }

    /// Sets the parameter schema.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParametersSchema) -> Self {
        self.parameters = parameters;
        self
    }

    /// Converts the definition to the provider-facing tool spec.
    #[must_use]
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.to_json(),
        }
    }
}

/// Trait for tool execution.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> &ToolDefinition;

    /// Executes the tool with the provider's JSON-encoded arguments.
    async fn execute(&self, arguments: &str) -> Result<String, ToolError>;
}

/// Decodes a tool's JSON-encoded arguments into `T`.
///
/// An empty payload decodes as `{}`. Anything that is not a JSON object is
/// rejected with [`ToolError::InvalidInput`].
pub fn decode_arguments<T: DeserializeOwned>(tool: &str, arguments: &str) -> Result<T, ToolError> {
    let invalid = |reason: String| ToolError::InvalidInput {
        name: tool.to_string(),
        reason,
    };

    let trimmed = arguments.trim();
    let raw = if trimmed.is_empty() { "{}" } else { trimmed };

    let value: JsonValue = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    if !value.is_object() {
        return Err(invalid(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Registry of available tools, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|tool| &tool.definition().name))
            .finish()
    }
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registers a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name.clone();
        match self
            .tools
            .iter_mut()
            .find(|existing| existing.definition().name == name)
        {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Gets a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.definition().name == name)
    }

    /// Returns all registered tool definitions.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition())
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Converts definitions to the format expected by LLM APIs.
    #[must_use]
    pub fn to_llm_format(&self) -> Vec<ToolSpec> {
        self.definitions().map(ToolDefinition::to_spec).collect()
    }

    /// Executes a tool call and returns the text to feed back to the model.
    ///
    /// Never fails: unknown tools yield [`TOOL_NOT_FOUND`] and tool errors
    /// yield their display text.
    #[instrument(skip(self, call), fields(tool = %call.name, call_id = %call.id))]
    pub async fn execute(&self, call: &ToolCall) -> String {
        let Some(tool) = self.get(&call.name) else {
            let error = ToolError::NotFound {
                name: call.name.clone(),
            };
            warn!(%error, "tool not found");
            return TOOL_NOT_FOUND.to_string();
        };

        match tool.execute(&call.arguments).await {
            Ok(output) => {
                debug!("tool executed");
                output
            }
            Err(error) => {
                warn!(%error, "tool rejected its arguments");
                error.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct EchoArgs {
        #[serde(default)]
        text: Option<String>,
    }

    struct Echo {
        definition: ToolDefinition,
    }

    impl Echo {
        fn new(name: &str) -> Self {
            Self {
                definition: ToolDefinition::new(name, "Repeat the text").with_parameters(
                    ParametersSchema::object()
                        .with_required("text", ParameterProperty::string("Text to repeat")),
                ),
            }
        }
    }

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
            let args: EchoArgs = decode_arguments(&self.definition.name, arguments)?;
            Ok(args.text.unwrap_or_else(|| "(nothing)".to_string()))
        }
    }

    #[test]
    fn schema_renders_as_object() {
        let schema = ParametersSchema::object()
            .with_required("email", ParameterProperty::string("The customer's email address"))
            .with_optional("note", ParameterProperty::string("Anything else"));

        let json = schema.to_json();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["email"]["type"], "string");
        assert_eq!(
            json["properties"]["email"]["description"],
            "The customer's email address"
        );
        assert_eq!(json["required"], serde_json::json!(["email"]));
    }

    #[test]
    fn tool_registry_operations() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(Echo::new("echo")));
        registry.register(Arc::new(Echo::new("shout")));
        registry.register(Arc::new(Echo::new("echo")));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());

        let names: Vec<_> = registry.definitions().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "shout"]);
    }

    #[test]
    fn tool_registry_llm_format() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo::new("echo")));

        let specs = registry.to_llm_format();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "echo");
        assert_eq!(specs[0].parameters["properties"]["text"]["type"], "string");
    }

    #[tokio::test]
    async fn execute_dispatches_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo::new("echo")));

        let output = registry
            .execute(&ToolCall::new("call_1", "echo", r#"{"text":"hi"}"#))
            .await;
        assert_eq!(output, "hi");
    }

    #[tokio::test]
    async fn unknown_tool_yields_sentinel() {
        let registry = ToolRegistry::new();

        let output = registry
            .execute(&ToolCall::new("call_1", "book_session", "{}"))
            .await;
        assert_eq!(output, TOOL_NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_arguments_are_fed_back() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo::new("echo")));

        let output = registry
            .execute(&ToolCall::new("call_1", "echo", "[1, 2]"))
            .await;
        assert_eq!(
            output,
            "Invalid arguments for tool 'echo': expected a JSON object, got an array"
        );

        let output = registry
            .execute(&ToolCall::new("call_2", "echo", "{not json"))
            .await;
        assert!(output.starts_with("Invalid arguments for tool 'echo': "));
    }

    #[test]
    fn empty_arguments_decode_as_empty_object() {
        let args: EchoArgs = decode_arguments("echo", "  ").expect("decode");
        assert!(args.text.is_none());
    }
}
