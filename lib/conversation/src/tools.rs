//! Built-in front-desk tools.

use crate::error::ToolError;
use crate::record::{FeedbackRecord, LeadRecord};
use crate::recorder::Recorder;
use crate::tool::{
    ParameterProperty, ParametersSchema, Tool, ToolDefinition, ToolRegistry, decode_arguments,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Name of the lead-capture tool.
pub const RECORD_CUSTOMER_INTEREST: &str = "record_customer_interest";

/// Name of the unanswered-question tool.
pub const RECORD_FEEDBACK: &str = "record_feedback";

/// Acknowledgment returned after recording feedback.
pub const FEEDBACK_ACK: &str = "Thank you for your question. I've recorded it and our team will review it to improve our service.";

/// Formats the acknowledgment returned after recording a lead.
#[must_use]
pub fn customer_interest_ack(name: Option<&str>, email: Option<&str>) -> String {
    let name = name.unwrap_or("there");
    let email = email.unwrap_or("the email you provided");
    format!("Thank you, {name}! Your interest has been recorded. We'll contact you at {email} soon.")
}

#[derive(Debug, Deserialize)]
struct CustomerInterestArgs {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Records a prospective customer's contact details.
pub struct RecordCustomerInterest {
    definition: ToolDefinition,
    leads: Arc<dyn Recorder<LeadRecord>>,
}

impl RecordCustomerInterest {
    /// Creates the tool over a lead recorder.
    #[must_use]
    pub fn new(leads: Arc<dyn Recorder<LeadRecord>>, business_name: &str) -> Self {
        let definition = ToolDefinition::new(
            RECORD_CUSTOMER_INTEREST,
            format!(
                "Record a customer's contact information and interest in {business_name} services. \
                 Use this when a customer wants to sign up, get more information, or schedule a session."
            ),
        )
        .with_parameters(
            ParametersSchema::object()
                .with_required("email", ParameterProperty::string("The customer's email address"))
                .with_required("name", ParameterProperty::string("The customer's full name"))
                .with_required(
                    "message",
                    ParameterProperty::string(
                        "Additional notes about what the customer is interested in or their specific needs",
                    ),
                ),
        );

        Self { definition, leads }
    }
}

#[async_trait]
impl Tool for RecordCustomerInterest {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args: CustomerInterestArgs = decode_arguments(&self.definition.name, arguments)?;
        let ack = customer_interest_ack(args.name.as_deref(), args.email.as_deref());

        self.leads
            .append(LeadRecord::new(args.name, args.email, args.message))
            .await;

        Ok(ack)
    }
}

#[derive(Debug, Deserialize)]
struct FeedbackArgs {
    #[serde(default)]
    question: Option<String>,
}

/// Records a question the agent could not answer.
pub struct RecordFeedback {
    definition: ToolDefinition,
    feedback: Arc<dyn Recorder<FeedbackRecord>>,
}

impl RecordFeedback {
    /// Creates the tool over a feedback recorder.
    #[must_use]
    pub fn new(feedback: Arc<dyn Recorder<FeedbackRecord>>) -> Self {
        let definition = ToolDefinition::new(
            RECORD_FEEDBACK,
            "Record questions that you cannot answer or customer feedback for future improvement. \
             Use this when you don't have enough information to answer a customer's question.",
        )
        .with_parameters(ParametersSchema::object().with_required(
            "question",
            ParameterProperty::string("The unanswered question or feedback from the customer"),
        ));

        Self {
            definition,
            feedback,
        }
    }
}

#[async_trait]
impl Tool for RecordFeedback {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args: FeedbackArgs = decode_arguments(&self.definition.name, arguments)?;
        self.feedback.append(FeedbackRecord::new(args.question)).await;
        Ok(FEEDBACK_ACK.to_string())
    }
}

impl ToolRegistry {
    /// Builds the registry holding the two front-desk tools.
    #[must_use]
    pub fn builtin(
        leads: Arc<dyn Recorder<LeadRecord>>,
        feedback: Arc<dyn Recorder<FeedbackRecord>>,
        business_name: &str,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RecordCustomerInterest::new(leads, business_name)));
        registry.register(Arc::new(RecordFeedback::new(feedback)));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;
    use crate::recorder::JsonFileRecorder;

    fn registry() -> (
        ToolRegistry,
        Arc<JsonFileRecorder<LeadRecord>>,
        Arc<JsonFileRecorder<FeedbackRecord>>,
    ) {
        let leads = Arc::new(JsonFileRecorder::in_memory());
        let feedback = Arc::new(JsonFileRecorder::in_memory());
        let registry = ToolRegistry::builtin(leads.clone(), feedback.clone(), "TutorBee");
        (registry, leads, feedback)
    }

    #[test]
    fn builtin_declares_both_tools() {
        let (registry, _, _) = registry();

        let names: Vec<_> = registry.definitions().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec![RECORD_CUSTOMER_INTEREST, RECORD_FEEDBACK]);

        let lead = registry.get(RECORD_CUSTOMER_INTEREST).expect("registered");
        assert!(lead.definition().description.contains("TutorBee services"));
        assert_eq!(
            lead.definition().parameters.required,
            vec!["email", "name", "message"]
        );
    }

    #[tokio::test]
    async fn record_customer_interest_appends_lead() {
        let (registry, leads, feedback) = registry();

        let output = registry
            .execute(&ToolCall::new(
                "call_1",
                RECORD_CUSTOMER_INTEREST,
                r#"{"email":"a@b.com","name":"Ana","message":"math help"}"#,
            ))
            .await;

        assert_eq!(
            output,
            "Thank you, Ana! Your interest has been recorded. We'll contact you at a@b.com soon."
        );
        let records = leads.list().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Ana"));
        assert_eq!(records[0].email.as_deref(), Some("a@b.com"));
        assert_eq!(records[0].message.as_deref(), Some("math help"));
        assert_eq!(feedback.len().await, 0);
    }

    #[tokio::test]
    async fn missing_lead_fields_are_recorded_as_none() {
        let (registry, leads, _) = registry();

        let output = registry
            .execute(&ToolCall::new("call_1", RECORD_CUSTOMER_INTEREST, r#"{"name":"Ben"}"#))
            .await;

        assert_eq!(
            output,
            "Thank you, Ben! Your interest has been recorded. We'll contact you at the email you provided soon."
        );
        let records = leads.list().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].email.is_none());
        assert!(records[0].message.is_none());
    }

    #[tokio::test]
    async fn record_feedback_appends_question() {
        let (registry, _, feedback) = registry();

        let output = registry
            .execute(&ToolCall::new(
                "call_1",
                RECORD_FEEDBACK,
                r#"{"question":"What is the refund policy?"}"#,
            ))
            .await;

        assert_eq!(output, FEEDBACK_ACK);
        let records = feedback.list().await;
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].question.as_deref(),
            Some("What is the refund policy?")
        );
    }

    #[tokio::test]
    async fn malformed_arguments_record_nothing() {
        let (registry, _, feedback) = registry();

        let output = registry
            .execute(&ToolCall::new("call_1", RECORD_FEEDBACK, r#""just a string""#))
            .await;

        assert!(output.starts_with("Invalid arguments for tool 'record_feedback'"));
        assert_eq!(feedback.len().await, 0);
    }

    #[test]
    fn ack_defaults() {
        assert_eq!(
            customer_interest_ack(None, None),
            "Thank you, there! Your interest has been recorded. We'll contact you at the email you provided soon."
        );
    }
}
