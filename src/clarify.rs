//! Clarifying questions
//!
//! Between the opening arguments and the analysts the user is asked exactly
//! three questions. Anything other than three is a malformed response.

use crate::agent::{require_present, strip_code_fence};
use crate::config::InvokerConfig;
use crate::error::{CallTarget, DebateError, DebateResult};
use crate::gemini::{GeminiClient, GenerateRequest};
use crate::types::CLARIFICATION_COUNT;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[async_trait]
pub trait ClarificationGenerator: Send + Sync {
    async fn generate(
        &self,
        idea: &str,
        location: &str,
    ) -> DebateResult<[String; CLARIFICATION_COUNT]>;
}

#[derive(Debug, Deserialize)]
struct QuestionsPayload {
    questions: Vec<String>,
}

/// Parse `{"questions": [...]}` into exactly three questions
pub fn parse_questions(text: &str) -> DebateResult<[String; CLARIFICATION_COUNT]> {
    let payload: QuestionsPayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| DebateError::malformed(CallTarget::Clarifier, format!("questions payload: {}", e)))?;

    let count = payload.questions.len();
    let questions: [String; CLARIFICATION_COUNT] = payload.questions.try_into().map_err(|_| {
        DebateError::malformed(
            CallTarget::Clarifier,
            format!("expected {} questions, got {}", CLARIFICATION_COUNT, count),
        )
    })?;

    if questions.iter().any(|q| q.trim().is_empty()) {
        return Err(DebateError::malformed(CallTarget::Clarifier, "blank question"));
    }
    Ok(questions)
}

pub struct GeminiClarifier {
    client: GeminiClient,
}

impl GeminiClarifier {
    pub fn new(config: InvokerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: GeminiClient::new(config)?,
        })
    }
}

#[async_trait]
impl ClarificationGenerator for GeminiClarifier {
    async fn generate(
        &self,
        idea: &str,
        location: &str,
    ) -> DebateResult<[String; CLARIFICATION_COUNT]> {
        require_present(idea, location)?;

        let prompt = format!(
            "Based on the business idea \"{idea}\" in \"{location}\", generate 3 critical clarifying \
             questions that a high-end consultant would ask to determine feasibility."
        );
        let request = GenerateRequest {
            model: &self.client.config().fast_model,
            prompt: &prompt,
            response_schema: Some(json!({
                "type": "OBJECT",
                "properties": {
                    "questions": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["questions"]
            })),
            ..Default::default()
        };

        tracing::debug!("generating clarifying questions");
        let output = self
            .client
            .generate(&request)
            .await
            .map_err(|e| DebateError::invocation(CallTarget::Clarifier, e.to_string()))?;

        parse_questions(&output.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_three_questions() {
        let questions =
            parse_questions(r#"{"questions": ["B2B or B2C?", "Price point?", "Who buys?"]}"#)
                .unwrap();
        assert_eq!(questions[0], "B2B or B2C?");
        assert_eq!(questions[2], "Who buys?");
    }

    #[test]
    fn test_wrong_count_is_malformed() {
        let err = parse_questions(r#"{"questions": ["one", "two"]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);
        assert!(err.to_string().contains("expected 3 questions, got 2"));

        let err = parse_questions(r#"{"questions": ["1", "2", "3", "4"]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_questions(r#"{"items": ["a", "b", "c"]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);
    }

    #[test]
    fn test_blank_question_is_malformed() {
        assert!(parse_questions(r#"{"questions": ["a", " ", "c"]}"#).is_err());
    }

    #[test]
    fn test_gemini_clarifier_rejects_blank_location() {
        let clarifier = GeminiClarifier::new(InvokerConfig::new("test-key")).unwrap();
        let err = tokio_test::block_on(clarifier.generate("dog perfume", " ")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
