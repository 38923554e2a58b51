//! Thin client for the `generateContent` endpoint
//!
//! Shared by the agent invoker and the clarification generator. Knows how to
//! build a request body and how to pull text and grounding sources back out;
//! it knows nothing about roles or verdicts.

use crate::config::InvokerConfig;
use crate::types::Source;
use anyhow::{anyhow, Result};
use serde_json::{json, Value};

/// Title used when a grounding chunk carries a uri but no title
pub const FALLBACK_SOURCE_TITLE: &str = "Market Source";

/// One generation call
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub system_instruction: Option<&'a str>,
    pub prompt: &'a str,
    /// Enable Google Search grounding
    pub search_grounding: bool,
    /// Ask for JSON matching this schema
    pub response_schema: Option<Value>,
    pub thinking_budget: Option<u32>,
}

/// What came back: the candidate text plus any grounding sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOutput {
    pub text: String,
    pub sources: Vec<Source>,
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: InvokerConfig,
}

impl GeminiClient {
    pub fn new(config: InvokerConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    pub async fn generate(&self, request: &GenerateRequest<'_>) -> Result<GenerateOutput> {
        let body = build_request_body(request);

        let api_response = self
            .client
            .post(self.config.generate_url(request.model))
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !api_response.status().is_success() {
            let status = api_response.status();
            let error_text = api_response.text().await.unwrap_or_default();
            return Err(anyhow!("API error ({}): {}", status, error_text));
        }

        let response_json: Value = api_response.json().await?;
        parse_response(&response_json)
    }
}

/// Build the JSON body for a generation call
pub fn build_request_body(request: &GenerateRequest<'_>) -> Value {
    let mut body = json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }
        ]
    });

    if let Some(instruction) = request.system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
    }

    if request.search_grounding {
        body["tools"] = json!([{ "google_search": {} }]);
    }

    let mut generation_config = serde_json::Map::new();
    if let Some(schema) = &request.response_schema {
        generation_config.insert("responseMimeType".into(), json!("application/json"));
        generation_config.insert("responseSchema".into(), schema.clone());
    }
    if let Some(budget) = request.thinking_budget {
        generation_config.insert("thinkingConfig".into(), json!({ "thinkingBudget": budget }));
    }
    if !generation_config.is_empty() {
        body["generationConfig"] = Value::Object(generation_config);
    }

    body
}

/// Extract candidate text and grounding sources from a response
pub fn parse_response(response: &Value) -> Result<GenerateOutput> {
    let candidate = response
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| anyhow!("response has no candidates"))?;

    // Thought summaries are not part of the answer
    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p["thought"].as_bool().unwrap_or(false))
                .filter_map(|p| p["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
        return Err(anyhow!("empty response (finish reason: {})", reason));
    }

    Ok(GenerateOutput {
        text,
        sources: grounding_sources(candidate),
    })
}

fn grounding_sources(candidate: &Value) -> Vec<Source> {
    candidate["groundingMetadata"]["groundingChunks"]
        .as_array()
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let uri = chunk["web"]["uri"].as_str().unwrap_or("");
                    if uri.is_empty() {
                        return None;
                    }
                    let title = chunk["web"]["title"]
                        .as_str()
                        .filter(|t| !t.is_empty())
                        .unwrap_or(FALLBACK_SOURCE_TITLE);
                    Some(Source {
                        title: title.to_string(),
                        uri: uri.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
