//! Agent invocation
//!
//! Every seat at the table is reached through [`AgentInvoker`]. The
//! orchestrator only depends on the trait; [`GeminiInvoker`] is the network
//! implementation and tests substitute scripted fakes.

use crate::config::InvokerConfig;
use crate::error::{DebateError, DebateResult};
use crate::gemini::{GeminiClient, GenerateRequest};
use crate::types::{Role, Source, Verdict};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// What an agent hands back
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    /// Free text, from every role but the judge
    Text(String),
    /// The judge's structured verdict, without a ruling
    Verdict(Verdict),
}

impl AgentOutput {
    pub fn into_text(self, role: Role) -> DebateResult<String> {
        match self {
            AgentOutput::Text(text) if !text.trim().is_empty() => Ok(text),
            AgentOutput::Text(_) => Err(DebateError::malformed(role, "empty text response")),
            AgentOutput::Verdict(_) => {
                Err(DebateError::malformed(role, "expected text, got a verdict"))
            }
        }
    }

    pub fn into_verdict(self, role: Role) -> DebateResult<Verdict> {
        match self {
            AgentOutput::Verdict(verdict) => Ok(verdict),
            AgentOutput::Text(_) => Err(DebateError::malformed(role, "expected a verdict, got text")),
        }
    }
}

#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Ask `role` about the idea. `context` carries prior debate output for
    /// the roles that read it (skeptic, judge, tie-breaker).
    async fn invoke(
        &self,
        role: Role,
        idea: &str,
        location: &str,
        context: Option<&str>,
    ) -> DebateResult<AgentOutput>;
}

/// Fixed behavioural profile of a role
#[derive(Debug, Clone, Copy)]
pub struct RoleProfile {
    pub system_instruction: &'static str,
    /// Google Search grounding
    pub uses_search: bool,
    /// Returns a JSON verdict instead of text
    pub structured: bool,
    /// Runs on the reasoning model with a thinking budget
    pub deep_reasoning: bool,
}

impl RoleProfile {
    pub fn of(role: Role) -> Self {
        match role {
            Role::Optimist => Self {
                system_instruction:
                    "You are the 'Eternal Optimist'. Find growth, scalability, and massive upside.",
                uses_search: false,
                structured: false,
                deep_reasoning: false,
            },
            Role::Skeptic => Self {
                system_instruction:
                    "You are the 'Ruthless Skeptic'. Focus on unit economic failures and market risks.",
                uses_search: false,
                structured: false,
                deep_reasoning: false,
            },
            Role::SocialListener => Self {
                system_instruction: "You are the 'Social Media Listener'. Monitor TikTok, Twitter, and Reddit trends for this industry.",
                uses_search: true,
                structured: false,
                deep_reasoning: false,
            },
            Role::AdAnalyst => Self {
                system_instruction: "You are the 'Ad-Spend Analyst'. Estimate Customer Acquisition Cost (CAC) using Google Ads metrics.",
                uses_search: true,
                structured: false,
                deep_reasoning: false,
            },
            Role::Judge => Self {
                system_instruction: "You are the 'Pragmatic Judge'. Synthesize all inputs. Use Google Search for the final grounding.",
                uses_search: true,
                structured: true,
                deep_reasoning: false,
            },
            Role::TieBreaker => Self {
                system_instruction: "You are the 'Supreme Court of Business'. Use deep chain-of-thought logic to break ties and provide the definitive strategic ruling.",
                uses_search: false,
                structured: false,
                deep_reasoning: true,
            },
        }
    }
}

/// The user prompt for a role
pub fn build_prompt(role: Role, idea: &str, location: &str, context: Option<&str>) -> String {
    let context = context.unwrap_or("");
    match role {
        Role::Optimist => format!(
            "Analyze: \"{idea}\" in \"{location}\". Focus on why it WILL work. (200 words max)"
        ),
        Role::Skeptic => format!(
            "Critique: \"{idea}\" in \"{location}\". Context: {context}. Identify 3 ways this goes bankrupt."
        ),
        Role::SocialListener => format!(
            "Search for current social sentiment and viral trends related to \"{idea}\" in \"{location}\". \
             Is this \"trending\" or \"cringe\"? Provide a data-driven pulse check."
        ),
        Role::AdAnalyst => format!(
            "Search for estimated CPC (Cost Per Click) and competition levels for keywords related to \
             \"{idea}\" in \"{location}\". Estimate CAC for a startup in this space."
        ),
        Role::Judge => format!(
            "Final Synthesis for \"{idea}\" in \"{location}\".\n\
             Inputs: {context}\n\
             Provide a structured verdict including social sentiment and ad estimates."
        ),
        Role::TieBreaker => format!(
            "RULING REQUIRED: Deeply analyze the conflict between the Optimist, Skeptic, and Analysts \
             for the project \"{idea}\".\n\
             Context: {context}\n\
             What is the final, logically superior path forward?"
        ),
    }
}

/// Response schema requested from the judge
pub fn verdict_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "viabilityScore": { "type": "NUMBER" },
            "summary": { "type": "STRING" },
            "keyRisks": { "type": "ARRAY", "items": { "type": "STRING" } },
            "keyOpportunities": { "type": "ARRAY", "items": { "type": "STRING" } },
            "marketTrends": { "type": "ARRAY", "items": { "type": "STRING" } },
            "socialSentiment": { "type": "STRING" },
            "estimatedCAC": { "type": "STRING" }
        },
        "required": [
            "viabilityScore", "summary", "keyRisks", "keyOpportunities",
            "marketTrends", "socialSentiment", "estimatedCAC"
        ]
    })
}

/// Wire shape of the judge payload. Every field is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerdictPayload {
    viability_score: f64,
    summary: String,
    key_risks: Vec<String>,
    key_opportunities: Vec<String>,
    market_trends: Vec<String>,
    social_sentiment: String,
    #[serde(rename = "estimatedCAC")]
    estimated_cac: String,
}

/// Drop a surrounding ```json fence if the model added one
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse the judge's JSON into a verdict (no ruling yet)
pub fn parse_verdict(text: &str, sources: Vec<Source>) -> DebateResult<Verdict> {
    let payload: VerdictPayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| DebateError::malformed(Role::Judge, format!("verdict payload: {}", e)))?;

    let score = payload.viability_score;
    if !score.is_finite() || !(Verdict::MIN_SCORE..=Verdict::MAX_SCORE).contains(&score) {
        return Err(DebateError::malformed(
            Role::Judge,
            format!("viabilityScore {} outside 0-10", score),
        ));
    }

    Ok(Verdict {
        viability_score: score,
        summary: payload.summary,
        key_risks: payload.key_risks,
        key_opportunities: payload.key_opportunities,
        market_trends: payload.market_trends,
        social_sentiment: payload.social_sentiment,
        estimated_cac: payload.estimated_cac,
        tie_breaker_ruling: None,
        sources,
    })
}

pub(crate) fn require_present(idea: &str, location: &str) -> DebateResult<()> {
    if idea.trim().is_empty() {
        return Err(DebateError::invalid_input("idea is empty"));
    }
    if location.trim().is_empty() {
        return Err(DebateError::invalid_input("location is empty"));
    }
    Ok(())
}

/// Network invoker backed by the Gemini API
pub struct GeminiInvoker {
    client: GeminiClient,
}

impl GeminiInvoker {
    pub fn new(config: InvokerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: GeminiClient::new(config)?,
        })
    }
}

#[async_trait]
impl AgentInvoker for GeminiInvoker {
    async fn invoke(
        &self,
        role: Role,
        idea: &str,
        location: &str,
        context: Option<&str>,
    ) -> DebateResult<AgentOutput> {
        require_present(idea, location)?;

        let profile = RoleProfile::of(role);
        let config = self.client.config();
        let prompt = build_prompt(role, idea, location, context);
        let model = if profile.deep_reasoning {
            config.reasoning_model.as_str()
        } else {
            config.fast_model.as_str()
        };

        let request = GenerateRequest {
            model,
            system_instruction: Some(profile.system_instruction),
            prompt: &prompt,
            search_grounding: profile.uses_search,
            response_schema: profile.structured.then(verdict_schema),
            thinking_budget: profile.deep_reasoning.then_some(config.thinking_budget),
        };

        tracing::debug!(%role, model, "invoking agent");
        let output = self
            .client
            .generate(&request)
            .await
            .map_err(|e| DebateError::invocation(role, e.to_string()))?;

        if profile.structured {
            parse_verdict(&output.text, output.sources).map(AgentOutput::Verdict)
        } else {
            Ok(AgentOutput::Text(output.text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CallTarget, ErrorKind};

    const VALID: &str = r#"{
        "viabilityScore": 6.5,
        "summary": "Niche luxury play with real demand.",
        "keyRisks": ["High churn", "Regulatory labelling"],
        "keyOpportunities": ["Gifting", "Influencer partnerships"],
        "marketTrends": ["Pet humanization"],
        "socialSentiment": "Curious, slightly ironic",
        "estimatedCAC": "$38-$55"
    }"#;

    #[test]
    fn test_parse_verdict_valid() {
        let sources = vec![Source {
            title: "Pet market".into(),
            uri: "https://example.com".into(),
        }];
        let verdict = parse_verdict(VALID, sources).unwrap();

        assert_eq!(verdict.viability_score, 6.5);
        assert_eq!(verdict.key_risks.len(), 2);
        assert_eq!(verdict.estimated_cac, "$38-$55");
        assert_eq!(verdict.sources.len(), 1);
        assert!(verdict.tie_breaker_ruling.is_none());
    }

    #[test]
    fn test_parse_verdict_accepts_fenced_json() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(parse_verdict(&fenced, vec![]).is_ok());
    }

    #[test]
    fn test_parse_verdict_missing_field_is_malformed() {
        let missing = r#"{"viabilityScore": 5, "summary": "s", "keyRisks": [],
            "keyOpportunities": [], "marketTrends": [], "socialSentiment": "x"}"#;
        let err = parse_verdict(missing, vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);
        assert_eq!(err.target(), Some(CallTarget::Agent(Role::Judge)));
    }

    #[test]
    fn test_parse_verdict_non_numeric_score_is_malformed() {
        let bad = VALID.replace("6.5", "\"high\"");
        let err = parse_verdict(&bad, vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);
    }

    #[test]
    fn test_parse_verdict_out_of_range_score_is_malformed() {
        let bad = VALID.replace("6.5", "65");
        let err = parse_verdict(&bad, vec![]).unwrap_err();
        assert!(err.to_string().contains("outside 0-10"));
    }

    #[test]
    fn test_parse_verdict_not_json_is_malformed() {
        let err = parse_verdict("The idea is good.", vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);
    }

    #[test]
    fn test_prompts_carry_context() {
        let prompt = build_prompt(Role::Skeptic, "dog perfume", "SF", Some("huge upside"));
        assert!(prompt.contains("dog perfume"));
        assert!(prompt.contains("Context: huge upside."));

        let prompt = build_prompt(Role::Judge, "dog perfume", "SF", Some("all inputs"));
        assert!(prompt.contains("Inputs: all inputs"));
    }

    #[test]
    fn test_profiles() {
        assert!(RoleProfile::of(Role::Judge).structured);
        assert!(RoleProfile::of(Role::TieBreaker).deep_reasoning);
        let searching: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|r| RoleProfile::of(*r).uses_search)
            .collect();
        assert_eq!(searching, vec![Role::SocialListener, Role::AdAnalyst, Role::Judge]);
    }

    #[test]
    fn test_output_shape_mismatch() {
        let err = AgentOutput::Text("words".into()).into_verdict(Role::Judge).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);

        let err = AgentOutput::Text("  ".into()).into_text(Role::TieBreaker).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);
    }

    #[test]
    fn test_require_present() {
        assert!(require_present("idea", "place").is_ok());
        assert_eq!(
            require_present(" ", "place").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert!(require_present("idea", "").is_err());
    }

    #[test]
    fn test_gemini_invoker_rejects_blank_idea_before_calling_out() {
        let invoker = GeminiInvoker::new(InvokerConfig::new("test-key")).unwrap();
        let err = tokio_test::block_on(invoker.invoke(Role::Optimist, "", "SF", None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
