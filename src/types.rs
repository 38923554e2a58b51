//! Core types for the war room debate
//!
//! One `Session` per debate. Responses are append-only, the verdict is
//! written once (with its tie-breaker ruling already attached) and every
//! session carries an identity so late results from a discarded debate
//! can be told apart from results for the live one.

use crate::error::{CallTarget, DebateError, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The six seats at the table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Argues for growth and upside
    Optimist,
    /// Rebuts the optimist on unit economics and market risk
    Skeptic,
    /// Reads social sentiment and trends (search grounded)
    SocialListener,
    /// Estimates acquisition cost from ad metrics (search grounded)
    AdAnalyst,
    /// Synthesizes everything into a structured verdict
    Judge,
    /// Breaks ties with a final ruling (deep reasoning)
    TieBreaker,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Optimist,
        Role::Skeptic,
        Role::SocialListener,
        Role::AdAnalyst,
        Role::Judge,
        Role::TieBreaker,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Optimist => "THE OPTIMIST",
            Role::Skeptic => "THE SKEPTIC",
            Role::SocialListener => "SOCIAL LISTENER",
            Role::AdAnalyst => "AD-SPEND ANALYST",
            Role::Judge => "THE JUDGE",
            Role::TieBreaker => "SUPREME COURT",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Role::Optimist => "🚀",
            Role::Skeptic => "📉",
            Role::SocialListener => "📱",
            Role::AdAnalyst => "💰",
            Role::Judge => "⚖️",
            Role::TieBreaker => "🏛️",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Optimist => "optimist",
            Role::Skeptic => "skeptic",
            Role::SocialListener => "social_listener",
            Role::AdAnalyst => "ad_analyst",
            Role::Judge => "judge",
            Role::TieBreaker => "tie_breaker",
        };
        f.write_str(s)
    }
}

/// One agent's contribution to the debate. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResponse {
    pub role: Role,
    pub text: String,
    pub produced_at: DateTime<Utc>,
}

impl AgentResponse {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            produced_at: Utc::now(),
        }
    }
}

/// A grounding source cited by the judge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// The judge's structured verdict.
///
/// Created by the judge without a ruling; the only later change is
/// [`Verdict::with_ruling`], which fills `tie_breaker_ruling`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// 0 (dead on arrival) to 10 (obvious winner)
    pub viability_score: f64,
    pub summary: String,
    pub key_risks: Vec<String>,
    pub key_opportunities: Vec<String>,
    pub market_trends: Vec<String>,
    pub social_sentiment: String,
    #[serde(rename = "estimatedCAC")]
    pub estimated_cac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_breaker_ruling: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Verdict {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 10.0;

    /// Attach the tie-breaker ruling, consuming the unruled verdict
    pub fn with_ruling(mut self, ruling: impl Into<String>) -> Self {
        self.tie_breaker_ruling = Some(ruling.into());
        self
    }

    pub fn is_ruled(&self) -> bool {
        self.tie_breaker_ruling
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}

/// Number of clarifying questions asked per debate
pub const CLARIFICATION_COUNT: usize = 3;

/// Three questions paired by position with three answers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClarificationSet {
    pub questions: [String; CLARIFICATION_COUNT],
    /// Empty strings until the user submits
    pub answers: [String; CLARIFICATION_COUNT],
}

impl ClarificationSet {
    pub fn new(questions: [String; CLARIFICATION_COUNT]) -> Self {
        Self {
            questions,
            answers: Default::default(),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answers.iter().all(|a| !a.trim().is_empty())
    }

    /// (question, answer) pairs in order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.questions
            .iter()
            .zip(self.answers.iter())
            .map(|(q, a)| (q.as_str(), a.as_str()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Analyzing,
    Clarifying,
    Refining,
    Judging,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }

    /// Position along the happy path; `Failed` sits outside it
    fn rank(&self) -> Option<u8> {
        match self {
            SessionStatus::Idle => Some(0),
            SessionStatus::Analyzing => Some(1),
            SessionStatus::Clarifying => Some(2),
            SessionStatus::Refining => Some(3),
            SessionStatus::Judging => Some(4),
            SessionStatus::Completed => Some(5),
            SessionStatus::Failed => None,
        }
    }

    /// Whether moving from `self` to `next` is allowed
    pub fn can_advance_to(&self, next: SessionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to == from + 1,
            // Failed is reachable from any non-terminal state
            (Some(_), None) => true,
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Analyzing => "analyzing",
            SessionStatus::Clarifying => "clarifying",
            SessionStatus::Refining => "refining",
            SessionStatus::Judging => "judging",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of one debate; a reset always produces a new one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What went wrong, kept for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureInfo {
    pub kind: ErrorKind,
    pub target: Option<CallTarget>,
    pub message: String,
}

impl From<&DebateError> for FailureInfo {
    fn from(error: &DebateError) -> Self {
        Self {
            kind: error.kind(),
            target: error.target(),
            message: error.to_string(),
        }
    }
}

/// The aggregate root for one debate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub idea: String,
    pub location: String,
    pub responses: Vec<AgentResponse>,
    pub status: SessionStatus,
    pub clarifications: Option<ClarificationSet>,
    pub verdict: Option<Verdict>,
    pub failure: Option<FailureInfo>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session, already analyzing
    pub fn new(idea: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            idea: idea.into(),
            location: location.into(),
            responses: Vec::new(),
            status: SessionStatus::Analyzing,
            clarifications: None,
            verdict: None,
            failure: None,
            started_at: Utc::now(),
        }
    }

    pub fn response_for(&self, role: Role) -> Option<&AgentResponse> {
        self.responses.iter().find(|r| r.role == role)
    }

    pub fn questions(&self) -> Option<&[String; CLARIFICATION_COUNT]> {
        self.clarifications.as_ref().map(|c| &c.questions)
    }

    /// Roles whose output the current phase is still waiting on
    pub fn in_flight_roles(&self) -> Vec<Role> {
        let candidates: &[Role] = match self.status {
            SessionStatus::Analyzing => &[Role::Optimist, Role::Skeptic],
            SessionStatus::Refining => &[Role::SocialListener, Role::AdAnalyst],
            SessionStatus::Judging => &[Role::Judge, Role::TieBreaker],
            _ => &[],
        };
        candidates
            .iter()
            .copied()
            .filter(|role| self.response_for(*role).is_none())
            .collect()
    }

    /// Generic message shown once a debate has failed
    pub fn failure_notice(&self) -> Option<&'static str> {
        (self.status == SessionStatus::Failed)
            .then_some("[SYSTEM_CRITICAL_ERROR]: DATA_CORRUPTION_OR_API_TIMEOUT. Please reset terminal.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions_are_single_steps() {
        use SessionStatus::*;
        assert!(Idle.can_advance_to(Analyzing));
        assert!(Analyzing.can_advance_to(Clarifying));
        assert!(Clarifying.can_advance_to(Refining));
        assert!(Refining.can_advance_to(Judging));
        assert!(Judging.can_advance_to(Completed));

        assert!(!Analyzing.can_advance_to(Judging));
        assert!(!Judging.can_advance_to(Refining));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        use SessionStatus::*;
        assert!(Analyzing.can_advance_to(Failed));
        assert!(Judging.can_advance_to(Failed));
        assert!(!Completed.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Analyzing));
        assert!(!Failed.can_advance_to(Failed));
    }

    #[test]
    fn test_verdict_serializes_camel_case() {
        let verdict = Verdict {
            viability_score: 6.5,
            summary: "Niche but viable".into(),
            key_risks: vec!["Churn".into()],
            key_opportunities: vec!["Gifting".into()],
            market_trends: vec!["Pet humanization".into()],
            social_sentiment: "curious".into(),
            estimated_cac: "$35".into(),
            tie_breaker_ruling: None,
            sources: vec![],
        };

        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["viabilityScore"], 6.5);
        assert_eq!(json["estimatedCAC"], "$35");
        assert_eq!(json["keyRisks"][0], "Churn");
        assert!(json.get("tieBreakerRuling").is_none());

        let ruled = verdict.with_ruling("Launch in one metro first");
        assert!(ruled.is_ruled());
        let json = serde_json::to_value(&ruled).unwrap();
        assert_eq!(json["tieBreakerRuling"], "Launch in one metro first");
    }

    #[test]
    fn test_in_flight_roles_follow_status() {
        let mut session = Session::new("idea", "place");
        assert_eq!(session.in_flight_roles(), vec![Role::Optimist, Role::Skeptic]);

        session.responses.push(AgentResponse::new(Role::Optimist, "upside"));
        assert_eq!(session.in_flight_roles(), vec![Role::Skeptic]);

        session.status = SessionStatus::Clarifying;
        assert!(session.in_flight_roles().is_empty());
        assert!(session.failure_notice().is_none());

        session.status = SessionStatus::Failed;
        assert!(session.failure_notice().is_some());
    }

    #[test]
    fn test_clarification_set_starts_unanswered() {
        let set = ClarificationSet::new(["a?".into(), "b?".into(), "c?".into()]);
        assert!(!set.is_answered());
        assert_eq!(set.pairs().count(), 3);
        assert_eq!(set.pairs().next(), Some(("a?", "")));
    }
}
