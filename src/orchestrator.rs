//! Debate orchestrator
//!
//! Drives one debate through its phases:
//!
//! ```text
//! start()                  Analyzing   optimist -> skeptic
//!                          Clarifying  three questions
//! submit_clarifications()  Refining    social listener || ad analyst
//!                          Judging     judge -> tie-breaker
//!                          Completed
//! ```
//!
//! Any failed external call aborts the phase and fails the session; nothing
//! is retried. Agent calls run without the session lock held, so `reset()`
//! can land while a call is in flight. Results are committed by session id
//! and anything addressed to a discarded session is dropped.

use crate::agent::{require_present, AgentInvoker};
use crate::clarify::ClarificationGenerator;
use crate::error::{DebateError, DebateResult};
use crate::session::{self, ApplyError, Event};
use crate::types::{
    AgentResponse, FailureInfo, Role, Session, SessionId, SessionStatus, CLARIFICATION_COUNT,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Separator between agent texts in the judge context
pub const RESPONSE_SEPARATOR: &str = "\n---\n";
/// Separator between the user's answers in the judge context
pub const ANSWER_SEPARATOR: &str = "; ";

/// Roles whose text the judge reads, in order
const JUDGE_INPUTS: [Role; 4] = [
    Role::Optimist,
    Role::Skeptic,
    Role::SocialListener,
    Role::AdAnalyst,
];

/// Context handed to the judge: every agent text, then the user's answers
pub fn judge_context(session: &Session) -> String {
    let texts: Vec<&str> = JUDGE_INPUTS
        .iter()
        .filter_map(|role| session.response_for(*role))
        .map(|r| r.text.as_str())
        .collect();
    let answers: Vec<&str> = session
        .clarifications
        .as_ref()
        .map(|c| c.answers.iter().map(String::as_str).collect())
        .unwrap_or_default();

    format!(
        "{}\nUser Clarifications: {}",
        texts.join(RESPONSE_SEPARATOR),
        answers.join(ANSWER_SEPARATOR)
    )
}

/// Owns the single live session and runs the debate phases against it
pub struct DebateOrchestrator {
    invoker: Arc<dyn AgentInvoker>,
    clarifier: Arc<dyn ClarificationGenerator>,
    session: Mutex<Option<Session>>,
}

impl DebateOrchestrator {
    pub fn new(
        invoker: Arc<dyn AgentInvoker>,
        clarifier: Arc<dyn ClarificationGenerator>,
    ) -> Self {
        Self {
            invoker,
            clarifier,
            session: Mutex::new(None),
        }
    }

    /// Copy of the live session, if any
    pub async fn snapshot(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Status of the live session; `Idle` when there is none
    pub async fn status(&self) -> SessionStatus {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Idle)
    }

    /// Discard the live session. Calls still in flight for it will find
    /// their results rejected.
    pub async fn reset(&self) {
        if let Some(discarded) = self.session.lock().await.take() {
            tracing::info!(session_id = %discarded.id, status = %discarded.status, "session reset");
        }
    }

    /// Open a debate: optimist, then skeptic, then the clarifying questions.
    ///
    /// Any previous session is discarded. Returns the session as it stands
    /// in `Clarifying` with its three questions.
    pub async fn start(&self, idea: &str, location: &str) -> DebateResult<Session> {
        require_present(idea, location)?;
        let (idea, location) = (idea.trim(), location.trim());

        let fresh = Session::new(idea, location);
        let id = fresh.id;
        {
            let mut slot = self.session.lock().await;
            if let Some(previous) = slot.replace(fresh) {
                tracing::info!(session_id = %previous.id, "previous session discarded");
            }
        }
        tracing::info!(session_id = %id, idea, location, "debate started");

        let optimist = self.ask(id, Role::Optimist, idea, location, None).await?;
        let optimist_text = optimist.text.clone();
        self.commit(id, Event::Responded(optimist)).await?;

        // The skeptic rebuts the optimist's claims, so it runs strictly after
        let skeptic = self
            .ask(id, Role::Skeptic, idea, location, Some(&optimist_text))
            .await?;
        self.commit(id, Event::Responded(skeptic)).await?;
        self.commit(id, Event::ArgumentsClosed).await?;

        tracing::info!(session_id = %id, "generating clarifying questions");
        let questions = self.clarifier.generate(idea, location).await;
        let questions = self.contain(id, questions).await?;
        self.commit(id, Event::QuestionsGenerated(questions)).await
    }

    /// Answer the three questions and run the debate to a verdict.
    ///
    /// Rejected without any state change unless the live session is waiting
    /// in `Clarifying` with its questions and all three answers are present.
    pub async fn submit_clarifications(&self, answers: Vec<String>) -> DebateResult<Session> {
        let count = answers.len();
        let answers: [String; CLARIFICATION_COUNT] = answers.try_into().map_err(|_| {
            DebateError::invalid_input(format!(
                "expected {} answers, got {}",
                CLARIFICATION_COUNT, count
            ))
        })?;
        if let Some(blank) = answers.iter().position(|a| a.trim().is_empty()) {
            return Err(DebateError::invalid_input(format!(
                "answer {} is empty",
                blank + 1
            )));
        }

        let refining = {
            let mut slot = self.session.lock().await;
            let current = slot
                .as_ref()
                .ok_or_else(|| DebateError::invalid_input("no debate in progress"))?;
            let next = session::reduce(current, Event::AnswersSubmitted(answers))
                .map_err(|e| DebateError::invalid_input(e.to_string()))?;
            *slot = Some(next.clone());
            next
        };
        let id = refining.id;
        let (idea, location) = (refining.idea.as_str(), refining.location.as_str());
        tracing::info!(session_id = %id, "clarifications submitted, refining");

        // Independent of each other: issue both, wait for both, fail on the first error
        let analysts = tokio::try_join!(
            self.call(Role::SocialListener, idea, location, None),
            self.call(Role::AdAnalyst, idea, location, None)
        );
        let (social, ads) = self.contain(id, analysts).await?;
        self.commit(id, Event::Responded(social)).await?;
        self.commit(id, Event::Responded(ads)).await?;
        let judging = self.commit(id, Event::EvidenceClosed).await?;

        let context = judge_context(&judging);
        tracing::info!(session_id = %id, context_len = context.len(), "judging");
        let verdict = self
            .invoker
            .invoke(Role::Judge, idea, location, Some(&context))
            .await
            .and_then(|output| output.into_verdict(Role::Judge));
        let verdict = self.contain(id, verdict).await?;
        self.ensure_live(id).await?;

        // The verdict is held back until the ruling exists: both or neither
        let ruling = match serde_json::to_string(&verdict) {
            Ok(serialized) => {
                let ruling_context = format!("{}\n{}", serialized, context);
                self.call(Role::TieBreaker, idea, location, Some(&ruling_context))
                    .await
                    .map(|response| response.text)
            }
            Err(e) => Err(DebateError::malformed(Role::Judge, e.to_string())),
        };
        let ruling = self.contain(id, ruling).await?;

        let completed = self
            .commit(id, Event::VerdictReached(verdict.with_ruling(ruling)))
            .await?;
        tracing::info!(
            session_id = %id,
            score = completed.verdict.as_ref().map(|v| v.viability_score),
            "debate completed"
        );
        Ok(completed)
    }

    /// Invoke a text-producing role and fail the session if it errors
    async fn ask(
        &self,
        id: SessionId,
        role: Role,
        idea: &str,
        location: &str,
        context: Option<&str>,
    ) -> DebateResult<AgentResponse> {
        let result = self.call(role, idea, location, context).await;
        self.contain(id, result).await
    }

    /// One text call, no session side effects
    async fn call(
        &self,
        role: Role,
        idea: &str,
        location: &str,
        context: Option<&str>,
    ) -> DebateResult<AgentResponse> {
        tracing::debug!(%role, "agent call");
        let text = self
            .invoker
            .invoke(role, idea, location, context)
            .await
            .and_then(|output| output.into_text(role))?;
        Ok(AgentResponse::new(role, text))
    }

    /// Pass a phase result through, failing the session on error
    async fn contain<T>(&self, id: SessionId, result: DebateResult<T>) -> DebateResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(error) => Err(self.fail(id, error).await),
        }
    }

    /// Mark the session failed and hand back the error to report
    async fn fail(&self, id: SessionId, error: DebateError) -> DebateError {
        tracing::error!(session_id = %id, kind = ?error.kind(), %error, "phase failed");
        match self.commit(id, Event::Failed(FailureInfo::from(&error))).await {
            Ok(_) => error,
            Err(superseded) => superseded,
        }
    }

    /// Stop a phase early when its session has been reset
    async fn ensure_live(&self, id: SessionId) -> DebateResult<()> {
        let slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|s| s.id == id) {
            return Ok(());
        }
        tracing::warn!(session_id = %id, "session reset mid-phase, stopping");
        Err(DebateError::SessionSuperseded)
    }

    /// Fold an event into the session it belongs to
    async fn commit(&self, id: SessionId, event: Event) -> DebateResult<Session> {
        let mut slot = self.session.lock().await;
        match session::apply(slot.as_ref(), id, event) {
            Ok(next) => {
                *slot = Some(next.clone());
                Ok(next)
            }
            Err(ApplyError::Stale { target }) => {
                tracing::warn!(session_id = %target, "discarding result for a reset session");
                Err(DebateError::SessionSuperseded)
            }
            Err(ApplyError::Transition(e)) => {
                tracing::error!(session_id = %id, error = %e, "rejected session transition");
                Err(DebateError::invalid_input(e.to_string()))
            }
        }
    }
}
