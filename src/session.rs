//! Session reducer
//!
//! Every change to a [`Session`] goes through [`reduce`], a pure function of
//! (session, event). The orchestrator never edits a session in place; it
//! folds phase results in through [`apply`], which also performs the
//! session-identity check that keeps results from a reset debate out of the
//! live one.

use crate::types::{
    AgentResponse, ClarificationSet, FailureInfo, Role, Session, SessionId, SessionStatus, Verdict,
    CLARIFICATION_COUNT,
};
use thiserror::Error;

/// Something a phase produced
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An agent's text arrived
    Responded(AgentResponse),
    /// Optimist and skeptic are both in; move to clarifying
    ArgumentsClosed,
    /// The three clarifying questions are ready
    QuestionsGenerated([String; CLARIFICATION_COUNT]),
    /// The user answered all three questions; move to refining
    AnswersSubmitted([String; CLARIFICATION_COUNT]),
    /// Both analysts are in; move to judging
    EvidenceClosed,
    /// Judge and tie-breaker both finished; the verdict carries its ruling
    VerdictReached(Verdict),
    /// A phase aborted
    Failed(FailureInfo),
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Responded(_) => "responded",
            Event::ArgumentsClosed => "arguments_closed",
            Event::QuestionsGenerated(_) => "questions_generated",
            Event::AnswersSubmitted(_) => "answers_submitted",
            Event::EvidenceClosed => "evidence_closed",
            Event::VerdictReached(_) => "verdict_reached",
            Event::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("session is {0} and accepts no further events")]
    Terminal(SessionStatus),
    #[error("event {event} is not valid while {status}")]
    OutOfOrder {
        status: SessionStatus,
        event: &'static str,
    },
    #[error("{0}")]
    Invariant(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApplyError {
    /// The event belongs to a session that is no longer live
    #[error("event for session {target} arrived after it was discarded")]
    Stale { target: SessionId },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Roles that append text while in `status`, in the order they must appear
fn speaking_order(status: SessionStatus) -> &'static [Role] {
    match status {
        SessionStatus::Analyzing => &[Role::Optimist, Role::Skeptic],
        SessionStatus::Refining => &[Role::SocialListener, Role::AdAnalyst],
        _ => &[],
    }
}

fn all_spoke(session: &Session) -> bool {
    speaking_order(session.status)
        .iter()
        .all(|role| session.response_for(*role).is_some())
}

fn advance(session: &mut Session, next: SessionStatus, event: &Event) -> Result<(), TransitionError> {
    if !session.status.can_advance_to(next) {
        return Err(TransitionError::OutOfOrder {
            status: session.status,
            event: event.name(),
        });
    }
    session.status = next;
    Ok(())
}

/// Fold one event into a session, returning the new session
pub fn reduce(session: &Session, event: Event) -> Result<Session, TransitionError> {
    if session.status.is_terminal() {
        return Err(TransitionError::Terminal(session.status));
    }

    let out_of_order = |event: &Event| TransitionError::OutOfOrder {
        status: session.status,
        event: event.name(),
    };

    let mut next = session.clone();
    match event {
        Event::Responded(response) => {
            let expected = speaking_order(session.status)
                .iter()
                .copied()
                .find(|role| session.response_for(*role).is_none());
            match expected {
                Some(role) if role == response.role => next.responses.push(response),
                Some(role) => {
                    return Err(TransitionError::Invariant(format!(
                        "expected {} to speak next, got {}",
                        role, response.role
                    )))
                }
                None => return Err(out_of_order(&Event::Responded(response))),
            }
        }
        Event::ArgumentsClosed | Event::EvidenceClosed => {
            let target = match (&event, session.status) {
                (Event::ArgumentsClosed, SessionStatus::Analyzing) => SessionStatus::Clarifying,
                (Event::EvidenceClosed, SessionStatus::Refining) => SessionStatus::Judging,
                _ => return Err(out_of_order(&event)),
            };
            if !all_spoke(session) {
                return Err(TransitionError::Invariant(format!(
                    "cannot close {} before every agent has spoken",
                    session.status
                )));
            }
            advance(&mut next, target, &event)?;
        }
        Event::QuestionsGenerated(questions) => {
            if session.status != SessionStatus::Clarifying || session.clarifications.is_some() {
                return Err(out_of_order(&Event::QuestionsGenerated(questions)));
            }
            next.clarifications = Some(ClarificationSet::new(questions));
        }
        Event::AnswersSubmitted(answers) => {
            let ready = session.status == SessionStatus::Clarifying;
            let Some(clarifications) = next.clarifications.as_mut().filter(|_| ready) else {
                return Err(out_of_order(&Event::AnswersSubmitted(answers)));
            };
            if answers.iter().any(|a| a.trim().is_empty()) {
                return Err(TransitionError::Invariant(
                    "every clarifying question needs an answer".into(),
                ));
            }
            clarifications.answers = answers;
            next.status = SessionStatus::Refining;
        }
        Event::VerdictReached(verdict) => {
            if session.status != SessionStatus::Judging {
                return Err(out_of_order(&Event::VerdictReached(verdict)));
            }
            if !verdict.is_ruled() {
                return Err(TransitionError::Invariant(
                    "a verdict is only stored together with its tie-breaker ruling".into(),
                ));
            }
            next.verdict = Some(verdict);
            next.status = SessionStatus::Completed;
        }
        Event::Failed(failure) => {
            next.failure = Some(failure);
            next.status = SessionStatus::Failed;
        }
    }
    Ok(next)
}

/// Fold an event addressed to `target` into the live session.
///
/// Rejects the event as stale when no session is live or the live one has a
/// different identity.
pub fn apply(
    current: Option<&Session>,
    target: SessionId,
    event: Event,
) -> Result<Session, ApplyError> {
    match current {
        Some(session) if session.id == target => Ok(reduce(session, event)?),
        _ => Err(ApplyError::Stale { target }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DebateError, ErrorKind};

    fn questions() -> [String; 3] {
        ["Model?".into(), "Price?".into(), "Audience?".into()]
    }

    fn answers() -> [String; 3] {
        ["B2C DTC".into(), "$40/mo".into(), "Millennial pet owners".into()]
    }

    fn verdict() -> Verdict {
        Verdict {
            viability_score: 7.0,
            summary: "Promising".into(),
            key_risks: vec![],
            key_opportunities: vec![],
            market_trends: vec![],
            social_sentiment: "warm".into(),
            estimated_cac: "$40".into(),
            tie_breaker_ruling: None,
            sources: vec![],
        }
    }

    fn say(role: Role) -> Event {
        Event::Responded(AgentResponse::new(role, format!("{} text", role)))
    }

    fn fold(session: Session, events: Vec<Event>) -> Session {
        events
            .into_iter()
            .fold(session, |s, e| reduce(&s, e).unwrap())
    }

    fn clarifying() -> Session {
        fold(
            Session::new("idea", "place"),
            vec![
                say(Role::Optimist),
                say(Role::Skeptic),
                Event::ArgumentsClosed,
                Event::QuestionsGenerated(questions()),
            ],
        )
    }

    #[test]
    fn test_full_happy_path() {
        let session = fold(
            clarifying(),
            vec![
                Event::AnswersSubmitted(answers()),
                say(Role::SocialListener),
                say(Role::AdAnalyst),
                Event::EvidenceClosed,
                Event::VerdictReached(verdict().with_ruling("Go regional")),
            ],
        );

        assert_eq!(session.status, SessionStatus::Completed);
        let roles: Vec<Role> = session.responses.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![Role::Optimist, Role::Skeptic, Role::SocialListener, Role::AdAnalyst]
        );
        assert!(session.verdict.unwrap().is_ruled());
        assert!(session.clarifications.unwrap().is_answered());
    }

    #[test]
    fn test_reduce_does_not_touch_input() {
        let before = Session::new("idea", "place");
        let after = reduce(&before, say(Role::Optimist)).unwrap();
        assert!(before.responses.is_empty());
        assert_eq!(after.responses.len(), 1);
    }

    #[test]
    fn test_skeptic_cannot_speak_first() {
        let session = Session::new("idea", "place");
        let err = reduce(&session, say(Role::Skeptic)).unwrap_err();
        assert!(matches!(err, TransitionError::Invariant(_)));
    }

    #[test]
    fn test_cannot_close_arguments_early() {
        let session = fold(Session::new("idea", "place"), vec![say(Role::Optimist)]);
        assert!(reduce(&session, Event::ArgumentsClosed).is_err());
    }

    #[test]
    fn test_answers_need_questions_first() {
        let session = fold(
            Session::new("idea", "place"),
            vec![say(Role::Optimist), say(Role::Skeptic), Event::ArgumentsClosed],
        );
        let err = reduce(&session, Event::AnswersSubmitted(answers())).unwrap_err();
        assert!(matches!(err, TransitionError::OutOfOrder { .. }));
    }

    #[test]
    fn test_blank_answer_rejected() {
        let mut partial = answers();
        partial[1] = "  ".into();
        let err = reduce(&clarifying(), Event::AnswersSubmitted(partial)).unwrap_err();
        assert!(matches!(err, TransitionError::Invariant(_)));
    }

    #[test]
    fn test_unruled_verdict_rejected() {
        let judging = fold(
            clarifying(),
            vec![
                Event::AnswersSubmitted(answers()),
                say(Role::SocialListener),
                say(Role::AdAnalyst),
                Event::EvidenceClosed,
            ],
        );
        assert!(reduce(&judging, Event::VerdictReached(verdict())).is_err());
    }

    #[test]
    fn test_failed_is_terminal_and_keeps_partial_progress() {
        let err = DebateError::invocation(Role::Skeptic, "timeout");
        let failed = fold(
            Session::new("idea", "place"),
            vec![say(Role::Optimist), Event::Failed(FailureInfo::from(&err))],
        );

        assert_eq!(failed.status, SessionStatus::Failed);
        assert_eq!(failed.responses.len(), 1);
        assert_eq!(failed.failure.as_ref().unwrap().kind, ErrorKind::Invocation);
        assert_eq!(
            reduce(&failed, say(Role::Skeptic)).unwrap_err(),
            TransitionError::Terminal(SessionStatus::Failed)
        );
    }

    #[test]
    fn test_apply_rejects_other_session() {
        let a = Session::new("A", "here");
        let b = Session::new("B", "there");

        let err = apply(Some(&b), a.id, say(Role::Optimist)).unwrap_err();
        assert_eq!(err, ApplyError::Stale { target: a.id });

        let err = apply(None, a.id, say(Role::Optimist)).unwrap_err();
        assert!(matches!(err, ApplyError::Stale { .. }));

        let applied = apply(Some(&b), b.id, say(Role::Optimist)).unwrap();
        assert_eq!(applied.responses.len(), 1);
    }
}
