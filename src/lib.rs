//! warroom - Business Idea War Room
//!
//! Puts a business idea for a given location through a staged debate
//! between six agents and ends with a structured verdict plus a
//! tie-breaking ruling.
//!
//! # Phases
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ start(idea, location)                                        │
//! │   Analyzing   Optimist ──▶ Skeptic (rebuts the optimist)     │
//! │   Clarifying  three questions for the user                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ submit_clarifications([a, b, c])                             │
//! │   Refining    Social Listener ∥ Ad-Spend Analyst             │
//! │   Judging     Judge (structured verdict) ──▶ Tie-Breaker     │
//! │   Completed   verdict + ruling                               │
//! └──────────────────────────────────────────────────────────────┘
//!   reset() discards everything, from any state
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warroom::{DebateOrchestrator, GeminiClarifier, GeminiInvoker, InvokerConfig};
//!
//! let config = InvokerConfig::new(api_key);
//! let orchestrator = DebateOrchestrator::new(
//!     Arc::new(GeminiInvoker::new(config.clone())?),
//!     Arc::new(GeminiClarifier::new(config)?),
//! );
//!
//! let session = orchestrator.start("luxury dog perfume subscription", "Silicon Valley, USA").await?;
//! let questions = session.questions();
//! let done = orchestrator.submit_clarifications(answers).await?;
//! println!("{}", done.verdict.unwrap().viability_score);
//! ```

pub mod agent;
pub mod clarify;
pub mod config;
pub mod error;
pub mod gemini;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod types;

// Core types
pub use orchestrator::{judge_context, DebateOrchestrator};
pub use types::*;
pub use error::{CallTarget, DebateError, DebateResult, ErrorKind};

// Agent boundary
pub use agent::{AgentInvoker, AgentOutput, GeminiInvoker, RoleProfile};
pub use clarify::{ClarificationGenerator, GeminiClarifier};
pub use config::InvokerConfig;

// Reducer
pub use session::{apply, reduce, Event};
