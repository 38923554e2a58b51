//! Plain-text rendering for terminals
//!
//! Builds strings rather than printing so the binary decides where output
//! goes and tests can look at it.

use crate::types::{AgentResponse, ClarificationSet, Role, Session, SessionStatus, Verdict};
use std::fmt::Write;

const WIDTH: usize = 72;
const RULE: &str = "────────────────────────────────────────────────────────────────────────";

/// Wrap `s` to `width` columns, indenting continuation lines with `prefix`
pub fn wrap_text(s: &str, width: usize, prefix: &str) -> String {
    let mut result = String::new();
    let mut line = String::new();

    for word in s.split_whitespace() {
        if !line.is_empty() && line.len() + word.len() + 1 > width {
            if !result.is_empty() {
                result.push('\n');
                result.push_str(prefix);
            }
            result.push_str(&line);
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() {
        if !result.is_empty() {
            result.push('\n');
            result.push_str(prefix);
        }
        result.push_str(&line);
    }

    result
}

/// `[██████░░░░]` for a 0-10 score
pub fn score_bar(score: f64) -> String {
    let filled = score.round().clamp(0.0, 10.0) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(10 - filled))
}

pub fn agent_card(response: &AgentResponse) -> String {
    format!(
        "{} {}\n   {}\n",
        response.role.emoji(),
        response.role.name(),
        wrap_text(&response.text, WIDTH - 3, "   ")
    )
}

/// Card for a role that has not spoken yet
pub fn pending_card(role: Role) -> String {
    format!("{} {}\n   …thinking\n", role.emoji(), role.name())
}

pub fn questions(set: &ClarificationSet) -> String {
    let mut out = String::from("RECURSIVE REFINEMENT INPUT REQUIRED\n");
    for (i, (question, answer)) in set.pairs().enumerate() {
        let _ = writeln!(out, "  Q{}: {}", i + 1, wrap_text(question, WIDTH - 6, "      "));
        if !answer.is_empty() {
            let _ = writeln!(out, "      → {}", answer);
        }
    }
    out
}

fn bullet_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", title);
    for item in items {
        let _ = writeln!(out, "   • {}", wrap_text(item, WIDTH - 5, "     "));
    }
}

pub fn verdict_dashboard(verdict: &Verdict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "{} VERDICT  {} {:.1}/10",
        Role::Judge.emoji(),
        score_bar(verdict.viability_score),
        verdict.viability_score
    );
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}\n", wrap_text(&verdict.summary, WIDTH, ""));

    bullet_list(&mut out, "Key risks", &verdict.key_risks);
    bullet_list(&mut out, "Key opportunities", &verdict.key_opportunities);
    bullet_list(&mut out, "Market trends", &verdict.market_trends);

    let _ = writeln!(out, "Social sentiment: {}", verdict.social_sentiment);
    let _ = writeln!(out, "Estimated CAC:    {}", verdict.estimated_cac);

    if let Some(ruling) = &verdict.tie_breaker_ruling {
        let _ = writeln!(out, "\n{} {} RULING", Role::TieBreaker.emoji(), Role::TieBreaker.name());
        let _ = writeln!(out, "   {}", wrap_text(ruling, WIDTH - 3, "   "));
    }

    if verdict.sources.is_empty() {
        let _ = writeln!(out, "\nSources: none cited");
    } else {
        let _ = writeln!(out, "\nSources:");
        for source in &verdict.sources {
            let _ = writeln!(out, "   - {} <{}>", source.title, source.uri);
        }
    }
    out
}

/// Everything known about a session, top to bottom
pub fn session_report(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ACTIVE WAR SESSION  [{}]", session.status.label().to_uppercase());
    let _ = writeln!(out, "{}", wrap_text(&session.idea, WIDTH, ""));
    let _ = writeln!(out, "GEO LOCK: {}\n", session.location);

    for response in &session.responses {
        out.push_str(&agent_card(response));
        out.push('\n');
    }
    for role in session.in_flight_roles() {
        out.push_str(&pending_card(role));
        out.push('\n');
    }

    if let Some(set) = &session.clarifications {
        if session.status == SessionStatus::Clarifying {
            out.push_str(&questions(set));
            out.push('\n');
        }
    }

    if let Some(verdict) = &session.verdict {
        out.push_str(&verdict_dashboard(verdict));
    }

    if let Some(notice) = session.failure_notice() {
        let _ = writeln!(out, "{}", notice);
    }
    out
}
