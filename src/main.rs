//! warroom CLI
//!
//! Business idea war room - debate, verdict, ruling.
//!
//! Run with: warroom run --idea "..." --location "..."
//! Or interactively: warroom repl

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use warroom::{
    render, DebateOrchestrator, GeminiClarifier, GeminiInvoker, InvokerConfig, Session,
    SessionStatus, CLARIFICATION_COUNT,
};

#[derive(Parser)]
#[command(name = "warroom", version, about = "Battle-test a business idea with an agent debate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one debate end to end
    Run {
        /// The business concept
        #[arg(long)]
        idea: String,

        /// Target location
        #[arg(long)]
        location: String,

        /// Answers to the clarifying questions, in order (prompted if omitted)
        #[arg(long = "answer")]
        answers: Vec<String>,

        /// Print the final session as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Interactive war room
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warroom=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let orchestrator = build_orchestrator()?;

    match cli.command {
        Command::Run {
            idea,
            location,
            answers,
            json,
        } => run_once(&orchestrator, &idea, &location, answers, json).await,
        Command::Repl => run_repl(&orchestrator).await,
    }
}

fn build_orchestrator() -> Result<DebateOrchestrator> {
    let config = InvokerConfig::from_env()?;
    tracing::info!(
        fast_model = %config.fast_model,
        reasoning_model = %config.reasoning_model,
        "invoker configured"
    );
    Ok(DebateOrchestrator::new(
        Arc::new(GeminiInvoker::new(config.clone())?),
        Arc::new(GeminiClarifier::new(config)?),
    ))
}

async fn run_once(
    orchestrator: &DebateOrchestrator,
    idea: &str,
    location: &str,
    answers: Vec<String>,
    json: bool,
) -> Result<()> {
    if !answers.is_empty() && answers.len() != CLARIFICATION_COUNT {
        bail!("pass exactly {} --answer values, or none to be prompted", CLARIFICATION_COUNT);
    }

    let opened = orchestrator.start(idea, location).await;
    let session = report_phase(orchestrator, opened, json).await?;
    if !json {
        print!("{}", render::session_report(&session));
    }

    let answers = if answers.is_empty() {
        prompt_answers(&session)?
    } else {
        answers
    };

    let finished = orchestrator.submit_clarifications(answers).await;
    let session = report_phase(orchestrator, finished, json).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print!("{}", render::session_report(&session));
    }
    Ok(())
}

/// Show the failed session before surfacing a phase error
async fn report_phase(
    orchestrator: &DebateOrchestrator,
    result: warroom::DebateResult<Session>,
    json: bool,
) -> Result<Session> {
    match result {
        Ok(session) => Ok(session),
        Err(e) => {
            if let Some(session) = orchestrator.snapshot().await {
                if json {
                    println!("{}", serde_json::to_string_pretty(&session)?);
                } else {
                    print!("{}", render::session_report(&session));
                }
            }
            Err(e).context("debate failed")
        }
    }
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_answers(session: &Session) -> Result<Vec<String>> {
    let questions = session
        .questions()
        .context("session has no clarifying questions")?;

    let mut answers = Vec::with_capacity(CLARIFICATION_COUNT);
    for (i, question) in questions.iter().enumerate() {
        loop {
            let prompt = format!("Q{}: {}\n> ", i + 1, question);
            let Some(answer) = read_line(&prompt)? else {
                bail!("input closed before all questions were answered");
            };
            if !answer.is_empty() {
                answers.push(answer);
                break;
            }
            println!("An answer is required.");
        }
    }
    Ok(answers)
}

async fn run_repl(orchestrator: &DebateOrchestrator) -> Result<()> {
    println!("MABI War Room");
    println!("=============");
    println!("Type /help for commands, 'quit' to exit.\n");

    loop {
        let Some(line) = read_line("> ")? else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match line.as_str() {
            "/help" => {
                println!("Commands:");
                println!("  /new       Start a debate (prompts for idea and location)");
                println!("  /status    Show the current session");
                println!("  /reset     Discard the current session");
                println!("  /help      Show this help");
                println!("  quit       Exit");
            }
            "/status" => match orchestrator.snapshot().await {
                Some(session) => print!("{}", render::session_report(&session)),
                None => println!("No active session."),
            },
            "/reset" => {
                orchestrator.reset().await;
                println!("Terminal reset.");
            }
            "/new" => {
                if let Err(e) = repl_debate(orchestrator).await {
                    eprintln!("Error: {:#}", e);
                }
            }
            other => println!("Unknown command: {}. Try /help", other),
        }
    }

    Ok(())
}

async fn repl_debate(orchestrator: &DebateOrchestrator) -> Result<()> {
    let Some(idea) = read_line("Business concept: ")? else {
        return Ok(());
    };
    let Some(location) = read_line("Target location: ")? else {
        return Ok(());
    };

    println!("Initializing hive...");
    let opened = orchestrator.start(&idea, &location).await;
    let session = report_phase(orchestrator, opened, false).await?;
    print!("{}", render::session_report(&session));

    if session.status != SessionStatus::Clarifying {
        return Ok(());
    }
    let answers = prompt_answers(&session)?;

    println!("Submitting refinements to hive...");
    let finished = orchestrator.submit_clarifications(answers).await;
    let session = report_phase(orchestrator, finished, false).await?;
    print!("{}", render::session_report(&session));
    Ok(())
}
