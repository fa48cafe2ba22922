//! `shai` - a terminal chat agent with a read-only shell tool
//!
//! Wires the pieces together: configuration, the streaming LLM client, the
//! tool registry around the sandboxed executor, the conversation engine,
//! and either the TUI or a one-shot printer on top.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write as _;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::agent::tools::RunBashTool;
use crate::agent::{AgentEvent, ConversationEngine, Tool, ToolRegistry};
use crate::cli::Cli;
use crate::config::Config;
use crate::executor::CommandExecutor;
use crate::llm::{LlmClient, LlmConfig};
use crate::transcript::TranscriptEntry;
use crate::tui::app::App;

mod agent;
mod cli;
mod config;
mod error;
mod executor;
mod llm;
mod transcript;
mod tui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().context("Failed to load configuration")?,
    };
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(max_steps) = cli.max_steps {
        config.max_steps = max_steps;
    }

    let llm_config = LlmConfig::new(
        config.base_url.clone(),
        config.model.clone(),
        config.resolved_api_key(),
    );
    let client = Arc::new(LlmClient::new(llm_config)?);

    let executor = Arc::new(CommandExecutor::new());
    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(RunBashTool::new(executor))];
    let registry = ToolRegistry::new(tools);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let engine = ConversationEngine::new(
        client,
        registry,
        config.system_prompt.clone(),
        config.max_steps,
        event_tx,
    );

    if cli.query.is_empty() {
        run_interactive(engine, event_rx).await
    } else {
        run_one_shot(engine, event_rx, cli.query.join(" ")).await
    }
}

/// Interactive mode: the engine runs on its own task while the TUI renders
/// the transcript and in-flight stream.
async fn run_interactive(
    engine: ConversationEngine,
    event_rx: mpsc::UnboundedReceiver<AgentEvent>,
) -> Result<()> {
    let (submit_tx, submit_rx) = mpsc::unbounded_channel();
    let engine_task = tokio::spawn(engine.run(submit_rx));

    tui::run(App::new(), submit_tx, event_rx)
        .await
        .context("TUI session failed")?;

    // Closing the submit channel (dropped by the TUI) stops the engine
    engine_task.await.context("engine task panicked")?;
    Ok(())
}

/// One-shot mode: run a single turn and print the stream to stdout.
async fn run_one_shot(
    mut engine: ConversationEngine,
    mut event_rx: mpsc::UnboundedReceiver<AgentEvent>,
    query: String,
) -> Result<()> {
    let printer = tokio::spawn(async move {
        let mut failed = false;
        while let Some(event) = event_rx.recv().await {
            match event {
                AgentEvent::StreamDelta(delta) => {
                    print!("{}", delta);
                    let _ = std::io::stdout().flush();
                }
                AgentEvent::Entry(TranscriptEntry::ToolCall { tool, input }) => {
                    println!("\n🔧 {} {}", tool, input);
                }
                AgentEvent::Entry(TranscriptEntry::ToolResult { tool, output, .. }) => {
                    println!("✓ {}: {}", tool, output);
                }
                AgentEvent::Entry(_) => {}
                AgentEvent::TurnFinished(usage) => {
                    println!();
                    if usage.total_tokens > 0 {
                        eprintln!("{}", usage);
                    }
                }
                AgentEvent::TurnFailed(message) => {
                    eprintln!("error: {}", message);
                    failed = true;
                }
            }
        }
        failed
    });

    engine.run_turn(&query).await;
    drop(engine); // closes the event channel so the printer finishes

    let failed = printer.await.context("printer task panicked")?;
    if failed {
        anyhow::bail!("turn aborted by a model transport failure");
    }
    Ok(())
}

/// Log to a file under the user data dir; the TUI owns stdout. Logging is
/// best effort: any setup failure leaves tracing disabled.
fn init_tracing() {
    let Some(dir) = dirs::data_dir() else {
        return;
    };
    let dir = dir.join("shai");
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("shai.log")) else {
        return;
    };
    let filter = EnvFilter::try_from_env("SHAI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
