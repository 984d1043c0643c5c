//! screen-pilot runner.
//!
//! Wires the agent session to the real input gateway and the remote model,
//! then drives turns until the agent ends the session or the turn budget is
//! exhausted.

mod config_loader;
mod models;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::{debug, info, warn};

use screen_pilot_core::agent::driver::{InputDriver, ResultPayload};
use screen_pilot_core::agent::{
    AgentSession, ContentBlock, SessionConfig, ToolCatalog, TurnOutcome,
};
use screen_pilot_core::llm::{AnthropicClient, AnthropicConfig};
use screen_pilot_gateway::{EnigoGateway, GatewayConfig};

use crate::config_loader::ConfigLoader;

const CONFIG_FILE: &str = "screen-pilot.toml";
const DEFAULT_OBJECTIVE: &str =
    "Take a screenshot to see the current game view, then start playing.";

#[derive(Parser, Debug)]
#[command(name = "screen-pilot", about = "Drive a game with a remote model agent.")]
struct Cli {
    /// Model to use: a name, an id, or an alias (0: dev, 1: stable, 2: prod).
    #[arg(short, long)]
    model: Option<String>,

    /// Objective given to the agent on the first turn.
    #[arg(short, long)]
    prompt: Option<String>,

    /// Maximum number of request/response turns before the run stops.
    #[arg(long)]
    max_turns: Option<u32>,

    /// Directory where requested screenshots are saved.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Explicit config file (otherwise screen-pilot.toml is searched for).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Optional TOML config; CLI flags take precedence over every field.
#[derive(Debug, Clone, Default, Deserialize)]
struct RunnerConfig {
    model: Option<String>,
    prompt: Option<String>,
    max_turns: Option<u32>,
    output_dir: Option<PathBuf>,
    worker_timeout_secs: Option<u64>,
    max_workers: Option<usize>,
    window_capacity: Option<usize>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("screen-pilot fatal error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => ConfigLoader::parse_at::<RunnerConfig>(path)?,
        None => ConfigLoader::parse_optional::<RunnerConfig>(CONFIG_FILE)?.unwrap_or_default(),
    };

    let model_input = cli
        .model
        .or(file_config.model)
        .unwrap_or_else(|| models::DEFAULT_MODEL_ALIAS.to_string());
    let model_id = models::resolve_model(&model_input)
        .with_context(|| format!("unknown model or alias: '{model_input}'"))?;
    info!(model = model_id, "selected model");

    let client = AnthropicClient::new(AnthropicConfig::from_env(model_id)?);

    let output_dir = cli
        .output_dir
        .or(file_config.output_dir)
        .unwrap_or_else(|| GatewayConfig::default().output_dir);
    let gateway = EnigoGateway::open(GatewayConfig { output_dir })?;
    let driver: Arc<dyn InputDriver> = Arc::new(gateway);

    let mut session_config = SessionConfig::default();
    if let Some(capacity) = file_config.window_capacity {
        session_config.window_capacity = capacity;
    }
    if let Some(secs) = file_config.worker_timeout_secs {
        session_config.dispatch.worker_timeout = Duration::from_secs(secs);
    }
    if let Some(workers) = file_config.max_workers {
        session_config.dispatch.max_workers = workers;
    }
    let mut session = AgentSession::with_config(ToolCatalog::standard()?, session_config);

    let objective = cli
        .prompt
        .or(file_config.prompt)
        .unwrap_or_else(|| DEFAULT_OBJECTIVE.to_string());
    let max_turns = cli.max_turns.or(file_config.max_turns).unwrap_or(25);

    info!(max_turns, "starting session: {objective}");
    let mut input = vec![ContentBlock::text(objective)];
    let mut turns_remaining = max_turns;

    while session.is_running() && turns_remaining > 0 {
        turns_remaining -= 1;
        let outcome = session
            .run_turn(&client, &driver, std::mem::take(&mut input))
            .await?;
        match outcome {
            TurnOutcome::Completed { results } => {
                debug!(results = results.len(), "turn complete");
            }
            TurnOutcome::Terminated { .. } => {
                info!("agent ended the session");
            }
            TurnOutcome::ProtocolMismatch { error } => {
                let detail = match error.payload {
                    ResultPayload::Error(detail) => detail,
                    other => format!("{other:?}"),
                };
                anyhow::bail!("protocol mismatch with the model: {detail}");
            }
            TurnOutcome::Idle => {
                debug!("idle turn; the model issued no tool calls");
            }
        }
    }

    if session.is_running() && turns_remaining == 0 {
        warn!(max_turns, "turn budget exhausted before the agent ended the session");
    }

    let usage = session.usage();
    info!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "session finished"
    );
    Ok(())
}
