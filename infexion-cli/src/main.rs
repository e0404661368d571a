//! Infexion CLI - Command-line interface
//!
//! Commands:
//! - match: Self-play games between two agent configurations
//! - analyse: Run one decision on a position loaded from JSON

mod analyse_cmd;
mod match_cmd;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use infexion_core::AgentConfig;

#[derive(Parser)]
#[command(name = "infexion")]
#[command(about = "Infexion alpha-beta agent")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a series of games between two agents
    Match(match_cmd::MatchArgs),
    /// Pick a move for a saved position
    Analyse(analyse_cmd::AnalyseArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Match(args) => match_cmd::run(args),
        Commands::Analyse(args) => analyse_cmd::run(args),
    }
}

/// Agent config from an optional file, optionally pinned to a fixed depth
fn load_agent_config(path: Option<&Path>, depth: Option<u32>) -> Result<AgentConfig> {
    let config = match path {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };

    Ok(match depth {
        Some(depth) => config.with_depth_schedule(infexion_core::DepthSchedule::fixed(depth)),
        None => config,
    })
}
