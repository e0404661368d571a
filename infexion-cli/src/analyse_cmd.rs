//! Analyse command - run one decision on a saved position

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use infexion_core::{Action, Agent, Board, BoardSnapshot, Decision};

#[derive(Args)]
pub struct AnalyseArgs {
    /// Position JSON file
    #[arg(long, value_name = "FILE")]
    pub position: PathBuf,

    /// Seconds left on the mover's clock
    #[arg(long, default_value = "180")]
    pub time_remaining: f32,

    /// Agent config JSON (defaults if omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Search this depth instead of the time schedule
    #[arg(long)]
    pub depth: Option<u32>,

    /// Output the decision as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: AnalyseArgs) -> Result<()> {
    let board = load_position(&args.position)?;
    let config = crate::load_agent_config(args.config.as_deref(), args.depth)?;

    let mut agent = Agent::with_config(board.turn(), config);
    agent.set_board(board);

    let decision = agent
        .decide(args.time_remaining)
        .with_context(|| format!("No decision for {} in {}", board.turn(), args.position.display()))?;

    if args.json {
        print_json_decision(&decision)?;
    } else {
        print!("{}", board);
        print_text_decision(&decision);
    }

    Ok(())
}

fn load_position(path: &Path) -> Result<Board> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read position: {}", path.display()))?;
    let snapshot: BoardSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse position: {}", path.display()))?;
    Board::from_snapshot(&snapshot)
        .with_context(|| format!("Invalid position: {}", path.display()))
}

fn print_json_decision(decision: &Decision) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonDecision {
        action: Action,
        action_text: String,
        score: f32,
        depth: u32,
        nodes: u64,
        candidates: usize,
        timed_out: bool,
        elapsed_ms: u128,
    }

    let output = JsonDecision {
        action: decision.action,
        action_text: decision.action.to_string(),
        score: decision.score,
        depth: decision.depth,
        nodes: decision.nodes,
        candidates: decision.candidates,
        timed_out: decision.timed_out,
        elapsed_ms: decision.elapsed.as_millis(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_decision(decision: &Decision) {
    println!("\nBest move:  {}", decision.action);
    println!("Score:      {:.1}", decision.score);
    println!("Depth:      {}", decision.depth);
    println!("Candidates: {}", decision.candidates);
    println!("Nodes:      {}", decision.nodes);
    println!("Elapsed:    {:.3}s", decision.elapsed.as_secs_f32());
    if decision.timed_out {
        println!("(deadline reached before all candidates were searched)");
    }
}
