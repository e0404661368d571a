//! Match command - self-play between two agent configurations
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_configs(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;

use infexion_core::{Agent, AgentConfig, GameResult, MatchConfig, MatchRunner, Player, Termination};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Config JSON for the first agent (defaults if omitted)
    #[arg(long, value_name = "FILE")]
    pub first: Option<PathBuf>,

    /// Config JSON for the second agent (defaults if omitted)
    #[arg(long, value_name = "FILE")]
    pub second: Option<PathBuf>,

    /// Number of games to play (colours alternate, first agent starts as Red)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Seconds on each player's clock
    #[arg(long, default_value = "180")]
    pub time_budget: f32,

    /// Random legal moves played before the agents take over
    #[arg(long, default_value = "0")]
    pub random_openings: usize,

    /// Search this depth every move instead of the time schedule
    #[arg(long)]
    pub depth: Option<u32>,

    /// Base seed for random openings
    #[arg(long)]
    pub seed: Option<u64>,

    /// Play games on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    result: GameResult,
    turns: usize,
    first_played_red: bool,
    termination: Termination,
}

impl GameRecord {
    /// Winner in terms of the two configurations: Some(true) = first agent
    fn first_won(&self) -> Option<bool> {
        self.result
            .winner()
            .map(|winner| (winner == Player::Red) == self.first_played_red)
    }
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    first_wins: usize,
    second_wins: usize,
    red_wins: usize,
    draws: usize,
    avg_turns: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Load both agent configurations
/// 2. Play the match (multiple games)
/// 3. Report results
pub fn run(args: MatchArgs) -> Result<()> {
    let (first, second) = load_configs(&args)?;

    tracing::info!(
        "Starting match: {} games, {}s clock, {} random openings",
        args.games,
        args.time_budget,
        args.random_openings
    );

    let results = play_match(&first, &second, &args);

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_configs(args: &MatchArgs) -> Result<(AgentConfig, AgentConfig)> {
    let first = crate::load_agent_config(args.first.as_deref(), args.depth)
        .context("Failed to load first agent config")?;
    let second = crate::load_agent_config(args.second.as_deref(), args.depth)
        .context("Failed to load second agent config")?;
    Ok((first, second))
}

fn play_match(first: &AgentConfig, second: &AgentConfig, args: &MatchArgs) -> MatchResults {
    let play = |index: usize| {
        let record = play_single_game(first, second, index, args);
        tracing::info!(
            "Game {}: {:?} ({} turns)",
            record.game_number,
            record.result,
            record.turns
        );
        record
    };

    let games: Vec<GameRecord> = if args.parallel {
        (0..args.games).into_par_iter().map(play).collect()
    } else {
        (0..args.games).map(play).collect()
    };

    compute_match_statistics(games)
}

fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game, alternating which configuration takes Red
fn play_single_game(
    first: &AgentConfig,
    second: &AgentConfig,
    index: usize,
    args: &MatchArgs,
) -> GameRecord {
    let first_played_red = index % 2 == 0;
    let (red_config, blue_config) = if first_played_red {
        (first, second)
    } else {
        (second, first)
    };

    let mut red = Agent::with_config(Player::Red, red_config.clone());
    let mut blue = Agent::with_config(Player::Blue, blue_config.clone());

    let mut config = MatchConfig::default()
        .with_time_budget(args.time_budget)
        .with_random_openings(args.random_openings);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed.wrapping_add(index as u64));
    }

    let outcome = MatchRunner::new(config).play(&mut red, &mut blue);

    GameRecord {
        game_number: index + 1,
        result: outcome.result,
        turns: outcome.turns(),
        first_played_red,
        termination: outcome.termination,
    }
}

fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let first_wins = games.iter().filter(|g| g.first_won() == Some(true)).count();
    let second_wins = games.iter().filter(|g| g.first_won() == Some(false)).count();
    let red_wins = games
        .iter()
        .filter(|g| g.result == GameResult::RedWins)
        .count();
    let draws = games.iter().filter(|g| g.result.winner().is_none()).count();

    let total_turns: usize = games.iter().map(|g| g.turns).sum();
    let avg_turns = if games.is_empty() {
        0.0
    } else {
        total_turns as f32 / games.len() as f32
    };

    MatchResults {
        games,
        first_wins,
        second_wins,
        red_wins,
        draws,
        avg_turns,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

fn print_json_results(results: &MatchResults) {
    #[derive(serde::Serialize)]
    struct JsonGame<'a> {
        game_number: usize,
        result: GameResult,
        turns: usize,
        first_played_red: bool,
        termination: &'a Termination,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        total_games: usize,
        first_wins: usize,
        second_wins: usize,
        red_wins: usize,
        draws: usize,
        avg_turns: f32,
        games: Vec<JsonGame<'a>>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        first_wins: results.first_wins,
        second_wins: results.second_wins,
        red_wins: results.red_wins,
        draws: results.draws,
        avg_turns: results.avg_turns,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                result: g.result,
                turns: g.turns,
                first_played_red: g.first_played_red,
                termination: &g.termination,
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Failed to serialize results: {}", e),
    }
}

fn print_text_results(results: &MatchResults) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("Total games:  {}", total);
    println!(
        "First wins:   {} ({:.1}%)",
        results.first_wins,
        percent(results.first_wins, total)
    );
    println!(
        "Second wins:  {} ({:.1}%)",
        results.second_wins,
        percent(results.second_wins, total)
    );
    println!(
        "Draws:        {} ({:.1}%)",
        results.draws,
        percent(results.draws, total)
    );
    println!(
        "Red wins:     {} ({:.1}%)",
        results.red_wins,
        percent(results.red_wins, total)
    );
    println!("Avg turns:    {:.1}", results.avg_turns);

    println!("\nGame details:");
    for game in &results.games {
        let seat = if game.first_played_red { "first=Red" } else { "first=Blue" };
        println!(
            "  Game {} ({}): {:?} in {} turns [{:?}]",
            game.game_number, seat, game.result, game.turns, game.termination
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
