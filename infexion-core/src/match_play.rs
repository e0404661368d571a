//! Match referee - plays two agents against each other
//!
//! ## Architecture
//! - Level 2: [`MatchRunner::play`] drives the turn loop
//! - Level 3: clock accounting, move validation, synchronising both agents
//! - Level 4: random openings

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::agent::Agent;
use crate::game::{Action, Board, GameResult, Player};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Default per-player clock, in seconds
pub const DEFAULT_TIME_BUDGET: f32 = 180.0;

#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Seconds each player may spend across the whole game
    pub time_budget_secs: f32,
    /// Random legal moves played before the agents take over
    pub random_openings: usize,
    /// Seed for the random openings (None = entropy)
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: DEFAULT_TIME_BUDGET,
            random_openings: 0,
            seed: None,
        }
    }
}

impl MatchConfig {
    pub fn with_time_budget(mut self, secs: f32) -> Self {
        self.time_budget_secs = secs;
        self
    }

    pub fn with_random_openings(mut self, count: usize) -> Self {
        self.random_openings = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// How a match ended
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Termination {
    /// Decided by the board rules
    Finished,
    /// `player` ran out of clock
    TimeExpired(Player),
    /// `player` failed to produce a legal move or lost sync
    Forfeit { player: Player, reason: String },
}

#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub result: GameResult,
    pub termination: Termination,
    /// Every move in order, random openings included
    pub history: Vec<(Player, Action)>,
    /// Clock seconds used by Red and Blue
    pub time_used: [f32; 2],
    pub final_board: Board,
}

impl MatchOutcome {
    pub fn turns(&self) -> usize {
        self.history.len()
    }

    pub fn winner(&self) -> Option<Player> {
        self.result.winner()
    }
}

// ============================================================================
// RUNNER (Level 2)
// ============================================================================

pub struct MatchRunner {
    config: MatchConfig,
}

impl MatchRunner {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Play one game to completion; agents must be freshly created
    pub fn play(&self, red: &mut Agent, blue: &mut Agent) -> MatchOutcome {
        let mut board = Board::new();
        let mut history = Vec::new();
        let mut time_used = [0.0f32; 2];

        if self.config.random_openings > 0 {
            let mut rng = match self.config.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            for (player, action) in play_random_actions(&mut board, &mut rng, self.config.random_openings) {
                history.push((player, action));
                if let Some(termination) = sync_agents(red, blue, player, action) {
                    return self.finish(board, history, time_used, termination);
                }
            }
        }

        while !board.is_game_over() {
            let mover = board.turn();
            let agent = match mover {
                Player::Red => &mut *red,
                Player::Blue => &mut *blue,
            };

            let clock = &mut time_used[mover as usize];
            let remaining = self.config.time_budget_secs - *clock;
            let started = Instant::now();
            let decision = agent.action(remaining);
            *clock += started.elapsed().as_secs_f32();

            if *clock > self.config.time_budget_secs {
                return self.finish(board, history, time_used, Termination::TimeExpired(mover));
            }

            let action = match decision {
                Ok(action) => action,
                Err(err) => {
                    let termination = Termination::Forfeit {
                        player: mover,
                        reason: err.to_string(),
                    };
                    return self.finish(board, history, time_used, termination);
                }
            };

            if let Err(err) = board.apply_checked(action) {
                let termination = Termination::Forfeit {
                    player: mover,
                    reason: format!("illegal action {}: {}", action, err),
                };
                return self.finish(board, history, time_used, termination);
            }

            tracing::debug!(turn = board.turn_count(), player = %mover, %action, "played");
            history.push((mover, action));

            if let Some(termination) = sync_agents(red, blue, mover, action) {
                return self.finish(board, history, time_used, termination);
            }
        }

        self.finish(board, history, time_used, Termination::Finished)
    }

    fn finish(
        &self,
        board: Board,
        history: Vec<(Player, Action)>,
        time_used: [f32; 2],
        termination: Termination,
    ) -> MatchOutcome {
        let result = match &termination {
            Termination::Finished => board.result(),
            Termination::TimeExpired(player) => GameResult::win_for(player.opponent()),
            Termination::Forfeit { player, .. } => GameResult::win_for(player.opponent()),
        };

        tracing::info!(
            ?result,
            ?termination,
            turns = history.len(),
            red_secs = time_used[0],
            blue_secs = time_used[1],
            "match over"
        );

        MatchOutcome {
            result,
            termination,
            history,
            time_used,
            final_board: board,
        }
    }
}

// ============================================================================
// STEPS (Level 3)
// ============================================================================

/// Report a move to both agents; a failure forfeits the agent that failed
fn sync_agents(red: &mut Agent, blue: &mut Agent, player: Player, action: Action) -> Option<Termination> {
    for (seat, agent) in [(Player::Red, red), (Player::Blue, blue)] {
        if let Err(err) = agent.turn(player, action) {
            return Some(Termination::Forfeit {
                player: seat,
                reason: format!("lost sync: {}", err),
            });
        }
    }
    None
}

// ============================================================================
// UTILITIES (Level 4)
// ============================================================================

/// Play up to `count` uniformly random legal actions, stopping if the game ends
pub fn play_random_actions<R: Rng>(board: &mut Board, rng: &mut R, count: usize) -> Vec<(Player, Action)> {
    let mut played = Vec::with_capacity(count);

    for _ in 0..count {
        let actions = board.legal_actions();
        let Some(&action) = actions.choose(rng) else {
            break;
        };
        let player = board.turn();
        match board.apply(action) {
            Ok(_applied) => played.push((player, action)),
            Err(_) => break,
        }
    }

    played
}

// ============================================================================
// TESTS
// ============================================================================
