//! Game-playing agent
//!
//! The referee drives an [`Agent`] through two calls per turn:
//! - [`Agent::action`] when it is the agent's move, and
//! - [`Agent::turn`] after every move (both players'), to keep the local board
//!   in step with the match.

use std::time::{Duration, Instant};

use crate::ai::{AlphaBeta, SearchError};
use crate::config::AgentConfig;
use crate::game::{Action, Board, BoardError, Player};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// The heuristic generator found nothing to play
    #[error("no candidate move available for {0}")]
    NoCandidateMove(Player),

    #[error("out of turn: board expects {expected} to move, got {got}")]
    OutOfTurn { expected: Player, got: Player },

    #[error("internal consistency error: {0}")]
    Board(#[from] BoardError),
}

// ============================================================================
// DECISION
// ============================================================================

/// Outcome of one root search
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub action: Action,
    /// Minimax score of `action` (0 for the fixed opening)
    pub score: f32,
    /// Depth searched below the root move (0 for the fixed opening)
    pub depth: u32,
    pub nodes: u64,
    /// Root candidates considered
    pub candidates: usize,
    /// The deadline cut the search short; `action` is the best fully searched move
    pub timed_out: bool,
    pub elapsed: Duration,
}

// ============================================================================
// AGENT
// ============================================================================

pub struct Agent {
    color: Player,
    board: Board,
    config: AgentConfig,
}

impl Agent {
    pub fn new(color: Player) -> Self {
        Self::with_config(color, AgentConfig::default())
    }

    pub fn with_config(color: Player, config: AgentConfig) -> Self {
        tracing::debug!(player = %color, "agent created");
        Self {
            color,
            board: Board::new(),
            config,
        }
    }

    pub fn color(&self) -> Player {
        self.color
    }

    /// Local copy of the match position
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Replace the local board, e.g. to analyse a loaded position
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    /// Next move given the seconds left on our clock
    pub fn action(&mut self, time_remaining: f32) -> Result<Action, AgentError> {
        self.decide(time_remaining).map(|decision| decision.action)
    }

    /// Pick a move and report how it was found
    ///
    /// The local board is identical before and after the call.
    pub fn decide(&mut self, time_remaining: f32) -> Result<Decision, AgentError> {
        let started = Instant::now();

        if self.board.is_empty() {
            let action = Action::Spawn {
                cell: self.config.opening,
            };
            tracing::info!(player = %self.color, %action, "opening move");
            return Ok(Decision {
                action,
                score: 0.0,
                depth: 0,
                nodes: 0,
                candidates: 1,
                timed_out: false,
                elapsed: started.elapsed(),
            });
        }

        if self.board.turn() != self.color {
            return Err(AgentError::OutOfTurn {
                expected: self.board.turn(),
                got: self.color,
            });
        }

        let depth = self.config.depth_schedule.depth_for(time_remaining);
        let candidates = self.config.generator.generate(&self.board, self.color);
        let first = *candidates
            .first()
            .ok_or(AgentError::NoCandidateMove(self.color))?;

        tracing::debug!(
            player = %self.color,
            time_remaining,
            depth,
            candidates = candidates.len(),
            "searching"
        );

        let mut search = AlphaBeta::new(&self.config.generator, self.color);
        let deadline = self
            .config
            .deadline_fraction
            .and_then(|fraction| Duration::try_from_secs_f32((time_remaining * fraction).max(0.0)).ok())
            .and_then(|budget| started.checked_add(budget));
        if let Some(deadline) = deadline {
            search = search.with_deadline(deadline);
        }

        let board = &mut self.board;
        let mut best_action = first;
        let mut best_score = f32::NEG_INFINITY;
        let mut timed_out = false;

        for &action in &candidates {
            match search.descend(board, action, depth, f32::NEG_INFINITY, f32::INFINITY, false) {
                Ok(score) => {
                    tracing::debug!(%action, score, "root candidate");
                    if score > best_score {
                        best_score = score;
                        best_action = action;
                    }
                }
                Err(SearchError::Timeout) => {
                    tracing::warn!(
                        player = %self.color,
                        depth,
                        "search deadline reached, keeping best move so far"
                    );
                    timed_out = true;
                    break;
                }
                Err(SearchError::Board(err)) => return Err(err.into()),
            }
        }

        let decision = Decision {
            action: best_action,
            score: best_score,
            depth,
            nodes: search.nodes(),
            candidates: candidates.len(),
            timed_out,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            player = %self.color,
            action = %decision.action,
            score = decision.score,
            depth,
            nodes = decision.nodes,
            elapsed_ms = decision.elapsed.as_millis() as u64,
            "decided"
        );

        Ok(decision)
    }

    /// Apply a move reported by the referee
    pub fn turn(&mut self, color: Player, action: Action) -> Result<(), AgentError> {
        if color != self.board.turn() {
            return Err(AgentError::OutOfTurn {
                expected: self.board.turn(),
                got: color,
            });
        }
        let _applied = self.board.apply(action)?;
        tracing::debug!(player = %color, %action, "turn synchronised");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Hex, HexDir};
    use crate::game::Cell;

    fn agent_at(color: Player, cells: &[(u8, u8, Player, u8)]) -> Agent {
        let board = Board::from_cells(
            color,
            2,
            cells
                .iter()
                .map(|&(r, q, p, k)| (Hex::new(r, q), Cell::occupied(p, k))),
        )
        .unwrap();
        let mut agent = Agent::with_config(color, AgentConfig::fixed_depth(2));
        agent.set_board(board);
        agent
    }

    #[test]
    fn test_opening_is_center() {
        for color in [Player::Red, Player::Blue] {
            let mut agent = Agent::new(color);
            assert_eq!(
                agent.action(180.0).unwrap(),
                Action::Spawn { cell: Hex::new(3, 3) }
            );
        }
    }

    #[test]
    fn test_blue_first_reply() {
        let mut agent = Agent::with_config(Player::Blue, AgentConfig::fixed_depth(2));
        agent
            .turn(Player::Red, Action::Spawn { cell: Hex::CENTER })
            .unwrap();
        let action = agent.action(180.0).unwrap();
        // Only a safe spawn is available: out of reach of red's single marker
        assert!(matches!(action, Action::Spawn { .. }));
        let mut board = *agent.board();
        let _applied = board.apply(action).unwrap();
    }

    #[test]
    fn test_decide_takes_winning_capture() {
        let mut agent = agent_at(
            Player::Red,
            &[(3, 3, Player::Red, 1), (3, 4, Player::Blue, 1), (0, 0, Player::Red, 1)],
        );
        let decision = agent.decide(100.0).unwrap();
        assert_eq!(
            decision.action,
            Action::Spread {
                cell: Hex::new(3, 3),
                dir: HexDir::DownRight
            }
        );
        assert!(!decision.timed_out);
    }

    #[test]
    fn test_decide_restores_board() {
        let mut agent = agent_at(
            Player::Red,
            &[
                (3, 3, Player::Red, 2),
                (3, 5, Player::Blue, 2),
                (1, 1, Player::Blue, 3),
                (5, 2, Player::Red, 1),
            ],
        );
        let before = *agent.board();
        agent.decide(100.0).unwrap();
        assert_eq!(*agent.board(), before);
    }

    #[test]
    fn test_no_candidate_move() {
        let mut cells = vec![(0, 0, Player::Red, 1), (4, 3, Player::Blue, 6)];
        for q in 0..7 {
            cells.push((3, q, Player::Blue, 6));
        }
        let mut agent = agent_at(Player::Red, &cells);
        assert_eq!(
            agent.action(100.0),
            Err(AgentError::NoCandidateMove(Player::Red))
        );
    }

    #[test]
    fn test_out_of_turn() {
        let mut agent = agent_at(Player::Red, &[(3, 3, Player::Red, 1), (0, 0, Player::Blue, 1)]);
        let err = agent
            .turn(Player::Blue, Action::Spawn { cell: Hex::new(5, 5) })
            .unwrap_err();
        assert_eq!(
            err,
            AgentError::OutOfTurn {
                expected: Player::Red,
                got: Player::Blue
            }
        );

        agent
            .turn(Player::Red, Action::Spawn { cell: Hex::new(5, 5) })
            .unwrap();
        assert!(matches!(agent.action(100.0), Err(AgentError::OutOfTurn { .. })));
    }

    #[test]
    fn test_turn_rejects_illegal_action() {
        let mut agent = agent_at(Player::Red, &[(3, 3, Player::Red, 1), (0, 0, Player::Blue, 1)]);
        let err = agent
            .turn(Player::Red, Action::Spawn { cell: Hex::new(0, 0) })
            .unwrap_err();
        assert_eq!(err, AgentError::Board(BoardError::CellOccupied(Hex::new(0, 0))));
    }

    #[test]
    fn test_deadline_returns_first_candidate() {
        let mut agent = agent_at(
            Player::Red,
            &[(3, 3, Player::Red, 2), (3, 5, Player::Blue, 2), (1, 1, Player::Blue, 3)],
        );
        let before = *agent.board();
        // Zero clock: the deadline has passed before the first node
        let decision = agent.decide(0.0).unwrap();
        assert!(decision.timed_out);
        let candidates = agent.config().generator.generate(&before, Player::Red);
        assert_eq!(decision.action, candidates[0]);
        assert_eq!(*agent.board(), before);
    }
}
