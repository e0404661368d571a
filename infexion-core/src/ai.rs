//! Minimax search with alpha-beta pruning
//!
//! The board is borrowed mutably and walked in place: every candidate is
//! applied, searched and undone within the same call frame, so the board a
//! caller hands in is the board it gets back, also when the search aborts.

use std::time::Instant;

use crate::eval::{evaluate, evaluate_terminal};
use crate::game::{Action, Board, BoardError, Player};
use crate::movegen::MoveGenerator;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Nodes between two deadline checks
const DEADLINE_POLL_INTERVAL: u64 = 256;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search deadline exceeded")]
    Timeout,

    #[error("internal consistency error during search: {0}")]
    Board(#[from] BoardError),
}

// ============================================================================
// ALPHA-BETA
// ============================================================================

/// Fixed-depth minimax searcher
///
/// Scores are always from `perspective`'s point of view: maximizing plies are
/// `perspective`'s turns, minimizing plies the opponent's.
pub struct AlphaBeta<'a> {
    generator: &'a MoveGenerator,
    perspective: Player,
    deadline: Option<Instant>,
    nodes: u64,
}

impl<'a> AlphaBeta<'a> {
    pub fn new(generator: &'a MoveGenerator, perspective: Player) -> Self {
        Self {
            generator,
            perspective,
            deadline: None,
            nodes: 0,
        }
    }

    /// Abort with [`SearchError::Timeout`] once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Nodes visited so far
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Score `board` searching `depth` plies
    pub fn search(
        &mut self,
        board: &mut Board,
        depth: u32,
        mut alpha: f32,
        mut beta: f32,
        maximizing: bool,
    ) -> Result<f32, SearchError> {
        self.poll_deadline()?;
        self.nodes += 1;

        if let Some(score) = evaluate_terminal(board, self.perspective, depth) {
            return Ok(score);
        }

        if depth == 0 {
            return Ok(evaluate(board, self.perspective));
        }

        let moves = self.generator.generate(board, board.turn());
        if moves.is_empty() {
            return Ok(evaluate(board, self.perspective));
        }

        if maximizing {
            let mut best = f32::NEG_INFINITY;
            for action in moves {
                let score = self.descend(board, action, depth - 1, alpha, beta, false)?;
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            Ok(best)
        } else {
            let mut best = f32::INFINITY;
            for action in moves {
                let score = self.descend(board, action, depth - 1, alpha, beta, true)?;
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            Ok(best)
        }
    }

    /// Apply `action`, search the child and undo, even when the child fails
    pub fn descend(
        &mut self,
        board: &mut Board,
        action: Action,
        depth: u32,
        alpha: f32,
        beta: f32,
        maximizing: bool,
    ) -> Result<f32, SearchError> {
        let mutation = board.apply(action)?;
        let result = self.search(board, depth, alpha, beta, maximizing);
        board.undo(mutation);
        result
    }

    fn poll_deadline(&self) -> Result<(), SearchError> {
        match self.deadline {
            Some(deadline)
                if self.nodes % DEADLINE_POLL_INTERVAL == 0 && Instant::now() >= deadline =>
            {
                Err(SearchError::Timeout)
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
