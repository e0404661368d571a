//! Heuristic candidate generation
//!
//! The search never sees the full legal move list. Each position offers:
//! - every spread that reaches an opposing cell (one per direction), and
//! - at most one spawn, chosen by the first spawn heuristic that finds a spot.
//!
//! The heuristics are pure functions over `&Board`; [`MoveGenerator`] decides
//! how they are combined.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{Hex, HexDir};
use crate::game::{Action, Board, Player, MAX_TOTAL_POWER};

/// Total board power at or above which only captures are generated
pub const SATURATION_THRESHOLD: u32 = MAX_TOTAL_POWER;

// ============================================================================
// POLICY
// ============================================================================

/// Spawn heuristics, tried in the configured order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnHeuristic {
    /// Next to our own cell, inside the opponent's reach
    Protected,
    /// Just beyond an opposing cell's reach
    Safe,
}

impl SpawnHeuristic {
    pub fn candidate(self, board: &Board, mover: Player) -> Option<Action> {
        match self {
            SpawnHeuristic::Protected => protected_spawn(board, mover),
            SpawnHeuristic::Safe => safe_spawn(board, mover),
        }
    }
}

/// Combines captures with the spawn heuristics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveGenerator {
    pub saturation_threshold: u32,
    pub spawn_order: Vec<SpawnHeuristic>,
}

impl Default for MoveGenerator {
    fn default() -> Self {
        Self {
            saturation_threshold: SATURATION_THRESHOLD,
            spawn_order: vec![SpawnHeuristic::Protected, SpawnHeuristic::Safe],
        }
    }
}

impl MoveGenerator {
    /// Candidates for `mover`: captures first, then at most one spawn
    pub fn generate(&self, board: &Board, mover: Player) -> Vec<Action> {
        let mut moves = capture_candidates(board, mover);

        if board.total_power() >= self.saturation_threshold {
            return moves;
        }

        if let Some(spawn) = self.spawn_candidate(board, mover) {
            moves.push(spawn);
        }

        moves
    }

    /// First spawn found by the configured heuristics
    pub fn spawn_candidate(&self, board: &Board, mover: Player) -> Option<Action> {
        self.spawn_order
            .iter()
            .find_map(|heuristic| heuristic.candidate(board, mover))
    }
}

// ============================================================================
// CAPTURES
// ============================================================================

/// One spread per (own cell, direction) whose reach contains an opposing cell
pub fn capture_candidates(board: &Board, mover: Player) -> Vec<Action> {
    let opponent = mover.opponent();
    let mut moves = Vec::new();

    for (cell, state) in board.cells_of(mover) {
        for dir in HexDir::ALL {
            let hits = (1..=state.power())
                .any(|step| board.cell(cell.offset(dir, step)).is_owned_by(opponent));
            if hits {
                moves.push(Action::Spread { cell, dir });
            }
        }
    }

    moves
}

// ============================================================================
// SPAWNS
// ============================================================================

/// How many of `player`'s cells can reach each coordinate with one spread
pub fn protection_map(board: &Board, player: Player) -> FxHashMap<Hex, u32> {
    let mut protected = FxHashMap::default();

    for (cell, state) in board.cells_of(player) {
        for step in 1..=state.power() {
            for dir in HexDir::ALL {
                *protected.entry(cell.offset(dir, step)).or_insert(0) += 1;
            }
        }
    }

    protected
}

/// First empty neighbour of a `mover` cell that the opponent can reach
///
/// A marker placed there is exposed, but our adjacent cell can retake it.
pub fn protected_spawn(board: &Board, mover: Player) -> Option<Action> {
    let danger = protection_map(board, mover.opponent());

    board.cells_of(mover).find_map(|(cell, _)| {
        HexDir::ALL
            .iter()
            .map(|&dir| cell.neighbor(dir))
            .find(|hex| board.cell(*hex).is_empty() && danger.get(hex).copied().unwrap_or(0) > 0)
            .map(|cell| Action::Spawn { cell })
    })
}

/// First empty coordinate one step past an opposing cell's reach
pub fn safe_spawn(board: &Board, mover: Player) -> Option<Action> {
    board.cells_of(mover.opponent()).find_map(|(cell, state)| {
        HexDir::ALL
            .iter()
            .map(|&dir| cell.offset(dir, state.power() + 1))
            .find(|hex| board.cell(*hex).is_empty())
            .map(|cell| Action::Spawn { cell })
    })
}

// ============================================================================
// TESTS
// ============================================================================
