//! Board state, rules and apply/undo

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{Hex, HexDir, BOARD_CELLS};

// ============================================================================
// CONSTANTS
// ============================================================================

/// A cell pushed above this power is emptied
pub const MAX_CELL_POWER: u8 = 6;

/// Spawning is illegal once the board holds this much power
pub const MAX_TOTAL_POWER: u32 = 49;

/// Hard turn limit
pub const MAX_TURNS: u16 = 343;

/// Power lead required to win at the turn limit
pub const WIN_POWER_DIFF: u32 = 2;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Red = 0,
    Blue = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Red => f.write_str("RED"),
            Player::Blue => f.write_str("BLUE"),
        }
    }
}

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    RedWins,
    BlueWins,
    Draw,
}

impl GameResult {
    pub fn win_for(player: Player) -> Self {
        match player {
            Player::Red => GameResult::RedWins,
            Player::Blue => GameResult::BlueWins,
        }
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::RedWins => Some(Player::Red),
            GameResult::BlueWins => Some(Player::Blue),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }
}

/// Contents of one board cell
///
/// Empty cells carry no owner and zero power; occupied cells have an owner and
/// power in `1..=MAX_CELL_POWER`. [`Cell::occupied`] is the only constructor of
/// occupied cells and collapses out-of-range power to empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    owner: Option<Player>,
    power: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell { owner: None, power: 0 };

    pub fn occupied(owner: Player, power: u8) -> Self {
        if power == 0 || power > MAX_CELL_POWER {
            Cell::EMPTY
        } else {
            Cell { owner: Some(owner), power }
        }
    }

    pub fn owner(&self) -> Option<Player> {
        self.owner
    }

    pub fn power(&self) -> u8 {
        self.power
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_owned_by(&self, player: Player) -> bool {
        self.owner == Some(player)
    }
}

/// A game action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Spawn { cell: Hex },
    Spread { cell: Hex, dir: HexDir },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Spawn { cell } => write!(f, "SPAWN({})", cell),
            Action::Spread { cell, dir } => write!(f, "SPREAD({}, {})", cell, dir),
        }
    }
}

/// Rule violations and inconsistent input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("coordinate ({r}, {q}) is off the board")]
    InvalidHex { r: u8, q: u8 },

    #[error("cannot spawn at {0}: cell occupied")]
    CellOccupied(Hex),

    #[error("cannot spread from {cell}: not occupied by {player}")]
    NotOwned { cell: Hex, player: Player },

    #[error("cannot spawn: total board power reached {}", MAX_TOTAL_POWER)]
    PowerCapReached,

    #[error("game is already over ({0:?})")]
    GameOver(GameResult),

    #[error("invalid cell at {cell}: owner {owner:?} with power {power}")]
    InvalidCell {
        cell: Hex,
        owner: Option<Player>,
        power: u8,
    },

    #[error("duplicate entry for cell {0}")]
    DuplicateCell(Hex),
}

// ============================================================================
// MUTATION RECORD
// ============================================================================

/// Diff produced by [`Board::apply`]; hand it back to [`Board::undo`]
///
/// Holds the prior contents of every touched cell (a spread touches at most
/// `MAX_CELL_POWER + 1` cells).
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use = "a mutation must be passed back to Board::undo"]
pub struct Mutation {
    previous: SmallVec<[(Hex, Cell); 7]>,
}

// ============================================================================
// BOARD
// ============================================================================

/// Full game position: cells, side to move and turn counter
///
/// `Copy` so that callers can snapshot a position and compare it bit-for-bit
/// after a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
    turn: Player,
    turn_count: u16,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board, Red to move
    pub fn new() -> Self {
        Self {
            cells: [Cell::EMPTY; BOARD_CELLS],
            turn: Player::Red,
            turn_count: 0,
        }
    }

    /// Build a position from explicit cells
    pub fn from_cells(
        turn: Player,
        turn_count: u16,
        cells: impl IntoIterator<Item = (Hex, Cell)>,
    ) -> Result<Self, BoardError> {
        let mut board = Board {
            turn,
            turn_count,
            ..Board::new()
        };
        let mut seen = [false; BOARD_CELLS];
        for (hex, cell) in cells {
            if !hex.is_valid() {
                return Err(BoardError::InvalidHex { r: hex.r, q: hex.q });
            }
            if seen[hex.index()] {
                return Err(BoardError::DuplicateCell(hex));
            }
            seen[hex.index()] = true;
            board.cells[hex.index()] = cell;
        }
        Ok(board)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Side to move
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Number of actions applied so far
    pub fn turn_count(&self) -> u16 {
        self.turn_count
    }

    pub fn cell(&self, hex: Hex) -> Cell {
        self.cells[hex.index()]
    }

    /// Occupied cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (Hex, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(i, &cell)| (Hex::from_index(i), cell))
    }

    /// Cells owned by `player` in row-major order
    pub fn cells_of(&self, player: Player) -> impl Iterator<Item = (Hex, Cell)> + '_ {
        self.occupied().filter(move |(_, cell)| cell.is_owned_by(player))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    /// Sum of `player`'s cell powers
    pub fn color_power(&self, player: Player) -> u32 {
        self.cells_of(player).map(|(_, c)| c.power() as u32).sum()
    }

    /// Sum of all cell powers
    pub fn total_power(&self) -> u32 {
        self.cells.iter().map(|c| c.power() as u32).sum()
    }

    // ========================================================================
    // GAME END
    // ========================================================================

    /// Current result under the turn-limit and elimination rules
    pub fn result(&self) -> GameResult {
        if self.turn_count < 2 {
            return GameResult::Ongoing;
        }

        let red = self.color_power(Player::Red);
        let blue = self.color_power(Player::Blue);

        if self.turn_count >= MAX_TURNS {
            return if red >= blue + WIN_POWER_DIFF {
                GameResult::RedWins
            } else if blue >= red + WIN_POWER_DIFF {
                GameResult::BlueWins
            } else {
                GameResult::Draw
            };
        }

        match (red, blue) {
            (0, 0) => GameResult::Draw,
            (0, _) => GameResult::BlueWins,
            (_, 0) => GameResult::RedWins,
            _ => GameResult::Ongoing,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.result() != GameResult::Ongoing
    }

    // ========================================================================
    // APPLY / UNDO
    // ========================================================================

    /// Apply `action` for the side to move
    ///
    /// On error the board is untouched.
    pub fn apply(&mut self, action: Action) -> Result<Mutation, BoardError> {
        let player = self.turn;
        let mut previous = SmallVec::new();

        match action {
            Action::Spawn { cell } => {
                self.check_hex(cell)?;
                if self.total_power() >= MAX_TOTAL_POWER {
                    return Err(BoardError::PowerCapReached);
                }
                if !self.cell(cell).is_empty() {
                    return Err(BoardError::CellOccupied(cell));
                }
                previous.push((cell, self.cell(cell)));
                self.cells[cell.index()] = Cell::occupied(player, 1);
            }
            Action::Spread { cell, dir } => {
                self.check_hex(cell)?;
                let source = self.cell(cell);
                if !source.is_owned_by(player) {
                    return Err(BoardError::NotOwned { cell, player });
                }
                previous.push((cell, source));
                self.cells[cell.index()] = Cell::EMPTY;

                // Reach is at most MAX_CELL_POWER < BOARD_N, so targets are distinct
                // and never wrap onto the source.
                for step in 1..=source.power() {
                    let target = cell.offset(dir, step);
                    let before = self.cell(target);
                    previous.push((target, before));
                    self.cells[target.index()] = Cell::occupied(player, before.power() + 1);
                }
            }
        }

        self.turn = player.opponent();
        self.turn_count += 1;

        Ok(Mutation { previous })
    }

    /// Revert the most recent [`Board::apply`]
    pub fn undo(&mut self, mutation: Mutation) {
        for &(hex, cell) in mutation.previous.iter().rev() {
            self.cells[hex.index()] = cell;
        }
        self.turn = self.turn.opponent();
        self.turn_count -= 1;
    }

    fn check_hex(&self, hex: Hex) -> Result<(), BoardError> {
        if hex.is_valid() {
            Ok(())
        } else {
            Err(BoardError::InvalidHex { r: hex.r, q: hex.q })
        }
    }

    // ========================================================================
    // FULL ENUMERATION
    // ========================================================================

    /// Every legal action for the side to move
    ///
    /// Used by the referee and for random openings; the agent's own search
    /// only sees the heuristic candidates from `movegen`.
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.is_game_over() {
            return vec![];
        }

        let mut actions = Vec::new();

        if self.total_power() < MAX_TOTAL_POWER {
            actions.extend(
                Hex::all()
                    .filter(|&hex| self.cell(hex).is_empty())
                    .map(|cell| Action::Spawn { cell }),
            );
        }

        for (cell, _) in self.cells_of(self.turn) {
            actions.extend(HexDir::ALL.iter().map(|&dir| Action::Spread { cell, dir }));
        }

        actions
    }

    /// Validate and apply for the referee: also rejects moves after the game ended
    pub fn apply_checked(&mut self, action: Action) -> Result<Mutation, BoardError> {
        match self.result() {
            GameResult::Ongoing => self.apply(action),
            result => Err(BoardError::GameOver(result)),
        }
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            turn: self.turn,
            turn_count: self.turn_count,
            cells: self
                .occupied()
                .filter_map(|(hex, cell)| {
                    cell.owner.map(|owner| CellEntry {
                        hex,
                        owner,
                        power: cell.power,
                    })
                })
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Result<Self, BoardError> {
        let cells = snapshot
            .cells
            .iter()
            .map(|entry| {
                let cell = Cell::occupied(entry.owner, entry.power);
                if cell.is_empty() {
                    Err(BoardError::InvalidCell {
                        cell: entry.hex,
                        owner: Some(entry.owner),
                        power: entry.power,
                    })
                } else {
                    Ok((entry.hex, cell))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Board::from_cells(snapshot.turn, snapshot.turn_count, cells)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..crate::board::BOARD_N {
            for q in 0..crate::board::BOARD_N {
                let cell = self.cell(Hex::new(r, q));
                match cell.owner {
                    None => f.write_str(" .. ")?,
                    Some(Player::Red) => write!(f, " r{} ", cell.power)?,
                    Some(Player::Blue) => write!(f, " b{} ", cell.power)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Serializable position (occupied cells only)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub turn: Player,
    #[serde(default)]
    pub turn_count: u16,
    pub cells: Vec<CellEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEntry {
    pub hex: Hex,
    pub owner: Player,
    pub power: u8,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(r: u8, q: u8) -> Action {
        Action::Spawn { cell: Hex::new(r, q) }
    }

    fn spread(r: u8, q: u8, dir: HexDir) -> Action {
        Action::Spread { cell: Hex::new(r, q), dir }
    }

    fn position(turn: Player, cells: &[(u8, u8, Player, u8)]) -> Board {
        Board::from_cells(
            turn,
            2,
            cells
                .iter()
                .map(|&(r, q, p, k)| (Hex::new(r, q), Cell::occupied(p, k))),
        )
        .unwrap()
    }

    #[test]
    fn test_new_board() {
        let board = Board::new();
        assert!(board.is_empty());
        assert_eq!(board.turn(), Player::Red);
        assert_eq!(board.total_power(), 0);
        assert_eq!(board.result(), GameResult::Ongoing);
    }

    #[test]
    fn test_cell_invariant() {
        assert!(Cell::occupied(Player::Red, 0).is_empty());
        assert!(Cell::occupied(Player::Red, 7).is_empty());
        assert_eq!(Cell::occupied(Player::Blue, 6).power(), 6);
        assert_eq!(Cell::EMPTY.owner(), None);
    }

    #[test]
    fn test_spawn() {
        let mut board = Board::new();
        let _ = board.apply(spawn(3, 3)).unwrap();
        assert_eq!(board.cell(Hex::new(3, 3)), Cell::occupied(Player::Red, 1));
        assert_eq!(board.turn(), Player::Blue);
        assert_eq!(board.turn_count(), 1);
    }

    #[test]
    fn test_spawn_on_occupied_fails() {
        let mut board = Board::new();
        let _ = board.apply(spawn(3, 3)).unwrap();
        let before = board;
        assert_eq!(board.apply(spawn(3, 3)), Err(BoardError::CellOccupied(Hex::new(3, 3))));
        assert_eq!(board, before);
    }

    #[test]
    fn test_spawn_blocked_at_power_cap() {
        let mut cells: Vec<_> = Hex::all()
            .take(8)
            .map(|hex| (hex, Cell::occupied(Player::Red, 6)))
            .collect();
        cells.push((Hex::new(5, 5), Cell::occupied(Player::Blue, 1)));
        let mut board = Board::from_cells(Player::Red, 10, cells).unwrap();
        assert_eq!(board.total_power(), MAX_TOTAL_POWER);
        assert_eq!(board.apply(spawn(6, 6)), Err(BoardError::PowerCapReached));

        let actions = board.legal_actions();
        assert_eq!(actions.len(), 8 * 6);
        assert!(actions.iter().all(|a| matches!(a, Action::Spread { .. })));
    }

    #[test]
    fn test_spread_captures_and_stacks() {
        let mut board = position(
            Player::Red,
            &[(3, 3, Player::Red, 2), (3, 4, Player::Blue, 1), (3, 5, Player::Red, 3)],
        );
        let _ = board.apply(spread(3, 3, HexDir::DownRight)).unwrap();
        assert!(board.cell(Hex::new(3, 3)).is_empty());
        assert_eq!(board.cell(Hex::new(3, 4)), Cell::occupied(Player::Red, 2));
        assert_eq!(board.cell(Hex::new(3, 5)), Cell::occupied(Player::Red, 4));
        assert_eq!(board.color_power(Player::Blue), 0);
    }

    #[test]
    fn test_spread_overflow_empties_cell() {
        let mut board = position(
            Player::Blue,
            &[(0, 0, Player::Blue, 1), (0, 1, Player::Red, 6), (5, 5, Player::Red, 1)],
        );
        let _ = board.apply(spread(0, 0, HexDir::DownRight)).unwrap();
        assert!(board.cell(Hex::new(0, 1)).is_empty());
        assert!(board.cell(Hex::new(0, 0)).is_empty());
    }

    #[test]
    fn test_spread_wraps_around() {
        let mut board = position(Player::Red, &[(3, 6, Player::Red, 2), (6, 6, Player::Blue, 1)]);
        let _ = board.apply(spread(3, 6, HexDir::DownRight)).unwrap();
        assert_eq!(board.cell(Hex::new(3, 0)), Cell::occupied(Player::Red, 1));
        assert_eq!(board.cell(Hex::new(3, 1)), Cell::occupied(Player::Red, 1));
    }

    #[test]
    fn test_spread_requires_ownership() {
        let mut board = position(Player::Red, &[(3, 3, Player::Blue, 2), (0, 0, Player::Red, 1)]);
        assert_eq!(
            board.apply(spread(3, 3, HexDir::Up)),
            Err(BoardError::NotOwned {
                cell: Hex::new(3, 3),
                player: Player::Red
            })
        );
    }

    #[test]
    fn test_undo_restores_board() {
        let mut board = position(
            Player::Red,
            &[(3, 3, Player::Red, 6), (3, 4, Player::Blue, 6), (1, 1, Player::Blue, 2)],
        );
        let before = board;
        let mutation = board.apply(spread(3, 3, HexDir::DownRight)).unwrap();
        assert_ne!(board, before);
        board.undo(mutation);
        assert_eq!(board, before);

        let mutation = board.apply(spawn(0, 0)).unwrap();
        board.undo(mutation);
        assert_eq!(board, before);
    }

    #[test]
    fn test_result_elimination() {
        let board = position(Player::Blue, &[(3, 3, Player::Red, 2)]);
        assert_eq!(board.result(), GameResult::RedWins);

        let opening = Board::from_cells(
            Player::Blue,
            1,
            [(Hex::CENTER, Cell::occupied(Player::Red, 1))],
        )
        .unwrap();
        assert_eq!(opening.result(), GameResult::Ongoing);
    }

    #[test]
    fn test_result_turn_limit() {
        let lead = Board::from_cells(
            Player::Red,
            MAX_TURNS,
            [
                (Hex::new(0, 0), Cell::occupied(Player::Red, 3)),
                (Hex::new(4, 4), Cell::occupied(Player::Blue, 1)),
            ],
        )
        .unwrap();
        assert_eq!(lead.result(), GameResult::RedWins);

        let close = Board::from_cells(
            Player::Red,
            MAX_TURNS,
            [
                (Hex::new(0, 0), Cell::occupied(Player::Red, 2)),
                (Hex::new(4, 4), Cell::occupied(Player::Blue, 1)),
            ],
        )
        .unwrap();
        assert_eq!(close.result(), GameResult::Draw);
    }

    #[test]
    fn test_apply_checked_rejects_finished_game() {
        let mut board = position(Player::Blue, &[(3, 3, Player::Red, 2)]);
        assert_eq!(
            board.apply_checked(spawn(0, 0)),
            Err(BoardError::GameOver(GameResult::RedWins))
        );
    }

    #[test]
    fn test_legal_actions_count() {
        let board = position(Player::Red, &[(3, 3, Player::Red, 1), (0, 0, Player::Blue, 1)]);
        // 47 empty cells plus 6 spread directions
        assert_eq!(board.legal_actions().len(), 47 + 6);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let board = position(Player::Blue, &[(3, 3, Player::Red, 2), (1, 5, Player::Blue, 4)]);
        let json = serde_json::to_string(&board.snapshot()).unwrap();
        let snapshot: BoardSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(Board::from_snapshot(&snapshot).unwrap(), board);
    }

    #[test]
    fn test_snapshot_rejects_bad_power() {
        let snapshot = BoardSnapshot {
            turn: Player::Red,
            turn_count: 0,
            cells: vec![CellEntry {
                hex: Hex::new(1, 1),
                owner: Player::Red,
                power: 9,
            }],
        };
        assert!(matches!(
            Board::from_snapshot(&snapshot),
            Err(BoardError::InvalidCell { .. })
        ));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(spawn(3, 3).to_string(), "SPAWN(3-3)");
        assert_eq!(spread(1, 2, HexDir::Down).to_string(), "SPREAD(1-2, [-1,1])");
    }
}
