//! Hex board geometry on a wrapping 7x7 grid

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::BoardError;

/// Board side length; coordinates wrap modulo this value in both axes
pub const BOARD_N: u8 = 7;

/// Number of cells on the board
pub const BOARD_CELLS: usize = (BOARD_N as usize) * (BOARD_N as usize);

/// Axial hex coordinates `(r, q)`, both in `0..BOARD_N`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawHex")]
pub struct Hex {
    pub r: u8,
    pub q: u8,
}

#[derive(Deserialize)]
struct RawHex {
    r: u8,
    q: u8,
}

impl TryFrom<RawHex> for Hex {
    type Error = BoardError;

    fn try_from(raw: RawHex) -> Result<Self, Self::Error> {
        Hex::try_new(raw.r, raw.q)
    }
}

impl Hex {
    /// Centre of the board
    pub const CENTER: Hex = Hex::new(3, 3);

    /// Create a coordinate; callers must pass values in `0..BOARD_N`
    pub const fn new(r: u8, q: u8) -> Self {
        Self { r, q }
    }

    /// Create a coordinate from untrusted input
    pub fn try_new(r: u8, q: u8) -> Result<Self, BoardError> {
        let hex = Self { r, q };
        if hex.is_valid() {
            Ok(hex)
        } else {
            Err(BoardError::InvalidHex { r, q })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.r < BOARD_N && self.q < BOARD_N
    }

    /// Row-major cell index
    pub fn index(&self) -> usize {
        self.r as usize * BOARD_N as usize + self.q as usize
    }

    /// Inverse of [`Hex::index`]
    pub fn from_index(index: usize) -> Self {
        let n = BOARD_N as usize;
        Hex::new((index / n) as u8, (index % n) as u8)
    }

    /// Neighbour in `dir`
    pub fn neighbor(&self, dir: HexDir) -> Hex {
        self.offset(dir, 1)
    }

    /// Translate by `dir` scaled by `steps`, wrapping around the board
    pub fn offset(&self, dir: HexDir, steps: u8) -> Hex {
        let (dr, dq) = dir.vector();
        let n = BOARD_N as i16;
        let steps = steps as i16;
        let r = (self.r as i16 + dr as i16 * steps).rem_euclid(n);
        let q = (self.q as i16 + dq as i16 * steps).rem_euclid(n);
        Hex::new(r as u8, q as u8)
    }

    /// Every coordinate on the board in row-major order
    pub fn all() -> impl Iterator<Item = Hex> {
        (0..BOARD_CELLS).map(Hex::from_index)
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.r, self.q)
    }
}

/// The six hex directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDir {
    DownRight,
    Down,
    DownLeft,
    UpLeft,
    Up,
    UpRight,
}

/// Direction vectors `(dr, dq)`, indexed like [`HexDir::ALL`]
pub const DIRECTIONS: [(i8, i8); 6] = [
    (0, 1),   // DownRight
    (-1, 1),  // Down
    (-1, 0),  // DownLeft
    (0, -1),  // UpLeft
    (1, -1),  // Up
    (1, 0),   // UpRight
];

impl HexDir {
    /// Canonical scan order
    pub const ALL: [HexDir; 6] = [
        HexDir::DownRight,
        HexDir::Down,
        HexDir::DownLeft,
        HexDir::UpLeft,
        HexDir::Up,
        HexDir::UpRight,
    ];

    pub fn vector(self) -> (i8, i8) {
        DIRECTIONS[self as usize]
    }
}

impl fmt::Display for HexDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (dr, dq) = self.vector();
        write!(f, "[{},{}]", dr, dq)
    }
}
