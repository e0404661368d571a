//! Infexion Core - Board rules and search agent
//!
//! This crate provides:
//! - Board geometry (wrapping 7x7 hex grid)
//! - Game state with apply/undo and the Infexion rules
//! - Heuristic candidate generation (captures, protected and safe spawns)
//! - Material evaluation
//! - Fixed-depth alpha-beta search and the time-driven agent
//! - A match referee for self-play

pub mod board;
pub mod game;
pub mod movegen;
pub mod eval;
pub mod ai;
pub mod config;
pub mod agent;
pub mod match_play;

// Re-exports for convenient access
pub use board::{Hex, HexDir, BOARD_N, DIRECTIONS};
pub use game::{Action, Board, BoardError, BoardSnapshot, Cell, CellEntry, GameResult, Mutation, Player};
pub use movegen::{MoveGenerator, SpawnHeuristic, SATURATION_THRESHOLD};
pub use eval::{evaluate, WIN_VALUE};
pub use ai::{AlphaBeta, SearchError};
pub use config::{AgentConfig, ConfigError, DepthSchedule, DepthStep};
pub use agent::{Agent, AgentError, Decision};
pub use match_play::{MatchConfig, MatchOutcome, MatchRunner, Termination};
