// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ô Ăn Quan Core - Game Rules and Board Logic
//!
//! This crate provides the core game functionality including:
//! - Circular board generation for the 2, 3 and 4 player layouts
//! - The turn state machine (selection, direction, sowing, capture)
//! - The Quan Non capture-suppression and empty-side re-seeding rules
//! - End-game scoring with an inter-player debt ledger

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod board;
pub mod engine;
pub mod rules;
pub mod scoring;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of dân pits on each player's side of the board.
pub const DAN_PITS_PER_PLAYER: u8 = 5;

/// Stones seeded into every dân pit at setup.
pub const INITIAL_DAN_STONES: u32 = 5;

/// Default stone endowment of each quan pit.
pub const DEFAULT_QUAN_VALUE: u32 = 10;

/// Default stone-count threshold below which the Quan Non rule shields a
/// quan pit from capture. Coincides numerically with [`DAN_PITS_PER_PLAYER`]
/// but is a separate tunable.
pub const DEFAULT_QUAN_NON_THRESHOLD: u32 = 5;

/// The two pit kinds on an Ô Ăn Quan board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitKind {
    /// Corner pit, unowned, holding the high-value stones
    Quan,
    /// Player-owned small pit; the only kind a player may sow from
    Dan,
}

/// Travel direction along the circular pit sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follows the board's canonical generation order
    Forward,
    /// Runs against the generation order
    Backward,
}

/// Stable identity of a pit, rendered as `q0` or `p1_d3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitId {
    /// The quan pit opening player `n`'s stretch of the board
    Quan(u8),
    /// Dân pit `index` on `player`'s side
    Dan { player: u8, index: u8 },
}

impl fmt::Display for PitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PitId::Quan(n) => write!(f, "q{}", n),
            PitId::Dan { player, index } => write!(f, "p{}_d{}", player, index),
        }
    }
}

impl FromStr for PitId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidPitId(s.to_string());
        if let Some(rest) = s.strip_prefix('q') {
            let n = rest.parse::<u8>().map_err(|_| invalid())?;
            return Ok(PitId::Quan(n));
        }
        if let Some(rest) = s.strip_prefix('p') {
            let (player, index) = rest.split_once("_d").ok_or_else(invalid)?;
            let player = player.parse::<u8>().map_err(|_| invalid())?;
            let index = index.parse::<u8>().map_err(|_| invalid())?;
            return Ok(PitId::Dan { player, index });
        }
        Err(invalid())
    }
}

/// Phases of the turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Game not yet initialized
    Setup,
    /// Waiting for the active player to pick a dân pit
    AwaitingSelection,
    /// A pit is selected; waiting for a travel direction
    AwaitingDirection,
    /// Stones are being distributed along the board
    AnimatingSow,
    /// The landing pit is being evaluated for continuation or capture
    EvaluatingLanding,
    /// A capture cascade is running
    ProcessingCapture,
    /// A player's empty side is being re-seeded
    ApplyingEmptySideRule,
    /// Terminal state; final scores are available
    GameOver,
}

/// A participant in the game with their banked score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// 0-based seat index
    pub id: u8,
    /// Display name
    pub name: String,
    /// Stones collected into the score area
    pub dan: u32,
    /// Number of quan pits captured
    pub quan: u32,
}

impl Player {
    /// Create a player with the default display name for their seat
    pub fn new(id: u8) -> Self {
        Self {
            id,
            name: format!("Player {}", id + 1),
            dan: 0,
            quan: 0,
        }
    }
}

/// Immutable game settings, fixed once a game starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of players (2, 3 or 4)
    pub player_count: u8,
    /// Initial stone endowment of each quan pit; also the score value of a
    /// captured quan
    pub quan_value: u32,
    /// Whether the Quan Non capture-suppression rule is in force
    pub quan_non_enabled: bool,
    /// Stone-count threshold for Quan Non protection
    pub quan_non_threshold: u32,
    /// Pin the starting player instead of drawing one at random
    pub starting_player: Option<u8>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            quan_value: DEFAULT_QUAN_VALUE,
            quan_non_enabled: false,
            quan_non_threshold: DEFAULT_QUAN_NON_THRESHOLD,
            starting_player: None,
        }
    }
}

/// Result of a pit click routed through [`engine::Game::select_pit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionOutcome {
    /// The pit became the current selection
    Selected,
    /// The current selection was cleared
    Deselected,
    /// The selection moved to a different pit
    Switched,
    /// The click had no effect
    Ignored,
}

/// Discrete step events emitted for the presentation layer
///
/// Purely observational: the engine never depends on their consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new turn began
    TurnStarted {
        /// Seat index of the player now to move
        player: u8,
    },
    /// One stone was dropped while sowing
    StoneMoved {
        /// Pit the stone left
        from: PitId,
        /// Pit the stone landed in
        to: PitId,
    },
    /// A pit's stones were captured by the active player
    PitCaptured {
        /// The emptied pit
        pit: PitId,
        /// Kind of the emptied pit
        kind: PitKind,
        /// Stones moved to the capturer's score
        stones: u32,
        /// Seat index of the capturer
        by: u8,
    },
    /// A player's empty side was re-seeded
    Reseeded {
        /// Seat index of the re-seeded player
        player: u8,
        /// Stones funded from the player's own banked score
        from_score: u32,
    },
    /// A borrowing debt was recorded against a lender
    DebtRecorded {
        /// Seat index of the borrower
        borrower: u8,
        /// Seat index of the lender
        lender: u8,
        /// Stones owed
        amount: u32,
    },
    /// Remaining stones in a dân pit were swept to its owner at game end
    StonesCollected {
        /// The emptied pit
        pit: PitId,
        /// Stones moved to the owner's score
        stones: u32,
        /// Seat index of the pit owner
        owner: u8,
    },
    /// The game finished with final standings
    GameFinished {
        /// Seat index of the winner, if any standing exists
        winner: Option<u8>,
        /// Final totals in seat order
        scores: Vec<i64>,
    },
}

/// Errors that can occur while setting up or playing a game
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The player count has no supported board topology
    #[error("unsupported player count: {0} (expected 2, 3 or 4)")]
    UnsupportedPlayerCount(u8),

    /// The topology and player count do not match
    #[error("layout {layout:?} does not support {players} players")]
    UnsupportedLayout {
        /// Requested topology
        layout: board::Layout,
        /// Requested player count
        players: u8,
    },

    /// The pit id is not present on the board
    #[error("pit {0} not found on the board")]
    PitNotFound(PitId),

    /// The string does not name a pit
    #[error("malformed pit id: {0:?}")]
    InvalidPitId(String),

    /// A direction was chosen with no pit selected
    #[error("no pit is selected")]
    NoPitSelected,

    /// The operation is not legal in the current phase
    #[error("action not allowed in phase {0:?}")]
    WrongPhase(Phase),

    /// The game configuration is inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

// Re-export the main surface for convenience
pub use board::{Board, Layout, Pit};
pub use engine::Game;
pub use scoring::{DebtRecord, FinalScore};
