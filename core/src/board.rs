// SPDX-License-Identifier: MIT OR Apache-2.0

//! Board layout generation and circular pit traversal

use serde::{Deserialize, Serialize};

use crate::{Direction, GameError, PitId, PitKind, DAN_PITS_PER_PLAYER, INITIAL_DAN_STONES};

/// Board topology, one per supported player count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// Two players facing each other across a long board
    Rectangle,
    /// Three players, one side each
    Triangle,
    /// Four players, one side each
    Square,
}

impl Layout {
    /// Topology for a player count, or an error for unsupported counts
    pub fn for_players(player_count: u8) -> Result<Self, GameError> {
        match player_count {
            2 => Ok(Layout::Rectangle),
            3 => Ok(Layout::Triangle),
            4 => Ok(Layout::Square),
            other => Err(GameError::UnsupportedPlayerCount(other)),
        }
    }

    /// The player count this topology seats
    pub fn player_count(&self) -> u8 {
        match self {
            Layout::Rectangle => 2,
            Layout::Triangle => 3,
            Layout::Square => 4,
        }
    }
}

/// A single pit on the board
///
/// The stone count is read through [`Pit::stones`] and mutated only through
/// [`Board::set_stones`], so counts can never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pit {
    /// Stable identity, fixed at generation
    pub id: PitId,
    /// Quan or dân
    pub kind: PitKind,
    /// Owning seat for dân pits; quan pits are unowned
    pub owner: Option<u8>,
    stones: u32,
}

impl Pit {
    /// Current stone count
    pub fn stones(&self) -> u32 {
        self.stones
    }

    /// True when the pit holds no stones
    pub fn is_empty(&self) -> bool {
        self.stones == 0
    }
}

/// The ordered, circular sequence of pits
///
/// Vec order is the canonical forward travel direction and never changes
/// after generation; only stone counts mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    layout: Layout,
    pits: Vec<Pit>,
}

impl Board {
    /// Generate the initial board for a topology and player count.
    ///
    /// For each player in seat order: one quan pit holding `quan_value`
    /// stones, then that player's five dân pits holding five stones each.
    /// The concatenation is the forward order for the whole game.
    ///
    /// Only (Rectangle, 2), (Triangle, 3) and (Square, 4) are valid; any
    /// other pairing is refused rather than silently substituted.
    pub fn generate(layout: Layout, player_count: u8, quan_value: u32) -> Result<Self, GameError> {
        if layout.player_count() != player_count {
            return Err(GameError::UnsupportedLayout {
                layout,
                players: player_count,
            });
        }

        let per_player = usize::from(DAN_PITS_PER_PLAYER) + 1;
        let mut pits = Vec::with_capacity(usize::from(player_count) * per_player);
        for player in 0..player_count {
            pits.push(Pit {
                id: PitId::Quan(player),
                kind: PitKind::Quan,
                owner: None,
                stones: quan_value,
            });
            for index in 0..DAN_PITS_PER_PLAYER {
                pits.push(Pit {
                    id: PitId::Dan { player, index },
                    kind: PitKind::Dan,
                    owner: Some(player),
                    stones: INITIAL_DAN_STONES,
                });
            }
        }

        tracing::debug!(?layout, player_count, pits = pits.len(), "generated board");
        Ok(Self { layout, pits })
    }

    /// The topology this board was generated with
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Number of pits in the circular sequence
    pub fn len(&self) -> usize {
        self.pits.len()
    }

    /// True for a board with no pits (never produced by [`Board::generate`])
    pub fn is_empty(&self) -> bool {
        self.pits.is_empty()
    }

    /// All pits in forward order
    pub fn pits(&self) -> &[Pit] {
        &self.pits
    }

    /// Look up a pit by id
    pub fn get(&self, id: PitId) -> Option<&Pit> {
        self.pits.iter().find(|p| p.id == id)
    }

    /// The neighboring pit in the given travel direction.
    ///
    /// The only place wraparound arithmetic lives; all sowing and capture
    /// logic routes through here.
    pub fn next(&self, id: PitId, direction: Direction) -> Result<PitId, GameError> {
        let index = self
            .pits
            .iter()
            .position(|p| p.id == id)
            .ok_or(GameError::PitNotFound(id))?;
        let len = self.pits.len();
        let next = match direction {
            Direction::Forward => (index + 1) % len,
            Direction::Backward => (index + len - 1) % len,
        };
        Ok(self.pits[next].id)
    }

    /// Set a pit's stone count. The single mutation point for board state.
    pub fn set_stones(&mut self, id: PitId, stones: u32) -> Result<(), GameError> {
        let pit = self
            .pits
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::PitNotFound(id))?;
        tracing::trace!(pit = %id, from = pit.stones, to = stones, "set stones");
        pit.stones = stones;
        Ok(())
    }

    /// The dân pits owned by a player, in board order
    pub fn dan_pits_of(&self, player: u8) -> impl Iterator<Item = &Pit> {
        self.pits
            .iter()
            .filter(move |p| p.kind == PitKind::Dan && p.owner == Some(player))
    }

    /// True once every quan pit is empty, the game-over condition
    pub fn all_quan_empty(&self) -> bool {
        self.pits
            .iter()
            .all(|p| p.kind != PitKind::Quan || p.is_empty())
    }

    /// Sum of all stones currently sitting in pits
    pub fn total_stones(&self) -> u32 {
        self.pits.iter().map(|p| p.stones).sum()
    }
}
