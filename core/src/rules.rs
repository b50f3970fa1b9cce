// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture cascade and empty-side rule application
//!
//! These functions mutate the board and report what happened; crediting
//! scores and emitting presentation events stays with the engine.

use crate::board::Board;
use crate::scoring::DebtRecord;
use crate::{Direction, GameConfig, GameError, PitId, PitKind, Player, DAN_PITS_PER_PLAYER};

/// One pit emptied during a capture cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// The captured pit
    pub pit: PitId,
    /// Kind of the captured pit
    pub kind: PitKind,
    /// Stones it held when captured
    pub stones: u32,
}

/// Outcome of one application of the empty-side rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reseed {
    /// The re-seeded player
    pub player: u8,
    /// Stones funded from the player's banked score
    pub from_score: u32,
    /// Debt recorded when the score could not cover the re-seed
    pub borrowed: Option<DebtRecord>,
}

/// True when the Quan Non rule shields `pit` from capture
pub fn quan_non_protects(config: &GameConfig, board: &Board, pit: PitId) -> bool {
    if !config.quan_non_enabled {
        return false;
    }
    match board.get(pit) {
        Some(p) => p.kind == PitKind::Quan && p.stones() < config.quan_non_threshold,
        None => false,
    }
}

/// Walk the capture chain starting at `start`, emptying captured pits.
///
/// Each captured pit must be followed (in the travel direction) by an empty
/// pit and then an occupied one for the chain to continue. The chain stops
/// at any missing or empty pit and at any quan pit shielded by Quan Non.
/// Returns the captures in chain order; the board is already updated.
pub fn capture_cascade(
    board: &mut Board,
    config: &GameConfig,
    start: PitId,
    direction: Direction,
) -> Vec<Capture> {
    let mut captures = Vec::new();
    let mut current = start;

    loop {
        let (kind, stones) = match board.get(current) {
            Some(p) if !p.is_empty() => (p.kind, p.stones()),
            _ => {
                tracing::debug!(pit = %current, "cascade stop: pit empty or missing");
                break;
            }
        };

        if quan_non_protects(config, board, current) {
            tracing::debug!(
                pit = %current,
                stones,
                threshold = config.quan_non_threshold,
                "cascade stop: quan non protection"
            );
            break;
        }

        if board.set_stones(current, 0).is_err() {
            break;
        }
        captures.push(Capture {
            pit: current,
            kind,
            stones,
        });

        // Continuation needs an empty gap pit, then an occupied target.
        let gap = match board.next(current, direction) {
            Ok(id) => id,
            Err(_) => break,
        };
        match board.get(gap) {
            Some(p) if p.is_empty() => {}
            _ => break,
        }
        let target = match board.next(gap, direction) {
            Ok(id) => id,
            Err(_) => break,
        };
        match board.get(target) {
            Some(p) if !p.is_empty() => current = target,
            _ => break,
        }
    }

    captures
}

/// True when every dân pit owned by `player` is empty
pub fn side_is_empty(board: &Board, player: u8) -> bool {
    board.dan_pits_of(player).all(|p| p.is_empty())
}

/// Re-seed `player`'s dân pits with one stone each.
///
/// The seed is funded from the player's banked score; any shortfall is
/// advanced on credit and recorded as a debt to the next player in turn
/// order. The caller is responsible for appending the returned debt to the
/// ledger.
pub fn apply_empty_side_rule(
    board: &mut Board,
    player: &mut Player,
    player_count: u8,
) -> Result<Reseed, GameError> {
    let needed = u32::from(DAN_PITS_PER_PLAYER);
    let available = player.dan;

    let (from_score, borrowed) = if available >= needed {
        player.dan -= needed;
        (needed, None)
    } else {
        player.dan = 0;
        let amount = needed - available;
        let lender = (player.id + 1) % player_count;
        (
            available,
            Some(DebtRecord {
                borrower: player.id,
                lender,
                amount,
            }),
        )
    };

    let ids: Vec<PitId> = board.dan_pits_of(player.id).map(|p| p.id).collect();
    for id in ids {
        board.set_stones(id, 1)?;
    }

    tracing::debug!(
        player = player.id,
        from_score,
        borrowed = borrowed.as_ref().map(|d| d.amount).unwrap_or(0),
        "applied empty-side rule"
    );

    Ok(Reseed {
        player: player.id,
        from_score,
        borrowed,
    })
}
