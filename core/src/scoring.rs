//! Score bookkeeping: the debt ledger, final collection and standings

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::{GameError, PitId, PitKind, Player};

/// A loan created by the empty-side rule.
///
/// Immutable once recorded; debts are never merged or cancelled mid-game,
/// only netted out in the end-of-game settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    /// Seat index of the borrowing player
    pub borrower: u8,
    /// Seat index of the lending player
    pub lender: u8,
    /// Stones owed
    pub amount: u32,
}

/// A player's standing in the end-of-game summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Seat index
    pub player: u8,
    /// Display name
    pub name: String,
    /// Stones banked over the game
    pub dan: u32,
    /// Quan pits captured
    pub quan: u32,
    /// Net debt adjustment (positive for net lenders)
    pub net_debt: i64,
    /// dân + quan × quan_value + net debt
    pub total: i64,
}

/// One pit emptied during final collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// The swept pit
    pub pit: PitId,
    /// Seat index of the pit owner
    pub owner: u8,
    /// Stones moved to the owner's score
    pub stones: u32,
}

/// Net debt per seat: credit for every loan made, debit for every loan taken
pub fn net_debts(players: &[Player], debts: &[DebtRecord]) -> Vec<i64> {
    let mut net = vec![0i64; players.len()];
    for debt in debts {
        if let Some(credit) = net.get_mut(usize::from(debt.lender)) {
            *credit += i64::from(debt.amount);
        }
        if let Some(debit) = net.get_mut(usize::from(debt.borrower)) {
            *debit -= i64::from(debt.amount);
        }
    }
    net
}

/// Final standings in seat order
pub fn final_scores(players: &[Player], debts: &[DebtRecord], quan_value: u32) -> Vec<FinalScore> {
    let net = net_debts(players, debts);
    players
        .iter()
        .zip(net)
        .map(|(player, net_debt)| {
            let base = i64::from(player.dan) + i64::from(player.quan) * i64::from(quan_value);
            FinalScore {
                player: player.id,
                name: player.name.clone(),
                dan: player.dan,
                quan: player.quan,
                net_debt,
                total: base + net_debt,
            }
        })
        .collect()
}

/// Index of the winning standing; ties go to the earliest seat
pub fn winner(scores: &[FinalScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, score) in scores.iter().enumerate() {
        match best {
            Some(current) if scores[current].total >= score.total => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Sweep every non-empty dân pit into its owner's banked score.
///
/// Runs once when the game ends; sweep order only matters to presentation.
pub fn collect_remaining(
    board: &mut Board,
    players: &mut [Player],
) -> Result<Vec<Collection>, GameError> {
    let targets: Vec<(PitId, u8, u32)> = board
        .pits()
        .iter()
        .filter(|p| p.kind == PitKind::Dan && !p.is_empty())
        .filter_map(|p| p.owner.map(|owner| (p.id, owner, p.stones())))
        .collect();

    let mut collected = Vec::with_capacity(targets.len());
    for (pit, owner, stones) in targets {
        board.set_stones(pit, 0)?;
        if let Some(player) = players.get_mut(usize::from(owner)) {
            player.dan += stones;
        }
        collected.push(Collection { pit, owner, stones });
    }
    Ok(collected)
}
