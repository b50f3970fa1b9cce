// SPDX-License-Identifier: MIT OR Apache-2.0

//! The turn state machine driving a game of Ô Ăn Quan
//!
//! All mutation happens on a single owned [`Game`] value; player input is
//! gated by one boolean lock, and every sowing/capture/re-seed sequence runs
//! to a terminal phase before control returns to the caller. Discrete steps
//! are published as [`GameEvent`]s for the presentation layer to pace.

use std::collections::BTreeSet;

use rand::Rng;
use uuid::Uuid;

use crate::board::{Board, Layout};
use crate::rules;
use crate::scoring::{self, DebtRecord, FinalScore};
use crate::{
    Direction, GameConfig, GameError, GameEvent, Phase, PitId, PitKind, Player, SelectionOutcome,
};

/// Continuation values of the turn trampoline.
///
/// Sowing can re-trigger sowing; an explicit loop over these keeps the
/// stack flat and every transition inspectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnStep {
    Sow(PitId),
    Evaluate,
    Capture(PitId),
    End,
}

/// A running game: board, players, ledger and turn state
pub struct Game {
    id: Uuid,
    config: GameConfig,
    board: Board,
    players: Vec<Player>,
    debts: Vec<DebtRecord>,
    current_player: u8,
    selected_pit: Option<PitId>,
    direction: Option<Direction>,
    last_landing: Option<PitId>,
    input_locked: bool,
    phase: Phase,
    message: String,
    events: Vec<GameEvent>,
}

impl Game {
    /// Set up a new game: board, players and starting player.
    ///
    /// The starting player is drawn at random unless pinned in the config.
    /// The empty-side rule is checked once for the starting player before
    /// input is enabled (it cannot fire on a freshly seeded board, but the
    /// check is part of every turn start).
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let layout = Layout::for_players(config.player_count)?;
        if let Some(start) = config.starting_player {
            if start >= config.player_count {
                return Err(GameError::InvalidConfig(format!(
                    "starting player {} out of range for {} players",
                    start, config.player_count
                )));
            }
        }

        let board = Board::generate(layout, config.player_count, config.quan_value)?;
        let players = (0..config.player_count).map(Player::new).collect();
        let current_player = match config.starting_player {
            Some(start) => start,
            None => rand::thread_rng().gen_range(0..config.player_count),
        };

        let mut game = Self {
            id: Uuid::new_v4(),
            config,
            board,
            players,
            debts: Vec::new(),
            current_player,
            selected_pit: None,
            direction: None,
            last_landing: None,
            input_locked: false,
            phase: Phase::Setup,
            message: String::new(),
            events: Vec::new(),
        };
        tracing::debug!(
            game = %game.id,
            ?layout,
            players = game.config.player_count,
            starting_player = current_player,
            "game initialized"
        );
        game.begin_turn();
        Ok(game)
    }

    /// Handle a pit click from the active player.
    ///
    /// Clicks on an unknown pit are a typed error; clicks that are merely
    /// ineligible right now (wrong owner, empty pit, wrong phase, input
    /// locked) are reported as [`SelectionOutcome::Ignored`].
    pub fn select_pit(&mut self, pit: PitId) -> Result<SelectionOutcome, GameError> {
        if self.input_locked {
            tracing::debug!(game = %self.id, pit = %pit, "selection ignored: input locked");
            return Ok(SelectionOutcome::Ignored);
        }

        let eligible = {
            let clicked = self.board.get(pit).ok_or(GameError::PitNotFound(pit))?;
            clicked.owner == Some(self.current_player)
                && clicked.kind == PitKind::Dan
                && !clicked.is_empty()
        };

        match self.phase {
            Phase::AwaitingSelection => {
                if eligible {
                    self.selected_pit = Some(pit);
                    self.phase = Phase::AwaitingDirection;
                    self.message = format!("Choose a direction for pit {}.", pit);
                    tracing::debug!(game = %self.id, pit = %pit, "pit selected");
                    Ok(SelectionOutcome::Selected)
                } else {
                    self.message = format!(
                        "Player {}: select one of your non-empty dân pits.",
                        self.current_player + 1
                    );
                    Ok(SelectionOutcome::Ignored)
                }
            }
            Phase::AwaitingDirection => {
                if self.selected_pit == Some(pit) {
                    self.selected_pit = None;
                    self.direction = None;
                    self.phase = Phase::AwaitingSelection;
                    self.message = format!(
                        "Player {}'s turn. Select a dân pit.",
                        self.current_player + 1
                    );
                    tracing::debug!(game = %self.id, pit = %pit, "pit deselected");
                    Ok(SelectionOutcome::Deselected)
                } else if eligible {
                    self.selected_pit = Some(pit);
                    self.direction = None;
                    self.message = format!("Choose a direction for pit {}.", pit);
                    tracing::debug!(game = %self.id, pit = %pit, "selection switched");
                    Ok(SelectionOutcome::Switched)
                } else {
                    self.message =
                        "Choose a direction, or select a different valid pit.".to_string();
                    Ok(SelectionOutcome::Ignored)
                }
            }
            _ => {
                tracing::debug!(game = %self.id, phase = ?self.phase, "selection ignored in phase");
                Ok(SelectionOutcome::Ignored)
            }
        }
    }

    /// Commit the selected pit to a travel direction and play the turn out.
    ///
    /// Runs the whole sowing/capture sequence to a terminal phase
    /// (`AwaitingSelection` for the next player, or `GameOver`) before
    /// returning. Ignored while the input lock is held.
    pub fn choose_direction(&mut self, direction: Direction) -> Result<(), GameError> {
        if self.input_locked {
            tracing::debug!(game = %self.id, "direction ignored: input locked");
            return Ok(());
        }
        if self.phase != Phase::AwaitingDirection {
            return Err(GameError::WrongPhase(self.phase));
        }
        let start = self.selected_pit.ok_or(GameError::NoPitSelected)?;

        self.direction = Some(direction);
        self.input_locked = true;
        self.phase = Phase::AnimatingSow;
        self.message = "Sowing stones...".to_string();
        tracing::debug!(game = %self.id, start = %start, ?direction, "direction chosen");

        self.run_turn(start, direction);
        Ok(())
    }

    /// The turn trampoline: step until the turn reaches its end.
    fn run_turn(&mut self, start: PitId, direction: Direction) {
        let mut step = TurnStep::Sow(start);
        loop {
            step = match step {
                TurnStep::Sow(pit) => self.sow(pit, direction),
                TurnStep::Evaluate => self.evaluate_landing(direction),
                TurnStep::Capture(pit) => self.process_captures(pit, direction),
                TurnStep::End => {
                    self.end_turn();
                    break;
                }
            };
        }
    }

    /// Pick up the start pit and drop one stone into each following pit.
    ///
    /// The landing sequence is resolved up front, one neighbor hop per
    /// stone, so it is a pure function of board order; the drops are then
    /// applied strictly in sequence order. An empty or missing start pit
    /// fails safe to turn end.
    fn sow(&mut self, start: PitId, direction: Direction) -> TurnStep {
        self.phase = Phase::AnimatingSow;

        let stones = match self.board.get(start) {
            Some(pit) if !pit.is_empty() => pit.stones(),
            _ => {
                tracing::warn!(game = %self.id, pit = %start, "sow aborted: start pit empty or missing");
                return TurnStep::End;
            }
        };
        if self.board.set_stones(start, 0).is_err() {
            return TurnStep::End;
        }

        let mut sequence = Vec::with_capacity(stones as usize);
        let mut cursor = start;
        for _ in 0..stones {
            cursor = match self.board.next(cursor, direction) {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(game = %self.id, %err, "sow aborted: neighbor resolution failed");
                    return TurnStep::End;
                }
            };
            sequence.push(cursor);
        }

        let mut from = start;
        for target in sequence {
            let current = match self.board.get(target) {
                Some(pit) => pit.stones(),
                None => {
                    tracing::warn!(game = %self.id, pit = %target, "sow aborted: target pit vanished");
                    return TurnStep::End;
                }
            };
            if self.board.set_stones(target, current + 1).is_err() {
                return TurnStep::End;
            }
            self.events.push(GameEvent::StoneMoved { from, to: target });
            self.last_landing = Some(target);
            from = target;
        }

        tracing::debug!(
            game = %self.id,
            start = %start,
            stones,
            landing = %from,
            "sowing complete"
        );
        self.phase = Phase::EvaluatingLanding;
        TurnStep::Evaluate
    }

    /// Decide what the landing pit leads to: another sow, a capture, or
    /// the end of the turn.
    fn evaluate_landing(&mut self, direction: Direction) -> TurnStep {
        self.phase = Phase::EvaluatingLanding;

        let landing = match self.last_landing {
            Some(id) => id,
            None => {
                tracing::warn!(game = %self.id, "evaluation aborted: no landing recorded");
                return TurnStep::End;
            }
        };
        let next1 = match self.board.next(landing, direction) {
            Ok(id) => id,
            Err(_) => return TurnStep::End,
        };
        let next1_stones = match self.board.get(next1) {
            Some(pit) => pit.stones(),
            None => return TurnStep::End,
        };

        if next1_stones > 0 {
            tracing::debug!(game = %self.id, pit = %next1, "continuing sow");
            self.message = "Continuing sow...".to_string();
            return TurnStep::Sow(next1);
        }

        // The pit after the landing is empty: a capture triggers if the pit
        // beyond it holds stones.
        let next2 = match self.board.next(next1, direction) {
            Ok(id) => id,
            Err(_) => return TurnStep::End,
        };
        let next2_stones = match self.board.get(next2) {
            Some(pit) => pit.stones(),
            None => return TurnStep::End,
        };
        if next2_stones == 0 {
            self.message = "No capture possible. Turn ends.".to_string();
            return TurnStep::End;
        }
        if rules::quan_non_protects(&self.config, &self.board, next2) {
            tracing::debug!(game = %self.id, pit = %next2, "quan non prevents capture");
            self.message = "Quan Non rule prevents capture. Turn ends.".to_string();
            return TurnStep::End;
        }
        TurnStep::Capture(next2)
    }

    /// Run the capture cascade and credit the active player.
    fn process_captures(&mut self, start: PitId, direction: Direction) -> TurnStep {
        self.phase = Phase::ProcessingCapture;

        let captures = rules::capture_cascade(&mut self.board, &self.config, start, direction);
        if captures.is_empty() {
            // Unreachable given the entry conditions in evaluate_landing,
            // kept as a guard against regressions there.
            tracing::warn!(game = %self.id, pit = %start, "capture cascade produced no captures");
            self.message = "No captures this turn. Turn ends.".to_string();
            return TurnStep::End;
        }

        let by = self.current_player;
        let mut total = 0u32;
        for capture in &captures {
            let player = &mut self.players[usize::from(by)];
            player.dan += capture.stones;
            if capture.kind == PitKind::Quan {
                player.quan += 1;
            }
            total += capture.stones;
            self.events.push(GameEvent::PitCaptured {
                pit: capture.pit,
                kind: capture.kind,
                stones: capture.stones,
                by,
            });
        }
        tracing::debug!(
            game = %self.id,
            player = by,
            pits = captures.len(),
            stones = total,
            "capture cascade complete"
        );
        self.message = format!(
            "Player {} captured {} pit{}! Turn ends.",
            by + 1,
            captures.len(),
            if captures.len() > 1 { "s" } else { "" }
        );
        TurnStep::End
    }

    /// Close out the turn: detect game over or hand play to the next seat.
    fn end_turn(&mut self) {
        self.selected_pit = None;
        self.direction = None;
        self.last_landing = None;

        if self.board.all_quan_empty() {
            self.finish_game();
            return;
        }

        self.current_player = (self.current_player + 1) % self.config.player_count;
        self.begin_turn();
    }

    /// Start the current player's turn, applying the empty-side rule first
    /// when their whole side is bare.
    fn begin_turn(&mut self) {
        self.events.push(GameEvent::TurnStarted {
            player: self.current_player,
        });

        if rules::side_is_empty(&self.board, self.current_player) {
            self.phase = Phase::ApplyingEmptySideRule;
            self.input_locked = true;
            let index = usize::from(self.current_player);
            match rules::apply_empty_side_rule(
                &mut self.board,
                &mut self.players[index],
                self.config.player_count,
            ) {
                Ok(reseed) => {
                    self.events.push(GameEvent::Reseeded {
                        player: reseed.player,
                        from_score: reseed.from_score,
                    });
                    if let Some(debt) = reseed.borrowed {
                        self.debts.push(debt);
                        self.events.push(GameEvent::DebtRecorded {
                            borrower: debt.borrower,
                            lender: debt.lender,
                            amount: debt.amount,
                        });
                    }
                }
                Err(err) => {
                    tracing::warn!(game = %self.id, %err, "empty-side rule failed");
                }
            }
        }

        self.phase = Phase::AwaitingSelection;
        self.input_locked = false;
        self.message = format!(
            "Player {}'s turn. Select a dân pit.",
            self.current_player + 1
        );
    }

    /// Final collection and standings once every quan pit is empty.
    ///
    /// The input lock stays held until collection completes.
    fn finish_game(&mut self) {
        self.phase = Phase::GameOver;
        self.input_locked = true;
        self.message = "Game over! Collecting remaining stones...".to_string();

        match scoring::collect_remaining(&mut self.board, &mut self.players) {
            Ok(collected) => {
                for collection in &collected {
                    self.events.push(GameEvent::StonesCollected {
                        pit: collection.pit,
                        stones: collection.stones,
                        owner: collection.owner,
                    });
                }
            }
            Err(err) => {
                tracing::warn!(game = %self.id, %err, "final collection failed");
            }
        }

        let scores = scoring::final_scores(&self.players, &self.debts, self.config.quan_value);
        let winner = scoring::winner(&scores).map(|index| scores[index].player);
        self.events.push(GameEvent::GameFinished {
            winner,
            scores: scores.iter().map(|s| s.total).collect(),
        });
        self.input_locked = false;
        self.message = match winner {
            Some(seat) => format!("Game over! {} wins!", self.players[usize::from(seat)].name),
            None => "Game over!".to_string(),
        };
        tracing::debug!(game = %self.id, ?winner, "game finished");
    }

    // --- Read-only queries ---

    /// Unique id of this game instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The settings this game was started with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current board state
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Board topology
    pub fn layout(&self) -> Layout {
        self.board.layout()
    }

    /// All players in seat order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The player whose turn it is
    pub fn active_player(&self) -> &Player {
        &self.players[usize::from(self.current_player)]
    }

    /// Seat index of the active player
    pub fn current_player_index(&self) -> u8 {
        self.current_player
    }

    /// Current phase of the turn state machine
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Short human-readable status line, updated on every transition
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Currently selected pit, if any
    pub fn selected_pit(&self) -> Option<PitId> {
        self.selected_pit
    }

    /// Direction committed for the turn in progress, if any
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// True while player input is gated off
    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    /// True once the game has reached its terminal phase
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Every debt recorded so far, in creation order
    pub fn debts(&self) -> &[DebtRecord] {
        &self.debts
    }

    /// Net debt adjustment per seat
    pub fn net_debts(&self) -> Vec<i64> {
        scoring::net_debts(&self.players, &self.debts)
    }

    /// Pits the active player may select right now
    pub fn selectable_pits(&self) -> BTreeSet<PitId> {
        if self.phase != Phase::AwaitingSelection {
            return BTreeSet::new();
        }
        self.potential_selectable_pits()
    }

    /// Pits that would be selectable for the active player regardless of
    /// phase; used by presentation layers for hover hints
    pub fn potential_selectable_pits(&self) -> BTreeSet<PitId> {
        if self.input_locked {
            return BTreeSet::new();
        }
        self.board
            .dan_pits_of(self.current_player)
            .filter(|p| !p.is_empty())
            .map(|p| p.id)
            .collect()
    }

    /// Final standings; empty until the game is over
    pub fn final_scores(&self) -> Vec<FinalScore> {
        if !self.is_game_over() {
            return Vec::new();
        }
        scoring::final_scores(&self.players, &self.debts, self.config.quan_value)
    }

    /// The winning standing; `None` until the game is over
    pub fn winner(&self) -> Option<FinalScore> {
        let scores = self.final_scores();
        scoring::winner(&scores).map(|index| scores[index].clone())
    }

    /// Drain the queued presentation events in emission order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned_game(starting_player: u8, quan_non_enabled: bool) -> Game {
        Game::new(GameConfig {
            starting_player: Some(starting_player),
            quan_non_enabled,
            ..GameConfig::default()
        })
        .unwrap()
    }

    fn dan(player: u8, index: u8) -> PitId {
        PitId::Dan { player, index }
    }

    fn set(game: &mut Game, id: PitId, stones: u32) {
        game.board.set_stones(id, stones).unwrap();
    }

    fn stones(game: &Game, id: PitId) -> u32 {
        game.board.get(id).unwrap().stones()
    }

    /// Stage a one-stone move for player 0 that neither captures nor
    /// continues: p0_d0 holds 1 stone, and the two pits after the landing
    /// are empty.
    fn stage_quiet_move(game: &mut Game) {
        set(game, dan(0, 0), 1);
        set(game, dan(0, 2), 0);
        set(game, dan(0, 3), 0);
    }

    fn fire_quiet_move(game: &mut Game) {
        assert_eq!(
            game.select_pit(dan(0, 0)).unwrap(),
            SelectionOutcome::Selected
        );
        game.choose_direction(Direction::Forward).unwrap();
    }

    fn play_quiet_move(game: &mut Game) {
        stage_quiet_move(game);
        fire_quiet_move(game);
    }

    #[test]
    fn empty_side_rule_borrows_from_next_player() {
        let mut game = pinned_game(0, false);
        for index in 0..5 {
            set(&mut game, dan(1, index), 0);
        }
        game.players[1].dan = 3;
        stage_quiet_move(&mut game);
        let total_before = game.board.total_stones() + 3;

        fire_quiet_move(&mut game);

        assert_eq!(game.current_player_index(), 1);
        assert_eq!(game.phase(), Phase::AwaitingSelection);
        assert!(!game.is_input_locked());
        for index in 0..5 {
            assert_eq!(stones(&game, dan(1, index)), 1);
        }
        assert_eq!(game.players()[1].dan, 0);
        assert_eq!(
            game.debts(),
            &[DebtRecord {
                borrower: 1,
                lender: 0,
                amount: 2
            }]
        );
        // Borrowed stones are minted onto the board and tracked as debt.
        let total_after: u32 = game.board.total_stones()
            + game.players.iter().map(|p| p.dan).sum::<u32>();
        assert_eq!(total_after, total_before + 2);
        assert_eq!(game.net_debts(), vec![2, -2]);

        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Reseeded {
            player: 1,
            from_score: 3
        }));
        assert!(events.contains(&GameEvent::DebtRecorded {
            borrower: 1,
            lender: 0,
            amount: 2
        }));
    }

    #[test]
    fn empty_side_rule_self_funded_creates_no_debt() {
        let mut game = pinned_game(0, false);
        for index in 0..5 {
            set(&mut game, dan(1, index), 0);
        }
        game.players[1].dan = 8;

        play_quiet_move(&mut game);

        for index in 0..5 {
            assert_eq!(stones(&game, dan(1, index)), 1);
        }
        assert_eq!(game.players()[1].dan, 3);
        assert!(game.debts().is_empty());
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Reseeded {
            player: 1,
            from_score: 5
        }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::DebtRecorded { .. })));
    }

    #[test]
    fn quan_non_suppresses_capture_below_threshold() {
        let mut game = pinned_game(0, true);
        set(&mut game, dan(0, 2), 1);
        set(&mut game, dan(0, 4), 0);
        set(&mut game, PitId::Quan(1), 3);

        game.select_pit(dan(0, 2)).unwrap();
        game.choose_direction(Direction::Forward).unwrap();

        // Landing on p0_d3, p0_d4 empty, q1 holds 3 < threshold 5.
        assert_eq!(stones(&game, PitId::Quan(1)), 3);
        assert_eq!(game.players()[0].dan, 0);
        assert_eq!(game.players()[0].quan, 0);
        assert_eq!(game.current_player_index(), 1);
        assert!(game.message().contains("Quan Non"));
    }

    #[test]
    fn undersized_quan_is_captured_when_rule_disabled() {
        let mut game = pinned_game(0, false);
        set(&mut game, dan(0, 2), 1);
        set(&mut game, dan(0, 4), 0);
        set(&mut game, PitId::Quan(1), 3);

        game.select_pit(dan(0, 2)).unwrap();
        game.choose_direction(Direction::Forward).unwrap();

        assert_eq!(stones(&game, PitId::Quan(1)), 0);
        assert_eq!(game.players()[0].dan, 3);
        assert_eq!(game.players()[0].quan, 1);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::PitCaptured {
            pit: PitId::Quan(1),
            kind: PitKind::Quan,
            stones: 3,
            by: 0
        }));
    }

    #[test]
    fn emptying_the_last_quan_finishes_the_game() {
        let mut game = pinned_game(0, false);
        set(&mut game, PitId::Quan(0), 0);
        set(&mut game, PitId::Quan(1), 0);

        play_quiet_move(&mut game);

        assert!(game.is_game_over());
        assert_eq!(game.phase(), Phase::GameOver);
        assert!(!game.is_input_locked());

        // Every dân pit was swept to its owner.
        for pit in game.board().pits() {
            assert_eq!(pit.stones(), 0);
        }
        // Player 0 kept p0_d1 (5+1 sown) and p0_d4 (5); player 1 kept 5 x 5.
        assert_eq!(game.players()[0].dan, 11);
        assert_eq!(game.players()[1].dan, 25);

        let scores = game.final_scores();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].total, 11);
        assert_eq!(scores[1].total, 25);
        assert_eq!(game.winner().unwrap().player, 1);

        let events = game.drain_events();
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameFinished {
                winner: Some(1),
                ..
            })
        ));
    }

    #[test]
    fn selection_is_ignored_after_game_over() {
        let mut game = pinned_game(0, false);
        set(&mut game, PitId::Quan(0), 0);
        set(&mut game, PitId::Quan(1), 0);
        play_quiet_move(&mut game);
        assert!(game.is_game_over());

        assert_eq!(
            game.select_pit(dan(1, 0)).unwrap(),
            SelectionOutcome::Ignored
        );
        assert!(matches!(
            game.choose_direction(Direction::Forward),
            Err(GameError::WrongPhase(Phase::GameOver))
        ));
    }
}
