// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! A game session: the play state plus the settings and the deferred
//! computer move that surround it.
//!
//! `Game` never sleeps or spawns. When the computer is due to move it
//! records a deadline; the host's event loop asks for it with
//! `next_deadline` and calls `poll` once it has passed. Every input
//! bumps the play state version, so a deadline armed for an earlier
//! state is dropped rather than played.

use anyhow::Result;
use log::{debug, trace};
#[cfg(feature = "random")]
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use web_time::Instant;
use thiserror::Error;

use crate::{Color, GameStatus, Move, MoveOutcome, Phase, PlayState, Position};
use crate::{Piece, PromotionOutcome, SelectOutcome, Square, Turn};

mod config;
mod schedule;

pub use config::*;
pub use schedule::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Mode cannot change while a promotion is pending or the game is over")]
    ModeLocked,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    Win(Color, WinReason),
    Draw(DrawReason),
}

impl GameResult {
    pub fn from_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::Checkmate(winner) => Some(GameResult::Win(winner, WinReason::CheckMate)),
            GameStatus::Stalemate => Some(GameResult::Draw(DrawReason::StaleMate)),
            GameStatus::Ongoing | GameStatus::Check(_) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinReason {
    CheckMate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    StaleMate,
}

#[derive(Debug)]
pub struct Game {
    state: PlayState,
    config: GameConfig,
    scheduler: Scheduler,
    #[cfg(feature = "random")]
    rng: StdRng,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::from_state(config, PlayState::new())
    }

    pub fn from_position(config: GameConfig, position: Position, turn: Color) -> Self {
        Self::from_state(config, PlayState::from_position(position, turn))
    }

    fn from_state(config: GameConfig, state: PlayState) -> Self {
        let mut game = Self {
            state,
            config,
            scheduler: Scheduler::new(),
            #[cfg(feature = "random")]
            rng: StdRng::from_entropy(),
        };
        game.arm();
        game
    }

    /// Replaces the random source, for repeatable computer play.
    #[cfg(feature = "random")]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[inline]
    pub fn state(&self) -> &PlayState {
        &self.state
    }
    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
    #[inline]
    pub fn mode(&self) -> GameMode {
        self.config.mode
    }
    #[inline]
    pub fn status(&self) -> GameStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<GameResult> {
        GameResult::from_status(self.state.status())
    }

    /// True while board input belongs to the computer.
    pub fn is_computer_turn(&self) -> bool {
        self.config.computer_plays(self.state.turn())
    }

    pub fn select_square(&mut self, square: Square) -> SelectOutcome {
        if self.is_computer_turn() {
            trace!("ignoring selection of {square} on the computer's turn");
            return SelectOutcome::Ignored;
        }
        let outcome = self.state.select_square(square);
        self.arm();
        outcome
    }

    pub fn attempt_move(&mut self, mv: Move) -> MoveOutcome {
        if self.is_computer_turn() {
            trace!("ignoring move {mv} on the computer's turn");
            return self.state.rejected();
        }
        let outcome = self.state.attempt_move(mv);
        self.arm();
        outcome
    }

    pub fn resolve_promotion(&mut self, choice: Piece) -> Result<PromotionOutcome> {
        let outcome = self.state.resolve_promotion(choice)?;
        self.arm();
        Ok(outcome)
    }

    pub fn cancel_promotion(&mut self) -> Result<GameStatus> {
        let status = self.state.cancel_promotion()?;
        self.arm();
        Ok(status)
    }

    /// Starts over from the opening position. A pending computer move is
    /// dropped; if the computer plays White it is scheduled afresh.
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.state.reset();
        self.arm();
    }

    /// Switches between two-player and computer play. Refused while a
    /// promotion is pending or after the game has ended.
    pub fn set_mode(&mut self, mode: GameMode) -> Result<()> {
        if matches!(self.state.phase(), Phase::AwaitingPromotion(_) | Phase::GameOver) {
            return Err(GameError::ModeLocked.into());
        }
        debug!("mode {} -> {}", self.config.mode, mode);
        self.config.mode = mode;
        self.scheduler.cancel();
        self.arm();
        Ok(())
    }

    /// When the pending computer move is due, if any.
    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Plays the scheduled computer move if it is due at `now` and the
    /// game is still in the state it was scheduled against. Returns the
    /// outcome when a move was attempted.
    #[cfg(feature = "random")]
    pub fn poll(&mut self, now: Instant) -> Option<MoveOutcome> {
        let scheduled = self.scheduler.take_due(now)?;
        if scheduled.version != self.state.version()
            || self.state.phase() != Phase::AwaitingSelection
            || !self.is_computer_turn()
        {
            debug!("dropping stale computer move for version {}", scheduled.version);
            self.arm();
            return None;
        }
        debug!("computer move for version {} fired", scheduled.version);
        let outcome = self.state.computer_move(&mut self.rng);
        self.arm();
        Some(outcome)
    }

    // Keeps the schedule in step with the play state: one pending move for
    // the current version while the computer is to move, none otherwise.
    fn arm(&mut self) {
        let wanted = self.is_computer_turn() && self.state.phase() == Phase::AwaitingSelection;
        let version = self.state.version();
        match self.scheduler.pending() {
            Some(scheduled) if wanted && scheduled.version == version => {}
            _ if wanted => {
                self.scheduler
                    .schedule(version, Instant::now() + self.config.think_delay);
            }
            Some(_) => {
                self.scheduler.cancel();
            }
            None => {}
        }
    }
}

impl Turn for Game {
    #[inline]
    fn turn(&self) -> Color {
        self.state.turn()
    }
}

impl AsRef<Position> for Game {
    fn as_ref(&self) -> &Position {
        self.state.as_ref()
    }
}

impl crate::Pos for Game {}
