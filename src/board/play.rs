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

use anyhow::Result;
use log::{debug, info, trace};
#[cfg(feature = "random")]
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::material::{Color, Material, Pair, Piece, Promotion};
use super::moves::{LegalMoves, Move};
use super::position::{Pos, Position};
use super::square::{Mask, Rank, Square};
use super::Turn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("No promotion is pending")]
    NoPendingPromotion,
    #[error("Not a promotion choice: {0}")]
    InvalidPromotion(String),
}

/// Classification of a position for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Ongoing,
    /// The given side is in check but can still move.
    Check(Color),
    /// Checkmate; the given side is the winner.
    Checkmate(Color),
    Stalemate,
}

impl GameStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Checkmate(_) | GameStatus::Stalemate)
    }
}

/// The pawn waiting for a promotion choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromotionContext {
    pub square: Square,
    pub side: Color,
}

/// A selected piece and the squares it may move to, for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub square: Square,
    pub destinations: Mask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingSelection,
    PieceSelected(Selection),
    AwaitingPromotion(PromotionContext),
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub committed: bool,
    pub position: Position,
    pub captured: Option<Material>,
    pub status: GameStatus,
    pub pending_promotion: Option<PromotionContext>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOutcome {
    pub position: Position,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(Selection),
    Deselected,
    Moved(MoveOutcome),
    Ignored,
}

/// The game controller: the single owner of the current board.
///
/// Every accepted input replaces the board wholesale and bumps
/// `version`, which lets deferred work detect that the state it was
/// scheduled against is gone.
#[derive(Debug, Clone)]
pub struct PlayState {
    position: Position,
    turn: Color,
    last_mover: Option<Color>,
    phase: Phase,
    status: GameStatus,
    captured: Pair<Vec<Material>>,
    history: Vec<Move>,
    version: u64,
}

impl Default for PlayState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayState {
    /// A fresh game from the opening position, White to move.
    pub fn new() -> Self {
        Self::from_position(Position::standard(), Color::White)
    }

    /// Starts play from an arbitrary board with `turn` to move.
    pub fn from_position(position: Position, turn: Color) -> Self {
        let mut state = Self {
            position,
            turn,
            last_mover: None,
            phase: Phase::AwaitingSelection,
            status: GameStatus::Ongoing,
            captured: Pair::default(),
            history: Vec::new(),
            version: 0,
        };
        state.refresh_status();
        state
    }

    /// Back to the opening position. The version keeps counting so that
    /// anything scheduled before the reset is recognizably stale.
    pub fn reset(&mut self) {
        let version = self.version + 1;
        *self = Self::new();
        self.version = version;
        info!("game reset");
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }
    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }
    /// The side that made the most recent move, if any.
    #[inline]
    pub fn last_mover(&self) -> Option<Color> {
        self.last_mover
    }
    /// Pieces captured by `side`, in capture order.
    #[inline]
    pub fn captured_by(&self, side: Color) -> &[Material] {
        &self.captured[side]
    }
    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }
    pub fn selection(&self) -> Option<Selection> {
        match self.phase {
            Phase::PieceSelected(selection) => Some(selection),
            _ => None,
        }
    }
    pub fn pending_promotion(&self) -> Option<PromotionContext> {
        match self.phase {
            Phase::AwaitingPromotion(context) => Some(context),
            _ => None,
        }
    }
    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Handles a click on `square`: selects, switches or clears the
    /// selection, or tries to move the selected piece there.
    pub fn select_square(&mut self, square: Square) -> SelectOutcome {
        let own_piece = self
            .position
            .contents(square)
            .is_some_and(|material| material.color() == self.turn);
        match self.phase {
            Phase::GameOver | Phase::AwaitingPromotion(_) => {
                trace!("ignoring selection of {square} in {:?}", self.phase);
                SelectOutcome::Ignored
            }
            Phase::AwaitingSelection if own_piece => SelectOutcome::Selected(self.select(square)),
            Phase::AwaitingSelection => SelectOutcome::Ignored,
            Phase::PieceSelected(selection) if selection.square == square => {
                self.phase = Phase::AwaitingSelection;
                self.version += 1;
                SelectOutcome::Deselected
            }
            Phase::PieceSelected(_) if own_piece => SelectOutcome::Selected(self.select(square)),
            Phase::PieceSelected(selection) => {
                SelectOutcome::Moved(self.attempt_move(Move::new(selection.square, square)))
            }
        }
    }

    fn select(&mut self, square: Square) -> Selection {
        let selection = Selection {
            square,
            destinations: self.position.legal_destinations(square),
        };
        self.phase = Phase::PieceSelected(selection);
        self.version += 1;
        selection
    }

    /// Moves the piece on `mv.from` if it belongs to the side to move and
    /// the move is check-safe. Rejected moves clear the selection and leave
    /// the board alone.
    pub fn attempt_move(&mut self, mv: Move) -> MoveOutcome {
        if matches!(self.phase, Phase::GameOver | Phase::AwaitingPromotion(_)) {
            trace!("ignoring move {mv} in {:?}", self.phase);
            return self.rejected();
        }
        let own_piece = self
            .position
            .contents(mv.from)
            .is_some_and(|material| material.color() == self.turn);
        if !own_piece || !self.position.is_check_safe(mv) {
            trace!("rejecting move {mv} for {}", self.turn);
            self.phase = Phase::AwaitingSelection;
            self.version += 1;
            return self.rejected();
        }
        self.commit(mv, false)
    }

    /// Resolves the pending promotion with `choice`. Anything other than a
    /// queen, rook, bishop or knight is refused and the prompt stays open.
    pub fn resolve_promotion(&mut self, choice: Piece) -> Result<PromotionOutcome> {
        let context = self.pending_promotion().ok_or(PlayError::NoPendingPromotion)?;
        let promotion = Promotion::try_from(choice)?;
        let material = Material::new(context.side, promotion.into());
        self.position = self.position.clone().set(context.square, Some(material));
        self.version += 1;
        debug!("{} promoted to {} on {}", context.side, choice, context.square);
        self.refresh_status();
        Ok(PromotionOutcome {
            position: self.position.clone(),
            status: self.status,
        })
    }

    /// Dismisses the promotion prompt. The pawn stays a pawn on the last
    /// rank and is not offered promotion again.
    pub fn cancel_promotion(&mut self) -> Result<GameStatus> {
        let context = self.pending_promotion().ok_or(PlayError::NoPendingPromotion)?;
        debug!("promotion on {} dismissed", context.square);
        self.version += 1;
        self.refresh_status();
        Ok(self.status)
    }

    /// Plays a uniformly random check-safe move for the side to move,
    /// promoting to a queen without asking. If there is no such move the
    /// game ends in checkmate or stalemate.
    #[cfg(feature = "random")]
    pub fn computer_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> MoveOutcome {
        if matches!(self.phase, Phase::GameOver | Phase::AwaitingPromotion(_)) {
            return self.rejected();
        }
        match super::random::choose_move(&self.position, self.turn, rng) {
            Some(mv) => {
                debug!("computer plays {mv} for {}", self.turn);
                self.commit(mv, true)
            }
            None => {
                self.status = if self.position.is_in_check(self.turn) {
                    GameStatus::Checkmate(!self.turn)
                } else {
                    GameStatus::Stalemate
                };
                self.phase = Phase::GameOver;
                self.version += 1;
                info!("computer has no move: {:?}", self.status);
                self.rejected()
            }
        }
    }

    fn commit(&mut self, mv: Move, auto_queen: bool) -> MoveOutcome {
        let mover = self.turn;
        let (mut next, captured) = self.position.with_move(mv.from, mv.to);
        if let Some(material) = captured {
            self.captured[mover].push(material);
        }
        let promoting = next
            .contents(mv.to)
            .is_some_and(|material| material.piece().is_pawn())
            && mv.to.rank() == Rank::promotion_rank(mover);
        if promoting && auto_queen {
            next = next.set(mv.to, Some(Material::new(mover, Piece::Queen)));
        }
        self.position = next;
        self.history.push(mv);
        self.last_mover = Some(mover);
        self.turn = !mover;
        self.version += 1;
        debug!("{mover} played {mv}, captured {captured:?}");

        let mut pending_promotion = None;
        if promoting && !auto_queen {
            let context = PromotionContext {
                square: mv.to,
                side: mover,
            };
            self.phase = Phase::AwaitingPromotion(context);
            pending_promotion = Some(context);
        } else {
            self.refresh_status();
        }
        MoveOutcome {
            committed: true,
            position: self.position.clone(),
            captured,
            status: self.status,
            pending_promotion,
        }
    }

    fn refresh_status(&mut self) {
        self.status = self.position.status(self.turn);
        if self.status.is_terminal() {
            info!("game over: {:?}", self.status);
            self.phase = Phase::GameOver;
        } else {
            self.phase = Phase::AwaitingSelection;
        }
    }

    pub(crate) fn rejected(&self) -> MoveOutcome {
        MoveOutcome {
            committed: false,
            position: self.position.clone(),
            captured: None,
            status: self.status,
            pending_promotion: self.pending_promotion(),
        }
    }
}

impl Turn for PlayState {
    #[inline]
    fn turn(&self) -> Color {
        self.turn
    }
}

impl AsRef<Position> for PlayState {
    fn as_ref(&self) -> &Position {
        &self.position
    }
}

impl Pos for PlayState {}

impl LegalMoves for PlayState {}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    fn play(state: &mut PlayState, moves: &[&str]) -> MoveOutcome {
        let mut outcome = None;
        for mv in moves {
            let result = state.attempt_move(mv.parse().unwrap());
            assert!(result.committed, "{mv} was rejected");
            outcome = Some(result);
        }
        outcome.unwrap()
    }

    #[test]
    fn test_white_moves_first() {
        let mut state = PlayState::new();
        assert_eq!(state.turn(), Color::White);
        assert_eq!(state.select_square(E7), SelectOutcome::Ignored);
        assert!(matches!(state.select_square(E2), SelectOutcome::Selected(_)));
    }
    #[test]
    fn test_fools_mate() {
        let mut state = PlayState::new();
        let outcome = play(&mut state, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(outcome.status, GameStatus::Checkmate(Color::Black));
        assert_eq!(state.phase(), Phase::GameOver);
        assert_eq!(state.last_mover(), Some(Color::Black));
        // no further play
        assert_eq!(state.select_square(E2), SelectOutcome::Ignored);
        assert!(!state.attempt_move(Move::new(E2, E3)).committed);
    }
    #[test]
    fn test_selection_precomputes_destinations() {
        let mut state = PlayState::new();
        let SelectOutcome::Selected(selection) = state.select_square(G1) else {
            panic!("knight not selected");
        };
        assert_eq!(selection.destinations, Mask::from_squares([F3, H3]));
        assert_eq!(state.selection(), Some(selection));
    }
    #[test]
    fn test_select_same_square_deselects() {
        let mut state = PlayState::new();
        state.select_square(E2);
        assert_eq!(state.select_square(E2), SelectOutcome::Deselected);
        assert_eq!(state.phase(), Phase::AwaitingSelection);
    }
    #[test]
    fn test_select_other_piece_switches() {
        let mut state = PlayState::new();
        state.select_square(E2);
        let SelectOutcome::Selected(selection) = state.select_square(D2) else {
            panic!("selection did not switch");
        };
        assert_eq!(selection.square, D2);
        assert_eq!(selection.destinations, Mask::from_squares([D3, D4]));
    }
    #[test]
    fn test_select_then_move() {
        let mut state = PlayState::new();
        state.select_square(E2);
        let SelectOutcome::Moved(outcome) = state.select_square(E4) else {
            panic!("move not attempted");
        };
        assert!(outcome.committed);
        assert_eq!(state.turn(), Color::Black);
        assert_eq!(state.contents(E4), Some(Material::WP));
        assert_eq!(state.history(), &[Move::new(E2, E4)]);
    }
    #[test]
    fn test_illegal_move_clears_selection() {
        let mut state = PlayState::new();
        state.select_square(E2);
        let SelectOutcome::Moved(outcome) = state.select_square(E5) else {
            panic!("move not attempted");
        };
        assert!(!outcome.committed);
        assert_eq!(outcome.position, Position::standard());
        assert_eq!(state.phase(), Phase::AwaitingSelection);
        assert_eq!(state.turn(), Color::White);
    }
    #[test]
    fn test_cannot_move_opponent_piece() {
        let mut state = PlayState::new();
        assert!(!state.attempt_move(Move::new(E7, E5)).committed);
        assert_eq!(state.position(), &Position::standard());
    }
    #[test]
    fn test_self_check_rejected() {
        let position = Position::empty()
            .set(E1, Some(Material::WK))
            .set(E2, Some(Material::WR))
            .set(E8, Some(Material::BR))
            .set(A8, Some(Material::BK));
        let mut state = PlayState::from_position(position.clone(), Color::White);
        let outcome = state.attempt_move(Move::new(E2, A2));
        assert!(!outcome.committed);
        assert_eq!(state.position(), &position);
        assert!(state.attempt_move(Move::new(E2, E6)).committed);
    }
    #[test]
    fn test_captures_are_tracked() {
        let mut state = PlayState::new();
        let outcome = play(&mut state, &["e2e4", "d7d5", "e4d5"]);
        assert_eq!(outcome.captured, Some(Material::BP));
        assert_eq!(state.captured_by(Color::White), &[Material::BP]);
        assert!(state.captured_by(Color::Black).is_empty());
        let outcome = play(&mut state, &["d8d5"]);
        assert_eq!(outcome.captured, Some(Material::WP));
        assert_eq!(state.captured_by(Color::Black), &[Material::WP]);
    }
    #[test]
    fn test_check_status() {
        let mut state = PlayState::new();
        let outcome = play(&mut state, &["e2e4", "f7f6", "d1h5"]);
        assert_eq!(outcome.status, GameStatus::Check(Color::Black));
        assert_eq!(state.phase(), Phase::AwaitingSelection);
    }

    fn promotion_setup() -> PlayState {
        let position = Position::empty()
            .set(A7, Some(Material::WP))
            .set(E1, Some(Material::WK))
            .set(H6, Some(Material::BK));
        PlayState::from_position(position, Color::White)
    }

    #[test]
    fn test_promotion_flow() {
        let mut state = promotion_setup();
        let outcome = state.attempt_move(Move::new(A7, A8));
        assert!(outcome.committed);
        let context = PromotionContext {
            square: A8,
            side: Color::White,
        };
        assert_eq!(outcome.pending_promotion, Some(context));
        assert_eq!(state.phase(), Phase::AwaitingPromotion(context));
        // turn flips at commit, before the choice
        assert_eq!(state.turn(), Color::Black);
        // nothing else is accepted while the prompt is open
        assert_eq!(state.select_square(H6), SelectOutcome::Ignored);
        assert!(!state.attempt_move(Move::new(H6, H5)).committed);

        let resolved = state.resolve_promotion(Piece::Queen).unwrap();
        assert_eq!(resolved.position.contents(A8), Some(Material::WQ));
        assert_eq!(resolved.status, GameStatus::Ongoing);
        assert_eq!(state.phase(), Phase::AwaitingSelection);
        assert_eq!(state.turn(), Color::Black);
    }
    #[test]
    fn test_promotion_rejects_invalid_choice() {
        let mut state = promotion_setup();
        state.attempt_move(Move::new(A7, A8));
        let version = state.version();
        let err = state.resolve_promotion(Piece::King).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlayError>(),
            Some(PlayError::InvalidPromotion(_))
        ));
        assert!(state.resolve_promotion(Piece::Pawn).is_err());
        assert_eq!(state.version(), version);
        assert!(state.pending_promotion().is_some());
        assert_eq!(state.contents(A8), Some(Material::WP));
        let resolved = state.resolve_promotion(Piece::Knight).unwrap();
        assert_eq!(resolved.position.contents(A8), Some(Material::WN));
    }
    #[test]
    fn test_promotion_to_rook_gives_check() {
        let position = Position::empty()
            .set(B7, Some(Material::WP))
            .set(E1, Some(Material::WK))
            .set(H8, Some(Material::BK));
        let mut state = PlayState::from_position(position, Color::White);
        state.attempt_move(Move::new(B7, B8));
        let resolved = state.resolve_promotion(Piece::Rook).unwrap();
        assert_eq!(resolved.status, GameStatus::Check(Color::Black));
    }
    #[test]
    fn test_no_pending_promotion() {
        let mut state = PlayState::new();
        let err = state.resolve_promotion(Piece::Queen).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlayError>(),
            Some(PlayError::NoPendingPromotion)
        ));
        assert!(state.cancel_promotion().is_err());
    }
    #[test]
    fn test_cancel_promotion_keeps_pawn() {
        let mut state = promotion_setup();
        state.attempt_move(Move::new(A7, A8));
        assert_eq!(state.cancel_promotion().unwrap(), GameStatus::Ongoing);
        assert_eq!(state.contents(A8), Some(Material::WP));
        assert_eq!(state.phase(), Phase::AwaitingSelection);
        assert!(state.attempt_move(Move::new(H6, H5)).committed);
        // the stuck pawn has nowhere to go and is never offered promotion again
        assert!(state.legal_destinations(A8).is_empty());
    }
    #[test]
    fn test_black_promotion() {
        let position = Position::empty()
            .set(C2, Some(Material::BP))
            .set(E8, Some(Material::BK))
            .set(H3, Some(Material::WK));
        let mut state = PlayState::from_position(position, Color::Black);
        let outcome = state.attempt_move(Move::new(C2, C1));
        assert_eq!(
            outcome.pending_promotion,
            Some(PromotionContext {
                square: C1,
                side: Color::Black
            })
        );
        let resolved = state.resolve_promotion(Piece::Bishop).unwrap();
        assert_eq!(resolved.position.contents(C1), Some(Material::BB));
    }
    #[test]
    fn test_stalemate_ends_game() {
        // Black to move into the canonical stalemate
        let position: Position = "8/8/8/8/k7/8/p7/K7".parse().unwrap();
        let mut state = PlayState::from_position(position, Color::Black);
        let outcome = state.attempt_move(Move::new(A4, A3));
        assert!(outcome.committed);
        assert_eq!(outcome.status, GameStatus::Stalemate);
        assert!(state.is_game_over());
    }
    #[test]
    fn test_reset() {
        let mut state = PlayState::new();
        play(&mut state, &["e2e4", "d7d5", "e4d5"]);
        let version = state.version();
        state.reset();
        assert_eq!(state.position(), &Position::standard());
        assert_eq!(state.turn(), Color::White);
        assert!(state.captured_by(Color::White).is_empty());
        assert!(state.history().is_empty());
        assert_eq!(state.phase(), Phase::AwaitingSelection);
        assert!(state.version() > version);
    }
    #[test]
    fn test_round_trip_restores_arrangement() {
        let mut state = PlayState::new();
        play(&mut state, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert_eq!(state.position(), &Position::standard());
        play(&mut state, &["e2e4", "e7e5", "f1c4", "f8c5", "c4f1", "c5f8"]);
        let expected = Position::standard().with_move(E2, E4).0.with_move(E7, E5).0;
        assert_eq!(state.position(), &expected);
    }
}
