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

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use thiserror::Error;

use super::material::{is_opponent, Color, Material, Piece};
use super::play::GameStatus;
use super::position::{between, Pos, Position};
use super::position::{ALL_LINES, DIAGONALS, HORIZONTALS};
use super::square::{Direction, Mask, Offset, Rank, Square};

use Color::*;
use Piece::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Not a legal move")]
    InvalidMove,
    #[error("Not a move in coordinate notation: {0:?}")]
    InvalidNotation(String),
}

/// A move of whatever stands on `from` to `to`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Parses coordinate notation such as `"e2e4"`.
impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MoveError::InvalidNotation(s.to_string());
        if s.len() != 4 || !s.is_ascii() {
            return Err(invalid());
        }
        let from = s[..2].parse().map_err(|_| invalid())?;
        let to = s[2..].parse().map_err(|_| invalid())?;
        Ok(Self::new(from, to))
    }
}

/// Move legality, check and terminal-state detection over a position.
///
/// Every method is a pure function of the board. Whose turn it is does
/// not matter here: the side is always given explicitly, or taken from
/// the piece being moved.
pub trait LegalMoves: AsRef<Position> {
    /// True if no square strictly between `from` and `to` is occupied.
    /// Only meaningful for squares on a common rank, file or diagonal.
    fn is_path_clear(&self, from: Square, to: Square) -> bool {
        let pos: &Position = self.as_ref();
        (between(from, to) & pos.occupied()).is_empty()
    }

    /// True if `material` standing on `from` may move to `to` according
    /// to its movement pattern and the occupancy of the board. King
    /// safety is not considered.
    fn is_legal_geometry(&self, material: Material, from: Square, to: Square) -> bool {
        let pos: &Position = self.as_ref();
        let side = material.color();
        if from == to {
            return false;
        }
        if matches!(pos.contents(to), Some(target) if target.color() == side) {
            return false;
        }
        match material.piece() {
            Pawn => self.is_pawn_geometry(side, from, to),
            Knight => KNIGHT_MOVES[from].contains(to),
            Bishop => BISHOP_MOVES[from].contains(to) && self.is_path_clear(from, to),
            Rook => ROOK_MOVES[from].contains(to) && self.is_path_clear(from, to),
            Queen => QUEEN_MOVES[from].contains(to) && self.is_path_clear(from, to),
            King => KING_MOVES[from].contains(to),
        }
    }

    #[doc(hidden)]
    fn is_pawn_geometry(&self, side: Color, from: Square, to: Square) -> bool {
        let pos: &Position = self.as_ref();
        let forward: isize = match side {
            White => -1,
            Black => 1,
        };
        let Offset { x, y } = to - from;
        if x == 0 && y == forward {
            return pos.is_vacant(to);
        }
        if x == 0 && y == 2 * forward {
            return from.rank() == Rank::pawn_rank(side)
                && pos.is_vacant(to)
                && self.is_path_clear(from, to);
        }
        if x.abs() == 1 && y == forward {
            return is_opponent(pos.contents(to), side);
        }
        false
    }

    /// True if `side`'s king is attacked by any opposing piece. A board
    /// without a king for `side` is never in check.
    fn is_in_check(&self, side: Color) -> bool {
        let pos: &Position = self.as_ref();
        let Some(king) = pos.king(side) else {
            return false;
        };
        pos.occupied_by(!side).iter().any(|from| {
            pos.contents(from)
                .is_some_and(|material| self.is_legal_geometry(material, from, king))
        })
    }

    /// True if the piece on `mv.from` may legally make `mv` without
    /// leaving its own king in check.
    fn is_check_safe(&self, mv: Move) -> bool {
        let pos: &Position = self.as_ref();
        let Some(material) = pos.contents(mv.from) else {
            return false;
        };
        if !self.is_legal_geometry(material, mv.from, mv.to) {
            return false;
        }
        let (next, _) = pos.with_move(mv.from, mv.to);
        !next.is_in_check(material.color())
    }

    /// All check-safe destinations for the piece on `from`.
    fn legal_destinations(&self, from: Square) -> Mask {
        Mask::from_squares(Square::iter().filter(|&to| self.is_check_safe(Move::new(from, to))))
    }

    /// Every check-safe move available to `side`, in board order.
    fn legal_moves(&self, side: Color) -> Vec<Move> {
        let pos: &Position = self.as_ref();
        pos.occupied_by(side)
            .iter()
            .flat_map(|from| self.legal_destinations(from).iter().map(move |to| Move::new(from, to)))
            .collect()
    }

    /// True as soon as one check-safe move is found for `side`.
    fn has_any_legal_move(&self, side: Color) -> bool {
        let pos: &Position = self.as_ref();
        pos.occupied_by(side).iter().any(|from| {
            Square::iter().any(|to| self.is_check_safe(Move::new(from, to)))
        })
    }

    fn is_checkmate(&self, side: Color) -> bool {
        self.is_in_check(side) && !self.has_any_legal_move(side)
    }

    fn is_stalemate(&self, side: Color) -> bool {
        !self.is_in_check(side) && !self.has_any_legal_move(side)
    }

    /// Classifies the position with `side` to move. Check and move
    /// availability are each evaluated once.
    fn status(&self, side: Color) -> GameStatus {
        let in_check = self.is_in_check(side);
        let can_move = self.has_any_legal_move(side);
        match (in_check, can_move) {
            (true, false) => GameStatus::Checkmate(!side),
            (false, false) => GameStatus::Stalemate,
            (true, true) => GameStatus::Check(side),
            (false, true) => GameStatus::Ongoing,
        }
    }
}

impl LegalMoves for Position {}

static KING_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = Mask::from_squares(Direction::iter().filter_map(|dir| square + dir));
    }
    array
});

static QUEEN_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = !square.to_mask() & ALL_LINES[square];
    }
    array
});

static ROOK_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = !square.to_mask() & HORIZONTALS[square];
    }
    array
});

static BISHOP_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = !square.to_mask() & DIAGONALS[square];
    }
    array
});

static KNIGHT_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| {
    const OFFSETS: [Offset; 8] = [
        Offset::new(-2, -1),
        Offset::new(-2, 1),
        Offset::new(2, -1),
        Offset::new(2, 1),
        Offset::new(-1, -2),
        Offset::new(-1, 2),
        Offset::new(1, -2),
        Offset::new(1, 2),
    ];
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] =
            Mask::from_squares(OFFSETS.into_iter().filter_map(|offset| square + offset));
    }
    array
});
