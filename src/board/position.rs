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
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use strum::IntoEnumIterator;
use thiserror::Error;

use super::material::{Color, Material, Pair, Piece};
use super::square::{Direction, File, Mask, Rank, Square};

use Color::*;
use Piece::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Coordinates ({row}, {col}) are off the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("Not a square: {0:?}")]
    InvalidSquare(String),
    #[error("Invalid piece placement: {0}")]
    InvalidPlacement(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squares([Option<Material>; 64]);

impl Squares {
    fn empty() -> Self {
        Self([None; 64])
    }
}

impl Index<Square> for Squares {
    type Output = Option<Material>;
    fn index(&self, index: Square) -> &Self::Output {
        &self.0[index.to_index()]
    }
}

impl IndexMut<Square> for Squares {
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self.0[index.to_index()]
    }
}

impl From<&Masks> for Squares {
    fn from(masks: &Masks) -> Self {
        let mut squares = Squares::empty();
        for color in Color::iter() {
            for piece in Piece::iter() {
                for square in (masks.pieces[color] & masks.kind(piece)).iter() {
                    squares[square] = Some(Material::new(color, piece));
                }
            }
        }
        squares
    }
}

/// Bitboard view of a position, also used as its serialized form.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Masks {
    pieces: Pair<Mask>,
    kings: Mask,
    queens: Mask,
    rooks: Mask,
    bishops: Mask,
    knights: Mask,
    pawns: Mask,
}

impl Masks {
    fn empty() -> Self {
        Self {
            pieces: Pair::new(Mask::empty(), Mask::empty()),
            kings: Mask::empty(),
            queens: Mask::empty(),
            rooks: Mask::empty(),
            bishops: Mask::empty(),
            knights: Mask::empty(),
            pawns: Mask::empty(),
        }
    }

    fn kind(&self, piece: Piece) -> Mask {
        match piece {
            King => self.kings,
            Queen => self.queens,
            Rook => self.rooks,
            Bishop => self.bishops,
            Knight => self.knights,
            Pawn => self.pawns,
        }
    }

    fn kind_mut(&mut self, piece: Piece) -> &mut Mask {
        match piece {
            King => &mut self.kings,
            Queen => &mut self.queens,
            Rook => &mut self.rooks,
            Bishop => &mut self.bishops,
            Knight => &mut self.knights,
            Pawn => &mut self.pawns,
        }
    }
}

impl From<&Squares> for Masks {
    fn from(value: &Squares) -> Self {
        let mut masks = Masks::empty();
        for square in Square::iter() {
            if let Some(material) = value[square] {
                masks.pieces[material.color()] |= square;
                *masks.kind_mut(material.piece()) |= square;
            }
        }
        masks
    }
}

/// An 8x8 board snapshot.
///
/// A `Position` is a plain value. Rule evaluation only ever reads it;
/// moves produce a new `Position` via [`Position::with_move`] so that
/// hypothetical moves can be simulated without touching the game's board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Masks", into = "Masks")]
pub struct Position {
    squares: Squares,
    masks: Masks,
}

impl Default for Position {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Masks> for Position {
    fn from(masks: Masks) -> Self {
        Self {
            squares: (&masks).into(),
            masks,
        }
    }
}

impl From<Position> for Masks {
    fn from(position: Position) -> Self {
        position.masks
    }
}

impl Position {
    /// A board with no pieces on it.
    pub fn empty() -> Self {
        Self {
            squares: Squares::empty(),
            masks: Masks::empty(),
        }
    }

    /// The standard opening arrangement.
    pub fn standard() -> Self {
        const BACK_RANK: [Piece; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut position = Self::empty();
        for file in File::iter() {
            let piece = BACK_RANK[file.to_index()];
            for color in Color::iter() {
                position.place(Square::new(file, Rank::back_rank(color)), Material::new(color, piece));
                position.place(Square::new(file, Rank::pawn_rank(color)), Material::new(color, Pawn));
            }
        }
        position
    }

    /// Sets the contents of a square. The engine does not police the
    /// result; callers building custom boards are responsible for keeping
    /// one king per side.
    pub fn set(mut self, square: Square, contents: Option<Material>) -> Self {
        match contents {
            Some(material) => {
                self.place(square, material);
            }
            None => {
                self.remove(square);
            }
        }
        self
    }

    /// Returns a new position with the piece on `from` moved to `to`, and
    /// whatever `to` held before. Moving from an empty square leaves the
    /// board unchanged.
    pub fn with_move(&self, from: Square, to: Square) -> (Self, Option<Material>) {
        let mut next = self.clone();
        let captured = match next.remove(from) {
            Some(material) => next.place(to, material),
            None => None,
        };
        (next, captured)
    }

    fn place(&mut self, square: Square, material: Material) -> Option<Material> {
        let replaced = self.remove(square);
        self.squares[square] = Some(material);
        self.masks.pieces[material.color()] |= square;
        *self.masks.kind_mut(material.piece()) |= square;
        replaced
    }

    fn remove(&mut self, square: Square) -> Option<Material> {
        if let Some(material) = self.squares[square] {
            self.squares[square] = None;
            let mask = !square.to_mask();
            self.masks.pieces[material.color()] &= mask;
            *self.masks.kind_mut(material.piece()) &= mask;
            return Some(material);
        }
        None
    }
}

impl Index<Square> for Position {
    type Output = Option<Material>;
    #[inline]
    fn index(&self, index: Square) -> &Self::Output {
        &self.squares[index]
    }
}

impl AsRef<Self> for Position {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl Pos for Position {}

/// Parses the piece-placement field of a FEN record, e.g.
/// `"8/8/8/8/8/k7/p7/K7"`.
impl FromStr for Position {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| BoardError::InvalidPlacement(format!("{reason}: {s:?}"));
        let rows: Vec<&str> = s.split('/').collect();
        if rows.len() != 8 {
            return Err(invalid("expecting 8 rows"));
        }
        let mut position = Self::empty();
        for (row, text) in rows.into_iter().enumerate() {
            let mut col = 0;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    col += skip as usize;
                } else {
                    let material = Material::try_from_char(c).ok_or_else(|| invalid("unknown piece"))?;
                    let square = Square::from_coords(row, col).map_err(|_| invalid("row too long"))?;
                    position.place(square, material);
                    col += 1;
                }
                if col > 8 {
                    return Err(invalid("row too long"));
                }
            }
            if col != 8 {
                return Err(invalid("row too short"));
            }
        }
        Ok(position)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter() {
            for file in File::iter() {
                match self[Square::new(file, rank)] {
                    Some(material) => write!(f, "{}", material)?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Read-only board accessors shared by anything that wraps a position.
pub trait Pos: AsRef<Position> {
    #[inline]
    fn contents(&self, square: Square) -> Option<Material> {
        let pos: &Position = self.as_ref();
        pos.squares[square]
    }
    #[inline]
    fn occupied_by(&self, color: Color) -> Mask {
        let pos: &Position = self.as_ref();
        pos.masks.pieces[color]
    }
    #[inline]
    fn occupied(&self) -> Mask {
        self.occupied_by(White) | self.occupied_by(Black)
    }
    #[inline]
    fn is_vacant(&self, square: Square) -> bool {
        self.contents(square).is_none()
    }
    #[inline]
    fn kings(&self) -> Mask {
        let pos: &Position = self.as_ref();
        pos.masks.kings
    }
    /// The square of `color`'s king, scanning in board order. `None` only
    /// on boards built by hand without one.
    #[inline]
    fn king(&self, color: Color) -> Option<Square> {
        (self.occupied_by(color) & self.kings()).iter().next()
    }
}

#[inline]
pub(super) fn between(from: Square, to: Square) -> Mask {
    let index = from.to_index() * 64 + to.to_index();
    SQUARES_BETWEEN[index]
}

pub(super) static SQUARES_BETWEEN: Lazy<[Mask; 64 * 64]> = Lazy::new(|| {
    // Returns a mask of squares between `start` and `end` (exclusive of both)
    // if they are not equal and in a line. Otherwise returns an empty mask.
    fn squares_between(start: Square, end: Square) -> Mask {
        let mut mask = Mask::empty();
        if let Some(step) = (end - start).to_unit() {
            let mut next = start + step;
            while let Some(square) = next {
                if square == end {
                    break;
                }
                mask |= square;
                next = square + step;
            }
        }
        mask
    }

    let mut array = [Mask::empty(); 64 * 64];
    for start in Square::iter() {
        for end in Square::iter() {
            if start != end && ALL_LINES[start].contains(end) {
                array[start.to_index() * 64 + end.to_index()] = squares_between(start, end);
            }
        }
    }
    array
});

pub(super) static HORIZONTALS: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        let same_file = Square::iter().filter(|s| s.file() == square.file());
        let same_rank = Square::iter().filter(|s| s.rank() == square.rank());
        array[square] = Mask::from_squares(same_file.chain(same_rank));
    }
    array
});

pub(super) static DIAGONALS: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        let mut mask = square.to_mask();
        Direction::diagonals().for_each(|dir| {
            let mut next = square + dir;
            while let Some(sq) = next {
                mask |= sq;
                next = sq + dir;
            }
        });
        array[square] = mask;
    }
    array
});

pub(super) static ALL_LINES: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = HORIZONTALS[square] | DIAGONALS[square];
    }
    array
});

#[cfg(test)]
mod tests {
    use super::*;
    use Square::*;

    #[test]
    fn test_standard_layout() {
        let pos = Position::standard();
        assert_eq!(pos.contents(E1), Some(Material::WK));
        assert_eq!(pos.contents(D8), Some(Material::BQ));
        assert_eq!(pos.contents(A7), Some(Material::BP));
        assert_eq!(pos.contents(H2), Some(Material::WP));
        assert_eq!(pos.contents(E4), None);
        assert_eq!(pos.occupied().len(), 32);
        assert_eq!(pos.king(White), Some(E1));
        assert_eq!(pos.king(Black), Some(E8));
    }
    #[test]
    fn test_standard_matches_fen() {
        let pos: Position = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR".parse().unwrap();
        assert_eq!(pos, Position::standard());
    }
    #[test]
    fn test_invalid_fen() {
        assert!("8/8/8".parse::<Position>().is_err());
        assert!("9/8/8/8/8/8/8/8".parse::<Position>().is_err());
        assert!("7/8/8/8/8/8/8/8".parse::<Position>().is_err());
        assert!("x7/8/8/8/8/8/8/8".parse::<Position>().is_err());
    }
    #[test]
    fn test_with_move_is_copy_on_write() {
        let pos = Position::standard();
        let (next, captured) = pos.with_move(E2, E4);
        assert_eq!(captured, None);
        assert_eq!(next.contents(E4), Some(Material::WP));
        assert!(next.is_vacant(E2));
        // the source position is untouched
        assert_eq!(pos.contents(E2), Some(Material::WP));
        assert!(pos.is_vacant(E4));
    }
    #[test]
    fn test_with_move_reports_capture() {
        let pos = Position::empty()
            .set(D4, Some(Material::WR))
            .set(D7, Some(Material::BN));
        let (next, captured) = pos.with_move(D4, D7);
        assert_eq!(captured, Some(Material::BN));
        assert_eq!(next.occupied_by(Black), Mask::empty());
        assert_eq!(next.occupied_by(White), D7.to_mask());
    }
    #[test]
    fn test_set_replaces_contents() {
        let pos = Position::standard().set(E2, Some(Material::BQ)).set(D1, None);
        assert_eq!(pos.contents(E2), Some(Material::BQ));
        assert!(pos.is_vacant(D1));
        assert_eq!(pos.occupied_by(White).len(), 14);
        assert_eq!(pos.occupied_by(Black).len(), 17);
    }
    #[test]
    fn test_display_diagram() {
        let text = Position::standard().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "rnbqkbnr");
        assert_eq!(lines[4], "........");
        assert_eq!(lines[7], "RNBQKBNR");
    }
    #[test]
    fn test_serde_round_trip() {
        let pos = Position::standard().with_move(G1, F3).0;
        let json = serde_json::to_string(&pos).unwrap();
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pos);
    }
    #[test]
    fn test_diagonals() {
        let mask = DIAGONALS[C5];
        assert!(mask.contains(C5));
        assert!(mask.contains(A3));
        assert!(mask.contains(A7));
        assert!(mask.contains(F8));
        assert!(mask.contains(G1));
        assert!(!mask.contains(C6));
        assert!(!mask.contains(B5));
    }
    #[test]
    fn test_horizontals() {
        let mask = HORIZONTALS[G2];
        assert!(mask.contains(G1));
        assert!(mask.contains(G8));
        assert!(mask.contains(A2));
        assert!(!mask.contains(H1));
        assert!(!mask.contains(F3));
    }
    #[test]
    fn test_between_a3_and_e3() {
        let mask = between(A3, E3);
        assert_eq!(mask, Mask::from_squares([B3, C3, D3]));
        assert_eq!(between(E3, A3), mask);
    }
    #[test]
    fn test_between_diagonal() {
        assert_eq!(between(H4, E1), Mask::from_squares([G3, F2]));
    }
    #[test]
    fn test_between_adjacent_or_off_line() {
        assert!(between(E2, E3).is_empty());
        assert!(between(G1, F3).is_empty());
    }
}
