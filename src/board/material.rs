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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut, Not};
use std::str::FromStr;
use strum_macros::Display;
use strum_macros::EnumIter;

use super::play::PlayError;

/// A piece of a specific color.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    color: Color,
    piece: Piece,
}

impl Material {
    pub const WK: Self = Self::new(White, King);
    pub const WQ: Self = Self::new(White, Queen);
    pub const WR: Self = Self::new(White, Rook);
    pub const WB: Self = Self::new(White, Bishop);
    pub const WN: Self = Self::new(White, Knight);
    pub const WP: Self = Self::new(White, Pawn);

    pub const BK: Self = Self::new(Black, King);
    pub const BQ: Self = Self::new(Black, Queen);
    pub const BR: Self = Self::new(Black, Rook);
    pub const BB: Self = Self::new(Black, Bishop);
    pub const BN: Self = Self::new(Black, Knight);
    pub const BP: Self = Self::new(Black, Pawn);

    #[inline]
    pub const fn new(color: Color, piece: Piece) -> Self {
        Self { color, piece }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// FEN letter: uppercase for White, lowercase for Black.
    pub fn to_char(&self) -> char {
        let c = match self.piece {
            Pawn => 'p',
            Knight => 'n',
            Bishop => 'b',
            Rook => 'r',
            Queen => 'q',
            King => 'k',
        };
        match self.color {
            White => c.to_ascii_uppercase(),
            Black => c,
        }
    }

    pub fn try_from_char(c: char) -> Option<Self> {
        let piece = match c.to_ascii_lowercase() {
            'p' => Pawn,
            'n' => Knight,
            'b' => Bishop,
            'r' => Rook,
            'q' => Queen,
            'k' => King,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() { White } else { Black };
        Some(Self::new(color, piece))
    }

    /// Unicode chess glyph, for renderers that draw text pieces.
    pub fn symbol(&self) -> char {
        const GLYPHS: [[char; 6]; 2] = [
            ['♙', '♘', '♗', '♖', '♕', '♔'],
            ['♟', '♞', '♝', '♜', '♛', '♚'],
        ];
        GLYPHS[self.color.to_index()][self.piece.to_index()]
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Side owning `material`.
#[inline]
pub fn side_of(material: Material) -> Color {
    material.color()
}

/// Category of `material`.
#[inline]
pub fn kind_of(material: Material) -> Piece {
    material.piece()
}

/// True if `contents` holds a piece belonging to the side opposing `side`.
/// Empty squares are never opponents.
#[inline]
pub fn is_opponent(contents: Option<Material>, side: Color) -> bool {
    matches!(contents, Some(material) if material.color() != side)
}

use Color::{Black, White};

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const fn to_index(&self) -> usize {
        *self as usize
    }
}

impl Not for Color {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        match self {
            White => Black,
            Black => White,
        }
    }
}

/// One value per side.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pair<T>((T, T));

impl<T> Pair<T> {
    pub const fn new(white: T, black: T) -> Self {
        Self((white, black))
    }
    pub fn white(&self) -> &T {
        &self.0 .0
    }
    pub fn white_mut(&mut self) -> &mut T {
        &mut self.0 .0
    }
    pub fn black(&self) -> &T {
        &self.0 .1
    }
    pub fn black_mut(&mut self) -> &mut T {
        &mut self.0 .1
    }
}

impl<T> Index<Color> for Pair<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        match index {
            White => self.white(),
            Black => self.black(),
        }
    }
}

impl<T> IndexMut<Color> for Pair<T> {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        match index {
            White => self.white_mut(),
            Black => self.black_mut(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}
use Piece::{Bishop, King, Knight, Pawn, Queen, Rook};

impl Piece {
    pub fn to_index(&self) -> usize {
        *self as usize
    }
    pub fn is_pawn(&self) -> bool {
        matches!(*self, Pawn)
    }
}

/// The pieces a pawn may become on the last rank.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl From<Promotion> for Piece {
    fn from(value: Promotion) -> Self {
        match value {
            Promotion::Queen => Queen,
            Promotion::Rook => Rook,
            Promotion::Bishop => Bishop,
            Promotion::Knight => Knight,
        }
    }
}

impl TryFrom<Piece> for Promotion {
    type Error = PlayError;

    fn try_from(value: Piece) -> Result<Self, Self::Error> {
        match value {
            Queen => Ok(Promotion::Queen),
            Rook => Ok(Promotion::Rook),
            Bishop => Ok(Promotion::Bishop),
            Knight => Ok(Promotion::Knight),
            King | Pawn => Err(PlayError::InvalidPromotion(value.to_string())),
        }
    }
}

/// Accepts the letters offered by the promotion prompt: `Q`, `R`, `B`, `N`.
impl FromStr for Promotion {
    type Err = PlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Q" | "q" => Ok(Promotion::Queen),
            "R" | "r" => Ok(Promotion::Rook),
            "B" | "b" => Ok(Promotion::Bishop),
            "N" | "n" => Ok(Promotion::Knight),
            _ => Err(PlayError::InvalidPromotion(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_classifier() {
        assert_eq!(side_of(Material::BQ), Color::Black);
        assert_eq!(kind_of(Material::WN), Piece::Knight);
        assert!(is_opponent(Some(Material::BP), Color::White));
        assert!(!is_opponent(Some(Material::WP), Color::White));
        assert!(!is_opponent(None, Color::White));
        assert!(!is_opponent(None, Color::Black));
    }
    #[test]
    fn test_fen_letters() {
        assert_eq!(Material::WK.to_char(), 'K');
        assert_eq!(Material::BN.to_char(), 'n');
        assert_eq!(Material::try_from_char('q'), Some(Material::BQ));
        assert_eq!(Material::try_from_char('P'), Some(Material::WP));
        assert_eq!(Material::try_from_char('x'), None);
    }
    #[test]
    fn test_symbols() {
        assert_eq!(Material::WK.symbol(), '♔');
        assert_eq!(Material::BP.symbol(), '♟');
    }
    #[test]
    fn test_promotion_choices() {
        assert_eq!("Q".parse::<Promotion>().unwrap(), Promotion::Queen);
        assert_eq!("n".parse::<Promotion>().unwrap(), Promotion::Knight);
        assert!("K".parse::<Promotion>().is_err());
        assert!(Promotion::try_from(Piece::King).is_err());
        assert!(Promotion::try_from(Piece::Pawn).is_err());
        assert_eq!(Piece::from(Promotion::Rook), Piece::Rook);
    }
}
