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

//! Chess rules for a casual board
//!
//! A _board_ holds the pieces and knows which moves they may make. The
//! following features are supported:
//!
//! [x] Piece movement for all six piece kinds
//! [x] Refuse moves that leave one's own king attacked
//! [x] Check, checkmate and stalemate detection
//! [x] Pawn promotion with a choice of piece
//! [x] Random-move computer opponent (feature `random`)
//! [ ] Castling
//! [ ] En passant
//! [ ] Draw rules (repetition, fifty moves, insufficient material)
//!
//! Some of the key abstractions include:
//!
//! * A `Square` represents the coordinates for a single square
//!   on an 8-by-8 board. Squares are ordered row by row from Black's
//!   back rank, so `A8` is `(0, 0)` and `H1` is `(7, 7)`.
//!   `Square::from_coords` is where raw `(row, col)` pairs are checked.
//!
//! * A `Mask` is a 64-bit (u64) value in which each bit maps to a
//!   square on the board. Masks hold piece locations and the legal
//!   destinations of a selected piece.
//!
//! * `Material` represents a piece of a specific color. `Piece` is
//!   the kind and `Color` is either `White` or `Black`. `Promotion`
//!   lists the four kinds a pawn may become.
//!
//! * A `Position` is a snapshot of the 64 squares. Positions are never
//!   edited in place by play; `with_move` returns a fresh position,
//!   which is also how candidate moves are tested for self-check.
//!
//! * `LegalMoves` provides the rules as default methods on anything
//!   that can be viewed as a `Position`.
//!
//! * `PlayState` drives a game: selection, moves, captures, promotion
//!   and game over.
//!

mod material;
mod moves;
mod play;
mod position;
#[cfg(feature = "random")]
mod random;
mod square;

pub use material::*;
pub use moves::*;
pub use play::*;
pub use position::*;
#[cfg(feature = "random")]
pub use random::*;
pub use square::*;

pub trait Turn {
    fn turn(&self) -> Color;
}
