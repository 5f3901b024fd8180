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

use rand::seq::SliceRandom;
use rand::Rng;

use super::material::Color;
use super::moves::{LegalMoves, Move};

/// Picks one of `side`'s check-safe moves uniformly at random, or `None`
/// if it has none.
pub fn choose_move<P, R>(pos: &P, side: Color, rng: &mut R) -> Option<Move>
where
    P: LegalMoves + ?Sized,
    R: Rng + ?Sized,
{
    pos.legal_moves(side).choose(rng).copied()
}
