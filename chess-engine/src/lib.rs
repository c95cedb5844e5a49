// Copyright (C) 2026 StarHuntingGames
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Server-authoritative chess rules: board, pieces, move records and the game
//! controller that validates and applies moves.

mod board;
mod error;
mod game;
mod moves;
mod piece;
mod square;

pub use board::Board;
pub use error::MoveError;
pub use game::Game;
pub use moves::{MoveRecord, parse_move_text};
pub use piece::{Color, Piece, PieceKind};
pub use square::{Coord, Square};
