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

use crate::square::Coord;

/// Why a move was refused. A refused move never changes the game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("couldn't parse move {0:?}")]
    Parse(String),
    #[error("invalid square {0:?}")]
    InvalidSquare(String),
    #[error("wrong turn for player id: {0}")]
    WrongTurn(String),
    #[error("no piece at {0}")]
    NoPieceAtSource(Coord),
    #[error("can't play your opponent's piece")]
    NotYourPiece(Coord),
    #[error("invalid move: {from}-{to}")]
    InvalidMove { from: Coord, to: Coord },
    #[error("invalid move: {from}-{to}, king in check")]
    MoveExposesCheck { from: Coord, to: Coord },
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}
