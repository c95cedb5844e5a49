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

use std::fmt;

use chess_common::PlayerId;

use crate::{error::MoveError, piece::Piece, square::Coord};

/// One accepted ply. Records are only ever appended to a game's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub player_id: PlayerId,
    pub from: Coord,
    pub to: Coord,
    /// The piece as it stood before moving.
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promoted_to: Option<Piece>,
    pub is_castling: bool,
    pub is_en_passant: bool,
    pub is_promotion: bool,
    pub is_check_giving: bool,
    pub is_initial_two_step: bool,
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Parse the fixed `xx-yy` move text, e.g. `e2-e4`.
pub fn parse_move_text(text: &str) -> Result<(Coord, Coord), MoveError> {
    let parse_error = || MoveError::Parse(text.to_string());
    if text.len() != 5 || text.as_bytes()[2] != b'-' {
        return Err(parse_error());
    }
    let (Some(from), Some(to)) = (text.get(0..2), text.get(3..5)) else {
        return Err(parse_error());
    };
    let from = Coord::parse(from).map_err(|_| parse_error())?;
    let to = Coord::parse(to).map_err(|_| parse_error())?;
    Ok((from, to))
}
