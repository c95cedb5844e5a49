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

use chess_common::BOARD_LEN;

use crate::{error::MoveError, piece::Piece};

/// A board coordinate. Both components are always within `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    file: u8,
    rank: u8,
}

impl Coord {
    pub fn new(file: i32, rank: i32) -> Option<Self> {
        let range = 0..BOARD_LEN as i32;
        if range.contains(&file) && range.contains(&rank) {
            Some(Self {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// Parse algebraic notation such as `e4`.
    pub fn parse(text: &str) -> Result<Self, MoveError> {
        let invalid = || MoveError::InvalidSquare(text.to_string());
        let bytes = text.as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }
        let file = i32::from(bytes[0]) - i32::from(b'a');
        let rank = i32::from(bytes[1]) - i32::from(b'1');
        Self::new(file, rank).ok_or_else(invalid)
    }

    pub fn file(self) -> i32 {
        i32::from(self.file)
    }

    pub fn rank(self) -> i32 {
        i32::from(self.rank)
    }

    pub fn offset(self, files: i32, ranks: i32) -> Option<Self> {
        Self::new(self.file() + files, self.rank() + ranks)
    }

    pub(crate) fn from_index(file: usize, rank: usize) -> Self {
        debug_assert!(file < BOARD_LEN && rank < BOARD_LEN);
        Self {
            file: file as u8,
            rank: rank as u8,
        }
    }

    pub(crate) fn index(self) -> (usize, usize) {
        (usize::from(self.file), usize::from(self.rank))
    }

    /// Every square on the board, a1 first.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_LEN as u8)
            .flat_map(|file| (0..BOARD_LEN as u8).map(move |rank| Coord { file, rank }))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", char::from(b'a' + self.file), self.rank + 1)
    }
}

/// A fixed board square. Pieces move by changing occupancy, squares never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square {
    pub coord: Coord,
    pub piece: Option<Piece>,
}
