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

use chess_common::BOARD_LEN;

use crate::{
    piece::{Color, Piece},
    square::{Coord, Square},
};

/// Fixed 8x8 arena of squares, indexed `[file][rank]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Square; BOARD_LEN]; BOARD_LEN],
}

impl Board {
    pub fn empty() -> Self {
        let squares = std::array::from_fn(|file| {
            std::array::from_fn(|rank| Square {
                coord: Coord::from_index(file, rank),
                piece: None,
            })
        });
        Self { squares }
    }

    /// The standard starting position.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        for (color, back, front) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
            let pieces = [
                Piece::rook(color),
                Piece::knight(color),
                Piece::bishop(color),
                Piece::queen(color),
                Piece::king(color),
                Piece::bishop(color),
                Piece::knight(color),
                Piece::rook(color),
            ];
            for (file, piece) in pieces.into_iter().enumerate() {
                let file = file as i32;
                if let Some(coord) = Coord::new(file, back) {
                    board.place(coord, piece);
                }
                if let Some(coord) = Coord::new(file, front) {
                    board.place(coord, Piece::pawn(color));
                }
            }
        }
        board
    }

    pub fn square(&self, coord: Coord) -> &Square {
        let (file, rank) = coord.index();
        &self.squares[file][rank]
    }

    pub fn piece_at(&self, coord: Coord) -> Option<Piece> {
        self.square(coord).piece
    }

    pub fn place(&mut self, coord: Coord, piece: Piece) {
        self.set(coord, Some(piece));
    }

    pub(crate) fn set(&mut self, coord: Coord, piece: Option<Piece>) {
        let (file, rank) = coord.index();
        self.squares[file][rank].piece = piece;
    }

    pub(crate) fn take(&mut self, coord: Coord) -> Option<Piece> {
        let (file, rank) = coord.index();
        self.squares[file][rank].piece.take()
    }

    /// Squares strictly between two squares on a shared rank, file or
    /// diagonal. Empty when the squares are not aligned or are adjacent.
    pub fn squares_between(&self, from: Coord, to: Coord) -> Vec<Coord> {
        let files = to.file() - from.file();
        let ranks = to.rank() - from.rank();
        let aligned = files == 0 || ranks == 0 || files.abs() == ranks.abs();
        if !aligned || (files == 0 && ranks == 0) {
            return Vec::new();
        }

        let (step_file, step_rank) = (files.signum(), ranks.signum());
        let distance = files.abs().max(ranks.abs());
        (1..distance)
            .filter_map(|step| from.offset(step * step_file, step * step_rank))
            .collect()
    }

    pub fn is_path_clear(&self, from: Coord, to: Coord) -> bool {
        self.squares_between(from, to)
            .into_iter()
            .all(|coord| self.piece_at(coord).is_none())
    }

    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        self.squares
            .iter()
            .flatten()
            .filter_map(move |square| match square.piece {
                Some(piece) if piece.color == color => Some((square.coord, piece)),
                _ => None,
            })
    }

    pub fn find_king(&self, color: Color) -> Option<Coord> {
        self.pieces(color)
            .find(|(_, piece)| piece.is_king())
            .map(|(coord, _)| coord)
    }

    /// Squares holding a piece of color `by` that controls `target`.
    pub fn attackers(&self, target: Coord, by: Color) -> Vec<Coord> {
        self.pieces(by)
            .filter(|(coord, piece)| piece.attacks(self, *coord, target))
            .map(|(coord, _)| coord)
            .collect()
    }

    pub fn is_attacked(&self, target: Coord, by: Color) -> bool {
        self.pieces(by)
            .any(|(coord, piece)| piece.attacks(self, coord, target))
    }

    /// Glyph rendering indexed `[file][rank]`, empty strings for empty squares.
    pub fn glyphs(&self) -> Vec<Vec<String>> {
        self.squares
            .iter()
            .map(|file| {
                file.iter()
                    .map(|square| {
                        square
                            .piece
                            .map(|piece| piece.glyph().to_string())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}
