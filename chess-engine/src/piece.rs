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

use crate::{board::Board, square::Coord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Rank delta of a pawn advance.
    pub fn forward(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn home_rank(self) -> i32 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn promotion_rank(self) -> i32 {
        self.opposite().home_rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn { moved: bool, double_stepped: bool },
    Knight,
    Bishop,
    Rook { moved: bool },
    Queen,
    King { moved: bool, in_check: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn pawn(color: Color) -> Self {
        Self {
            color,
            kind: PieceKind::Pawn {
                moved: false,
                double_stepped: false,
            },
        }
    }

    pub fn knight(color: Color) -> Self {
        Self {
            color,
            kind: PieceKind::Knight,
        }
    }

    pub fn bishop(color: Color) -> Self {
        Self {
            color,
            kind: PieceKind::Bishop,
        }
    }

    pub fn rook(color: Color) -> Self {
        Self {
            color,
            kind: PieceKind::Rook { moved: false },
        }
    }

    pub fn queen(color: Color) -> Self {
        Self {
            color,
            kind: PieceKind::Queen,
        }
    }

    pub fn king(color: Color) -> Self {
        Self {
            color,
            kind: PieceKind::King {
                moved: false,
                in_check: false,
            },
        }
    }

    pub fn is_pawn(&self) -> bool {
        matches!(self.kind, PieceKind::Pawn { .. })
    }

    pub fn is_king(&self) -> bool {
        matches!(self.kind, PieceKind::King { .. })
    }

    pub fn is_slider(&self) -> bool {
        matches!(
            self.kind,
            PieceKind::Bishop | PieceKind::Rook { .. } | PieceKind::Queen
        )
    }

    pub fn has_moved(&self) -> bool {
        match self.kind {
            PieceKind::Pawn { moved, .. }
            | PieceKind::Rook { moved }
            | PieceKind::King { moved, .. } => moved,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Queen => false,
        }
    }

    /// The piece as it stands after making a move of `ranks` ranks.
    pub(crate) fn after_move(self, ranks: i32) -> Self {
        let kind = match self.kind {
            PieceKind::Pawn { .. } => PieceKind::Pawn {
                moved: true,
                double_stepped: ranks.abs() == 2,
            },
            PieceKind::Rook { .. } => PieceKind::Rook { moved: true },
            PieceKind::King { .. } => PieceKind::King {
                moved: true,
                in_check: false,
            },
            other => other,
        };
        Self { kind, ..self }
    }

    pub fn glyph(&self) -> &'static str {
        match (self.color, self.kind) {
            (Color::White, PieceKind::Pawn { .. }) => "♟",
            (Color::White, PieceKind::Rook { .. }) => "♜",
            (Color::White, PieceKind::Knight) => "♞",
            (Color::White, PieceKind::Bishop) => "♝",
            (Color::White, PieceKind::Queen) => "♛",
            (Color::White, PieceKind::King { .. }) => "♚",
            (Color::Black, PieceKind::Pawn { .. }) => "♙",
            (Color::Black, PieceKind::Rook { .. }) => "♖",
            (Color::Black, PieceKind::Knight) => "♘",
            (Color::Black, PieceKind::Bishop) => "♗",
            (Color::Black, PieceKind::Queen) => "♕",
            (Color::Black, PieceKind::King { .. }) => "♔",
        }
    }

    /// Pseudo-legal reachability: the movement pattern holds and the
    /// destination is not held by a friendly piece. Self-check is not
    /// considered, nor are en passant and castling.
    pub fn can_reach(&self, board: &Board, from: Coord, to: Coord) -> bool {
        if from == to {
            return false;
        }
        let target = board.piece_at(to);
        if target.is_some_and(|piece| piece.color == self.color) {
            return false;
        }

        let PieceKind::Pawn { moved, .. } = self.kind else {
            return self.attacks(board, from, to);
        };

        let files = to.file() - from.file();
        let ranks = to.rank() - from.rank();
        let forward = self.color.forward();
        if files == 0 {
            if target.is_some() {
                return false;
            }
            if ranks == forward {
                return true;
            }
            return ranks == 2 * forward
                && !moved
                && from
                    .offset(0, forward)
                    .is_some_and(|middle| board.piece_at(middle).is_none());
        }
        files.abs() == 1 && ranks == forward && target.is_some()
    }

    /// Whether this piece standing on `from` controls `to`, regardless of
    /// what occupies `to`. Pawns control their forward diagonals only.
    pub fn attacks(&self, board: &Board, from: Coord, to: Coord) -> bool {
        if from == to {
            return false;
        }
        let files = (to.file() - from.file()).abs();
        let ranks = to.rank() - from.rank();
        let straight = files == 0 || ranks == 0;
        let diagonal = files == ranks.abs();

        match self.kind {
            PieceKind::Pawn { .. } => files == 1 && ranks == self.color.forward(),
            PieceKind::Knight => matches!((files, ranks.abs()), (1, 2) | (2, 1)),
            PieceKind::Bishop => diagonal && board.is_path_clear(from, to),
            PieceKind::Rook { .. } => straight && board.is_path_clear(from, to),
            PieceKind::Queen => (straight || diagonal) && board.is_path_clear(from, to),
            PieceKind::King { .. } => files.max(ranks.abs()) == 1,
        }
    }
}
