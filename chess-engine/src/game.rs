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

use chess_common::{GameStateSnapshot, GameStatus, PlayerId};

use crate::{
    board::Board,
    error::MoveError,
    moves::MoveRecord,
    piece::{Color, Piece, PieceKind},
    square::Coord,
};

/// A single match: two players (index 0 is white), the board, the side to
/// move, the accepted moves and the outcome.
#[derive(Debug, Clone)]
pub struct Game {
    player_ids: [PlayerId; 2],
    board: Board,
    turn: Color,
    history: Vec<MoveRecord>,
    status: GameStatus,
    king_squares: [Coord; 2],
}

/// A fully validated move applied to a copy of the board.
struct Plan {
    board: Board,
    piece: Piece,
    captured: Option<Piece>,
    promoted_to: Option<Piece>,
    is_castling: bool,
    is_en_passant: bool,
    is_initial_two_step: bool,
    king_square: Coord,
}

impl Game {
    pub fn new(white: impl Into<PlayerId>, black: impl Into<PlayerId>) -> Self {
        Self {
            player_ids: [white.into(), black.into()],
            board: Board::standard(),
            turn: Color::White,
            history: Vec::new(),
            status: GameStatus::Active,
            king_squares: [Coord::from_index(4, 0), Coord::from_index(4, 7)],
        }
    }

    /// Start a game from an arbitrary position. Each side needs exactly one
    /// king and the side not on turn must not be in check. The status is
    /// evaluated immediately, so a position without legal moves is finished.
    pub fn from_position(
        white: impl Into<PlayerId>,
        black: impl Into<PlayerId>,
        mut board: Board,
        turn: Color,
    ) -> Result<Self, MoveError> {
        let mut king_squares = [Coord::from_index(0, 0); 2];
        for color in [Color::White, Color::Black] {
            let kings: Vec<Coord> = board
                .pieces(color)
                .filter(|(_, piece)| piece.is_king())
                .map(|(coord, _)| coord)
                .collect();
            let [king] = kings[..] else {
                return Err(MoveError::InvalidPosition(format!(
                    "{color:?} must have exactly one king"
                )));
            };
            king_squares[color.index()] = king;
        }

        let waiting = turn.opposite();
        if board.is_attacked(king_squares[waiting.index()], turn) {
            return Err(MoveError::InvalidPosition(format!(
                "{waiting:?} is in check but not on turn"
            )));
        }

        let in_check = board.is_attacked(king_squares[turn.index()], waiting);
        mark_check(&mut board, king_squares[turn.index()], in_check);

        let mut game = Self {
            player_ids: [white.into(), black.into()],
            board,
            turn,
            history: Vec::new(),
            status: GameStatus::Active,
            king_squares,
        };
        game.status = game.evaluate(turn, in_check, None);
        Ok(game)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn is_white_turn(&self) -> bool {
        self.turn == Color::White
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Accepted moves in `xx-yy` form, oldest first.
    pub fn moves(&self) -> Vec<String> {
        self.history.iter().map(ToString::to_string).collect()
    }

    pub fn white_player(&self) -> &str {
        &self.player_ids[Color::White.index()]
    }

    pub fn black_player(&self) -> &str {
        &self.player_ids[Color::Black.index()]
    }

    pub fn side_of(&self, player_id: &str) -> Option<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|color| self.player_ids[color.index()] == player_id)
    }

    pub fn snapshot(&self) -> GameStateSnapshot {
        GameStateSnapshot {
            status: self.status,
            board: self.board.glyphs(),
            is_white_turn: self.is_white_turn(),
        }
    }

    /// Validate and apply a move given in algebraic squares, e.g. `e2`, `e4`.
    /// A refused move leaves the game untouched.
    pub fn make_move(
        &mut self,
        player_id: &str,
        from: &str,
        to: &str,
    ) -> Result<MoveRecord, MoveError> {
        self.check_turn(player_id)?;
        let from = Coord::parse(from)?;
        let to = Coord::parse(to)?;
        self.play(player_id, from, to)
    }

    pub fn play(
        &mut self,
        player_id: &str,
        from: Coord,
        to: Coord,
    ) -> Result<MoveRecord, MoveError> {
        let color = self.check_turn(player_id)?;

        let captures_king = self
            .board
            .piece_at(to)
            .is_some_and(|target| target.color != color && target.is_king());
        debug_assert!(
            !captures_king,
            "a king is never left capturable once legal moves are enforced"
        );

        let plan = if captures_king {
            self.plan_king_capture(color, from, to)?
        } else {
            self.plan_move(color, from, to, self.history.last())?
        };
        Ok(self.commit(player_id, color, from, to, plan, captures_king))
    }

    fn check_turn(&self, player_id: &str) -> Result<Color, MoveError> {
        // A finished game has no side on turn.
        if self.is_over() || self.player_ids[self.turn.index()] != player_id {
            return Err(MoveError::WrongTurn(player_id.to_string()));
        }
        Ok(self.turn)
    }

    fn commit(
        &mut self,
        player_id: &str,
        color: Color,
        from: Coord,
        to: Coord,
        plan: Plan,
        captures_king: bool,
    ) -> MoveRecord {
        self.board = plan.board;
        self.king_squares[color.index()] = plan.king_square;
        mark_check(&mut self.board, plan.king_square, false);

        let mut record = MoveRecord {
            player_id: player_id.to_string(),
            from,
            to,
            piece: plan.piece,
            captured: plan.captured,
            promoted_to: plan.promoted_to,
            is_castling: plan.is_castling,
            is_en_passant: plan.is_en_passant,
            is_promotion: plan.promoted_to.is_some(),
            is_check_giving: false,
            is_initial_two_step: plan.is_initial_two_step,
        };

        self.turn = color.opposite();
        self.status = if captures_king {
            mated_by(color)
        } else {
            let king = self.king_squares[self.turn.index()];
            let in_check = self.board.is_attacked(king, color);
            mark_check(&mut self.board, king, in_check);
            record.is_check_giving = in_check;
            self.evaluate(self.turn, in_check, Some(&record))
        };

        self.history.push(record.clone());
        record
    }

    /// Status of the game with `side` to move.
    fn evaluate(&self, side: Color, in_check: bool, last: Option<&MoveRecord>) -> GameStatus {
        if in_check {
            if self.is_checkmate(side, last) {
                return mated_by(side.opposite());
            }
        } else if !self.has_legal_move(side, last) {
            return GameStatus::Stalemate;
        }
        GameStatus::Active
    }

    /// Check the pseudo-legal pattern, the special moves and king safety for
    /// one move of `color`, on a copy of the board.
    fn plan_move(
        &self,
        color: Color,
        from: Coord,
        to: Coord,
        last: Option<&MoveRecord>,
    ) -> Result<Plan, MoveError> {
        let piece = self
            .board
            .piece_at(from)
            .ok_or(MoveError::NoPieceAtSource(from))?;
        if piece.color != color {
            return Err(MoveError::NotYourPiece(from));
        }

        match piece.kind {
            PieceKind::King { .. } if is_castling_geometry(from, to) => {
                self.plan_castling(piece, from, to)
            }
            PieceKind::Pawn { .. } if !piece.can_reach(&self.board, from, to) => {
                match self.en_passant_victim(piece, from, to, last) {
                    Some(victim) => self.plan_relocation(piece, from, to, Some(victim)),
                    None => Err(MoveError::InvalidMove { from, to }),
                }
            }
            _ if piece.can_reach(&self.board, from, to) => {
                self.plan_relocation(piece, from, to, None)
            }
            _ => Err(MoveError::InvalidMove { from, to }),
        }
    }

    fn plan_relocation(
        &self,
        piece: Piece,
        from: Coord,
        to: Coord,
        en_passant_victim: Option<Coord>,
    ) -> Result<Plan, MoveError> {
        let mut board = self.board.clone();
        board.set(from, None);
        let captured = match en_passant_victim {
            Some(victim) => board.take(victim),
            None => board.piece_at(to),
        };

        let ranks = to.rank() - from.rank();
        let promoted_to = (piece.is_pawn() && to.rank() == piece.color.promotion_rank())
            .then(|| Piece::queen(piece.color));
        board.place(to, promoted_to.unwrap_or_else(|| piece.after_move(ranks)));

        let king_square = if piece.is_king() {
            to
        } else {
            self.king_squares[piece.color.index()]
        };
        if board.is_attacked(king_square, piece.color.opposite()) {
            return Err(MoveError::MoveExposesCheck { from, to });
        }

        Ok(Plan {
            board,
            piece,
            captured,
            promoted_to,
            is_castling: false,
            is_en_passant: en_passant_victim.is_some(),
            is_initial_two_step: piece.is_pawn() && ranks.abs() == 2,
            king_square,
        })
    }

    /// The pawn removed by an en passant capture, if `from`-`to` is one. Only
    /// the immediately preceding move can open en passant.
    fn en_passant_victim(
        &self,
        pawn: Piece,
        from: Coord,
        to: Coord,
        last: Option<&MoveRecord>,
    ) -> Option<Coord> {
        let last = last?;
        let diagonal_step =
            (to.file() - from.file()).abs() == 1 && to.rank() - from.rank() == pawn.color.forward();
        let lands_behind = last.to.file() == to.file() && last.to.rank() == from.rank();
        let victim_is_pawn = self
            .board
            .piece_at(last.to)
            .is_some_and(|piece| piece.is_pawn() && piece.color != pawn.color);

        (diagonal_step
            && lands_behind
            && victim_is_pawn
            && last.is_initial_two_step
            && self.board.piece_at(to).is_none())
        .then_some(last.to)
    }

    /// The king moves onto its own rook's square to castle; it lands on the
    /// c or g file and the rook on the d or f file.
    fn plan_castling(&self, king: Piece, from: Coord, to: Coord) -> Result<Plan, MoveError> {
        let invalid = MoveError::InvalidMove { from, to };
        let enemy = king.color.opposite();

        let rook = self
            .board
            .piece_at(to)
            .filter(|piece| piece.color == king.color)
            .filter(|piece| matches!(piece.kind, PieceKind::Rook { moved: false }))
            .ok_or_else(|| invalid.clone())?;
        if king.has_moved()
            || !self.board.is_path_clear(from, to)
            || self.board.is_attacked(from, enemy)
        {
            return Err(invalid);
        }

        let (king_file, rook_file) = if to.file() == 7 { (6, 5) } else { (2, 3) };
        let king_to = Coord::new(king_file, from.rank()).ok_or_else(|| invalid.clone())?;
        let rook_to = Coord::new(rook_file, from.rank()).ok_or_else(|| invalid.clone())?;

        let mut transit = self.board.squares_between(from, king_to);
        transit.push(king_to);
        if transit
            .into_iter()
            .any(|coord| self.board.is_attacked(coord, enemy))
        {
            return Err(invalid);
        }

        let mut board = self.board.clone();
        board.set(from, None);
        board.set(to, None);
        board.place(king_to, king.after_move(0));
        board.place(rook_to, rook.after_move(0));

        Ok(Plan {
            board,
            piece: king,
            captured: None,
            promoted_to: None,
            is_castling: true,
            is_en_passant: false,
            is_initial_two_step: false,
            king_square: king_to,
        })
    }

    fn plan_king_capture(&self, color: Color, from: Coord, to: Coord) -> Result<Plan, MoveError> {
        let piece = self
            .board
            .piece_at(from)
            .ok_or(MoveError::NoPieceAtSource(from))?;
        if piece.color != color {
            return Err(MoveError::NotYourPiece(from));
        }

        let mut board = self.board.clone();
        board.set(from, None);
        let captured = board.take(to);
        board.place(to, piece.after_move(to.rank() - from.rank()));

        Ok(Plan {
            board,
            piece,
            captured,
            promoted_to: None,
            is_castling: false,
            is_en_passant: false,
            is_initial_two_step: false,
            king_square: if piece.is_king() {
                to
            } else {
                self.king_squares[color.index()]
            },
        })
    }

    /// `side` is in check. It is mate unless the king can step to safety, or
    /// a single checker can be captured or, for sliders, blocked.
    fn is_checkmate(&self, side: Color, last: Option<&MoveRecord>) -> bool {
        let king = self.king_squares[side.index()];
        let enemy = side.opposite();

        let has_flight = (-1..=1)
            .flat_map(|files| (-1..=1).map(move |ranks| (files, ranks)))
            .filter_map(|(files, ranks)| king.offset(files, ranks))
            .any(|escape| self.plan_move(side, king, escape, last).is_ok());
        if has_flight {
            return false;
        }

        let checkers = self.board.attackers(king, enemy);
        let [checker] = checkers[..] else {
            return !checkers.is_empty();
        };
        let Some(checking_piece) = self.board.piece_at(checker) else {
            return false;
        };

        let mut answers = vec![checker];
        if checking_piece.is_slider() {
            answers.extend(self.board.squares_between(checker, king));
        }
        if checking_piece.is_pawn()
            && let Some(last) = last
            && last.is_initial_two_step
            && last.to == checker
            && let Some(skipped) = checker.offset(0, -enemy.forward())
        {
            answers.push(skipped);
        }

        let defenders: Vec<Coord> = self
            .board
            .pieces(side)
            .filter(|(_, piece)| !piece.is_king())
            .map(|(coord, _)| coord)
            .collect();
        let answered = defenders.iter().any(|from| {
            answers
                .iter()
                .any(|to| self.plan_move(side, *from, *to, last).is_ok())
        });
        !answered
    }

    /// Exhaustive search for any legal move of `side`.
    fn has_legal_move(&self, side: Color, last: Option<&MoveRecord>) -> bool {
        let origins: Vec<Coord> = self.board.pieces(side).map(|(coord, _)| coord).collect();
        origins.into_iter().any(|from| {
            Coord::all().any(|to| self.plan_move(side, from, to, last).is_ok())
        })
    }
}

fn is_castling_geometry(from: Coord, to: Coord) -> bool {
    from.file() == 4 && from.rank() == to.rank() && (to.file() == 0 || to.file() == 7)
}

/// Status when `winner` has delivered mate.
fn mated_by(winner: Color) -> GameStatus {
    match winner {
        Color::White => GameStatus::WhiteCheckmate,
        Color::Black => GameStatus::BlackCheckmate,
    }
}

fn mark_check(board: &mut Board, king: Coord, in_check: bool) {
    if let Some(mut piece) = board.piece_at(king)
        && let PieceKind::King { moved, .. } = piece.kind
    {
        piece.kind = PieceKind::King { moved, in_check };
        board.place(king, piece);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: &str = "white-player";
    const BLACK: &str = "black-player";

    fn at(text: &str) -> Coord {
        Coord::parse(text).unwrap()
    }

    fn play_all(game: &mut Game, moves: &[&str]) {
        for (index, text) in moves.iter().enumerate() {
            let player = if index % 2 == 0 { WHITE } else { BLACK };
            let (from, to) = text.split_once('-').unwrap();
            game.make_move(player, from, to)
                .unwrap_or_else(|error| panic!("move {text} refused: {error}"));
        }
    }

    fn position(pieces: &[(&str, Piece)], turn: Color) -> Game {
        let mut board = Board::empty();
        for (square, piece) in pieces {
            board.place(at(square), *piece);
        }
        Game::from_position(WHITE, BLACK, board, turn).unwrap()
    }

    fn moved(piece: Piece) -> Piece {
        piece.after_move(1)
    }

    #[test]
    fn turns_alternate_and_history_grows_per_accepted_move() {
        let mut game = Game::new(WHITE, BLACK);
        assert!(game.is_white_turn());

        play_all(&mut game, &["e2-e4", "e7-e5", "g1-f3"]);
        assert!(!game.is_white_turn());
        assert_eq!(game.history().len(), 3);

        assert_eq!(
            game.make_move(WHITE, "d2", "d4"),
            Err(MoveError::WrongTurn(WHITE.to_string()))
        );
        assert_eq!(game.history().len(), 3);

        game.make_move(BLACK, "b8", "c6").unwrap();
        assert!(game.is_white_turn());
        assert_eq!(game.moves(), vec!["e2-e4", "e7-e5", "g1-f3", "b8-c6"]);
        assert_eq!(game.status(), GameStatus::Active);
    }

    #[test]
    fn refused_moves_report_the_failed_stage() {
        let mut game = Game::new(WHITE, BLACK);
        assert_eq!(
            game.make_move("stranger", "e2", "e4"),
            Err(MoveError::WrongTurn("stranger".to_string()))
        );
        assert_eq!(
            game.make_move(WHITE, "e2", "e9"),
            Err(MoveError::InvalidSquare("e9".to_string()))
        );
        assert_eq!(
            game.make_move(WHITE, "e3", "e4"),
            Err(MoveError::NoPieceAtSource(at("e3")))
        );
        assert_eq!(
            game.make_move(WHITE, "e7", "e5"),
            Err(MoveError::NotYourPiece(at("e7")))
        );
        assert_eq!(
            game.make_move(WHITE, "e2", "e5"),
            Err(MoveError::InvalidMove {
                from: at("e2"),
                to: at("e5")
            })
        );
        assert!(game.history().is_empty());
        assert_eq!(game.board(), &Board::standard());
    }

    #[test]
    fn move_exposing_own_king_is_refused_and_board_unchanged() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(&mut game, &["e2-e4", "e7-e5", "d1-h5"]);
        let before = game.snapshot();

        assert_eq!(
            game.make_move(BLACK, "f7", "f6"),
            Err(MoveError::MoveExposesCheck {
                from: at("f7"),
                to: at("f6")
            })
        );
        assert_eq!(game.snapshot(), before);
        assert_eq!(game.history().len(), 3);
        assert!(!game.is_white_turn());
    }

    #[test]
    fn king_cannot_step_into_attack() {
        let mut game = position(
            &[
                ("e1", Piece::king(Color::White)),
                ("e8", Piece::king(Color::Black)),
                ("d8", Piece::rook(Color::Black)),
            ],
            Color::White,
        );
        assert_eq!(
            game.make_move(WHITE, "e1", "d1"),
            Err(MoveError::MoveExposesCheck {
                from: at("e1"),
                to: at("d1")
            })
        );
        game.make_move(WHITE, "e1", "f1").unwrap();
    }

    #[test]
    fn scholars_mate_is_white_checkmate() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(
            &mut game,
            &["e2-e4", "e7-e5", "f1-c4", "b8-c6", "d1-h5", "g8-f6", "h5-f7"],
        );

        assert_eq!(game.status(), GameStatus::WhiteCheckmate);
        assert!(game.is_over());
        let last = game.history().last().unwrap();
        assert!(last.is_check_giving);
        assert_eq!(last.captured, Some(Piece::pawn(Color::Black)));
        assert_eq!(
            game.make_move(BLACK, "e8", "e7"),
            Err(MoveError::WrongTurn(BLACK.to_string()))
        );
        assert_eq!(
            game.make_move(WHITE, "c4", "b5"),
            Err(MoveError::WrongTurn(WHITE.to_string()))
        );
        assert_eq!(game.history().len(), 7);
    }

    #[test]
    fn fools_mate_is_black_checkmate() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(&mut game, &["f2-f3", "e7-e5", "g2-g4", "d8-h4"]);
        assert_eq!(game.status(), GameStatus::BlackCheckmate);
        assert_eq!(game.snapshot().status, GameStatus::BlackCheckmate);
    }

    #[test]
    fn check_answered_by_interposition_is_not_mate() {
        let back_rank = [
            ("g1", Piece::king(Color::White)),
            ("f2", Piece::pawn(Color::White)),
            ("g2", Piece::pawn(Color::White)),
            ("h2", Piece::pawn(Color::White)),
            ("g8", Piece::king(Color::Black)),
            ("e8", Piece::rook(Color::Black)),
        ];

        let mut mated = position(&back_rank, Color::Black);
        mated.make_move(BLACK, "e8", "e1").unwrap();
        assert_eq!(mated.status(), GameStatus::BlackCheckmate);

        let mut pieces = back_rank.to_vec();
        pieces.push(("d3", Piece::bishop(Color::White)));
        let mut blocked = position(&pieces, Color::Black);
        blocked.make_move(BLACK, "e8", "e1").unwrap();
        assert_eq!(blocked.status(), GameStatus::Active);
        assert!(blocked.history()[0].is_check_giving);
        blocked.make_move(WHITE, "d3", "f1").unwrap();
    }

    #[test]
    fn check_answered_by_capture_is_not_mate() {
        let mut game = position(
            &[
                ("g1", Piece::king(Color::White)),
                ("f2", Piece::pawn(Color::White)),
                ("g2", Piece::pawn(Color::White)),
                ("h2", Piece::pawn(Color::White)),
                ("a1", Piece::rook(Color::White)),
                ("g8", Piece::king(Color::Black)),
                ("e8", Piece::rook(Color::Black)),
            ],
            Color::Black,
        );
        game.make_move(BLACK, "e8", "e1").unwrap();
        assert_eq!(game.status(), GameStatus::Active);
        game.make_move(WHITE, "a1", "e1").unwrap();
    }

    #[test]
    fn double_check_without_flight_is_mate() {
        // Either check alone could be answered: g7xf6 or Qd8xf6 takes the
        // knight, Qd8-e7 or Bf8-e7 blocks the rook.
        let mut game = position(
            &[
                ("a1", Piece::king(Color::White)),
                ("e1", Piece::rook(Color::White)),
                ("e4", Piece::knight(Color::White)),
                ("e8", Piece::king(Color::Black)),
                ("d8", Piece::queen(Color::Black)),
                ("f8", Piece::bishop(Color::Black)),
                ("d7", Piece::pawn(Color::Black)),
                ("f7", Piece::pawn(Color::Black)),
                ("g7", Piece::pawn(Color::Black)),
            ],
            Color::White,
        );
        assert_eq!(game.status(), GameStatus::Active);

        let record = game.make_move(WHITE, "e4", "f6").unwrap();
        assert!(record.is_check_giving);
        assert_eq!(game.board().attackers(at("e8"), Color::White).len(), 2);
        assert_eq!(game.status(), GameStatus::WhiteCheckmate);
    }

    #[test]
    fn knight_check_cannot_be_blocked() {
        let mut game = position(
            &[
                ("a1", Piece::king(Color::White)),
                ("g5", Piece::knight(Color::White)),
                ("h8", Piece::king(Color::Black)),
                ("g8", Piece::rook(Color::Black)),
                ("d8", Piece::rook(Color::Black)),
                ("g7", Piece::pawn(Color::Black)),
                ("h7", Piece::pawn(Color::Black)),
            ],
            Color::White,
        );

        game.make_move(WHITE, "g5", "f7").unwrap();
        assert_eq!(game.status(), GameStatus::WhiteCheckmate);
    }

    #[test]
    fn checking_double_step_answered_en_passant_is_not_mate() {
        let mut game = position(
            &[
                ("a1", Piece::king(Color::White)),
                ("d2", Piece::pawn(Color::White)),
                ("c3", Piece::pawn(Color::White)),
                ("e5", Piece::king(Color::Black)),
                ("e4", Piece::pawn(Color::Black)),
                ("d5", Piece::pawn(Color::Black)),
                ("d6", Piece::pawn(Color::Black)),
                ("e6", Piece::pawn(Color::Black)),
                ("f6", Piece::pawn(Color::Black)),
                ("f5", Piece::pawn(Color::Black)),
                ("f4", Piece::pawn(Color::Black)),
            ],
            Color::White,
        );

        let record = game.make_move(WHITE, "d2", "d4").unwrap();
        assert!(record.is_check_giving);
        assert_eq!(game.status(), GameStatus::Active);

        let answer = game.make_move(BLACK, "e4", "d3").unwrap();
        assert!(answer.is_en_passant);
        assert!(
            answer
                .captured
                .is_some_and(|piece| piece.is_pawn() && piece.color == Color::White)
        );
        assert_eq!(game.board().piece_at(at("d4")), None);
        assert_eq!(game.status(), GameStatus::Active);
    }

    #[test]
    fn loyd_stalemate_sequence() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(
            &mut game,
            &[
                "e2-e3", "a7-a5", "d1-h5", "a8-a6", "h5-a5", "h7-h5", "h2-h4", "a6-h6", "a5-c7",
                "f7-f6", "c7-d7", "e8-f7", "d7-b7", "d8-d3", "b7-b8", "d3-h7", "b8-c8", "f7-g6",
                "c8-e6",
            ],
        );
        assert_eq!(game.status(), GameStatus::Stalemate);
    }

    #[test]
    fn constructed_position_without_moves_is_stalemate() {
        let mut game = position(
            &[
                ("h8", Piece::king(Color::Black)),
                ("f7", Piece::king(Color::White)),
                ("g5", Piece::queen(Color::White)),
            ],
            Color::White,
        );
        assert_eq!(game.status(), GameStatus::Active);
        let record = game.make_move(WHITE, "g5", "g6").unwrap();
        assert!(!record.is_check_giving);
        assert_eq!(game.status(), GameStatus::Stalemate);

        let direct = position(
            &[
                ("h8", Piece::king(Color::Black)),
                ("f7", Piece::king(Color::White)),
                ("g6", Piece::queen(Color::White)),
            ],
            Color::Black,
        );
        assert_eq!(direct.status(), GameStatus::Stalemate);
    }

    #[test]
    fn en_passant_removes_the_advanced_pawn() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(&mut game, &["e2-e4", "a7-a6", "e4-e5", "d7-d5"]);

        let record = game.make_move(WHITE, "e5", "d6").unwrap();
        assert!(record.is_en_passant);
        assert!(record.captured.is_some_and(|piece| piece.is_pawn()));
        assert_eq!(game.board().piece_at(at("d5")), None);
        assert_eq!(game.board().piece_at(at("e5")), None);
        assert!(
            game.board()
                .piece_at(at("d6"))
                .is_some_and(|piece| piece.is_pawn() && piece.color == Color::White)
        );
    }

    #[test]
    fn en_passant_expires_after_one_move() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(
            &mut game,
            &["e2-e4", "a7-a6", "e4-e5", "d7-d5", "h2-h3", "h7-h6"],
        );
        assert_eq!(
            game.make_move(WHITE, "e5", "d6"),
            Err(MoveError::InvalidMove {
                from: at("e5"),
                to: at("d6")
            })
        );
    }

    #[test]
    fn castling_from_the_opening() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(
            &mut game,
            &["e2-e4", "e7-e5", "g1-f3", "b8-c6", "f1-c4", "g8-f6"],
        );
        let record = game.make_move(WHITE, "e1", "h1").unwrap();
        assert!(record.is_castling);
        assert_eq!(record.to_string(), "e1-h1");
        assert!(game.board().piece_at(at("g1")).is_some_and(|p| p.is_king()));
        assert!(
            game.board()
                .piece_at(at("f1"))
                .is_some_and(|p| matches!(p.kind, PieceKind::Rook { moved: true }))
        );
        assert_eq!(game.board().piece_at(at("e1")), None);
        assert_eq!(game.board().piece_at(at("h1")), None);

        play_all_from(&mut game, BLACK, &["d7-d6"]);
        play_all_from(&mut game, WHITE, &["g1-h1"]);
    }

    fn play_all_from(game: &mut Game, player: &str, moves: &[&str]) {
        for text in moves {
            let (from, to) = text.split_once('-').unwrap();
            game.make_move(player, from, to).unwrap();
        }
    }

    fn castling_position(extra: &[(&str, Piece)], king: Piece, rook: Piece) -> Game {
        let mut pieces = vec![
            ("e1", king),
            ("h1", rook),
            ("a1", Piece::rook(Color::White)),
            ("e8", Piece::king(Color::Black)),
        ];
        pieces.extend_from_slice(extra);
        position(&pieces, Color::White)
    }

    fn assert_castling_refused(game: &mut Game, to: &str) {
        assert_eq!(
            game.make_move(WHITE, "e1", to),
            Err(MoveError::InvalidMove {
                from: at("e1"),
                to: at(to)
            })
        );
    }

    #[test]
    fn castling_both_sides_from_a_clear_position() {
        let mut kingside =
            castling_position(&[], Piece::king(Color::White), Piece::rook(Color::White));
        kingside.make_move(WHITE, "e1", "h1").unwrap();
        assert!(kingside.board().piece_at(at("g1")).is_some_and(|p| p.is_king()));
        assert!(kingside.board().piece_at(at("f1")).is_some());

        let mut queenside =
            castling_position(&[], Piece::king(Color::White), Piece::rook(Color::White));
        queenside.make_move(WHITE, "e1", "a1").unwrap();
        assert!(queenside.board().piece_at(at("c1")).is_some_and(|p| p.is_king()));
        assert!(queenside.board().piece_at(at("d1")).is_some());
        assert_eq!(queenside.board().piece_at(at("a1")), None);
    }

    #[test]
    fn castling_refused_when_king_has_moved() {
        let mut game = castling_position(
            &[],
            moved(Piece::king(Color::White)),
            Piece::rook(Color::White),
        );
        assert_castling_refused(&mut game, "h1");
    }

    #[test]
    fn castling_refused_when_rook_has_moved() {
        let mut game = castling_position(
            &[],
            Piece::king(Color::White),
            moved(Piece::rook(Color::White)),
        );
        assert_castling_refused(&mut game, "h1");
    }

    #[test]
    fn castling_refused_when_path_is_occupied() {
        let mut game = castling_position(
            &[("g1", Piece::knight(Color::White))],
            Piece::king(Color::White),
            Piece::rook(Color::White),
        );
        assert_castling_refused(&mut game, "h1");
    }

    #[test]
    fn castling_refused_while_in_check() {
        let mut game = castling_position(
            &[("e5", Piece::rook(Color::Black))],
            Piece::king(Color::White),
            Piece::rook(Color::White),
        );
        assert_castling_refused(&mut game, "h1");
        assert_castling_refused(&mut game, "a1");
    }

    #[test]
    fn castling_refused_through_an_attacked_square() {
        let mut game = castling_position(
            &[("f8", Piece::rook(Color::Black))],
            Piece::king(Color::White),
            Piece::rook(Color::White),
        );
        assert_castling_refused(&mut game, "h1");

        let mut queenside = castling_position(
            &[("b8", Piece::rook(Color::Black))],
            Piece::king(Color::White),
            Piece::rook(Color::White),
        );
        queenside.make_move(WHITE, "e1", "a1").unwrap();
    }

    #[test]
    fn pawn_reaching_last_rank_becomes_queen() {
        let mut game = position(
            &[
                ("e1", Piece::king(Color::White)),
                ("h8", Piece::king(Color::Black)),
                ("a7", Piece::pawn(Color::White)),
            ],
            Color::White,
        );
        let record = game.make_move(WHITE, "a7", "a8").unwrap();
        assert!(record.is_promotion);
        assert_eq!(record.promoted_to, Some(Piece::queen(Color::White)));
        assert_eq!(game.board().piece_at(at("a8")), Some(Piece::queen(Color::White)));
        assert!(record.is_check_giving);
        assert_eq!(game.status(), GameStatus::Active);
    }

    #[test]
    fn king_check_flag_clears_once_the_check_is_blocked() {
        let mut game = Game::new(WHITE, BLACK);
        play_all(&mut game, &["e2-e4", "f7-f6", "d1-h5"]);
        assert!(matches!(
            game.board().piece_at(at("e8")).map(|piece| piece.kind),
            Some(PieceKind::King { in_check: true, .. })
        ));

        game.make_move(BLACK, "g7", "g6").unwrap();
        assert!(matches!(
            game.board().piece_at(at("e8")).map(|piece| piece.kind),
            Some(PieceKind::King { in_check: false, .. })
        ));
    }

    #[test]
    fn position_needs_one_king_per_side() {
        let mut board = Board::empty();
        board.place(at("e1"), Piece::king(Color::White));
        assert!(matches!(
            Game::from_position(WHITE, BLACK, board, Color::White),
            Err(MoveError::InvalidPosition(_))
        ));
    }

    #[test]
    fn snapshot_reports_board_and_turn() {
        let mut game = Game::new(WHITE, BLACK);
        game.make_move(WHITE, "e2", "e4").unwrap();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.status, GameStatus::Active);
        assert!(!snapshot.is_white_turn);
        assert_eq!(snapshot.board[4][3], "♟");
        assert_eq!(snapshot.board[4][1], "");
        assert_eq!(game.side_of(BLACK), Some(Color::Black));
        assert_eq!(game.side_of("stranger"), None);
    }
}
