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

use chess_engine::MoveError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session id")]
    InvalidSessionId,
    #[error("invalid player id")]
    InvalidPlayerId,
    #[error("player id not in the session")]
    PlayerIdNotInSession,
    #[error("player already connected to the session")]
    AlreadyInSession,
    #[error(transparent)]
    Move(#[from] MoveError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Already queued")]
    AlreadyQueued,
    #[error("couldn't rejoin session: {0}")]
    Rejoin(#[from] SessionError),
    /// Not a failure of the request; reported to the client asynchronously.
    #[error("Canceled matching due to timeout")]
    MatchingTimeout,
}
