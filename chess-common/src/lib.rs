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

use std::{collections::HashMap, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MATCHING_TIMEOUT_SECONDS: u64 = 5;
pub const BOARD_LEN: usize = 8;

pub const MATCHING_ACTION: &str = "matching";
pub const MOVE_ACTION: &str = "move";

pub type PlayerId = String;
pub type SessionId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Active,
    /// White delivered mate.
    WhiteCheckmate,
    /// Black delivered mate.
    BlackCheckmate,
    Stalemate,
    WhiteResign,
    BlackResign,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Active => "ACTIVE",
            GameStatus::WhiteCheckmate => "WHITE_CHECKMATE",
            GameStatus::BlackCheckmate => "BLACK_CHECKMATE",
            GameStatus::Stalemate => "STALEMATE",
            GameStatus::WhiteResign => "WHITE_RESIGN",
            GameStatus::BlackResign => "BLACK_RESIGN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(GameStatus::Active),
            "WHITE_CHECKMATE" => Some(GameStatus::WhiteCheckmate),
            "BLACK_CHECKMATE" => Some(GameStatus::BlackCheckmate),
            "STALEMATE" => Some(GameStatus::Stalemate),
            "WHITE_RESIGN" => Some(GameStatus::WhiteResign),
            "BLACK_RESIGN" => Some(GameStatus::BlackResign),
            _ => None,
        }
    }
}

/// Authoritative view of a game pushed to both players.
///
/// `board` is indexed `[file][rank]`, `board[0][0]` being a1. Empty squares
/// are empty strings, occupied squares carry the piece glyph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateSnapshot {
    pub status: GameStatus,
    pub board: Vec<Vec<String>>,
    pub is_white_turn: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStateView {
    pub is_white_side: bool,
}

/// Message sent by a client over the websocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    pub action: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl InboundMessage {
    /// Returns the named field when it is present as a non-empty string.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|value| value.as_str())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndgameData {
    pub game_state: GameStatus,
}

/// Every message the server pushes to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEnvelope {
    Matched {
        session_id: SessionId,
        game_state: GameStateSnapshot,
        player_state: PlayerStateView,
    },
    Session {
        game_state: GameStateSnapshot,
    },
    Endgame {
        data: EndgameData,
    },
    Error {
        error: String,
    },
    Queueing {
        error: String,
    },
    Timeout {
        message: String,
    },
}

impl OutboundEnvelope {
    pub fn error(message: impl Into<String>) -> Self {
        OutboundEnvelope::Error {
            error: message.into(),
        }
    }

    pub fn endgame(status: GameStatus) -> Self {
        OutboundEnvelope::Endgame {
            data: EndgameData { game_state: status },
        }
    }
}

/// A finished game as handed to persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecord {
    pub session_id: SessionId,
    /// White.
    pub player1_id: PlayerId,
    /// Black.
    pub player2_id: PlayerId,
    pub moves: Vec<String>,
    pub status: GameStatus,
    pub finished_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn involves(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }
}

fn glyph_to_fen(glyph: &str) -> Option<char> {
    let letter = match glyph {
        "♟" => 'P',
        "♜" => 'R',
        "♞" => 'N',
        "♝" => 'B',
        "♛" => 'Q',
        "♚" => 'K',
        "♙" => 'p',
        "♖" => 'r',
        "♘" => 'n',
        "♗" => 'b',
        "♕" => 'q',
        "♔" => 'k',
        _ => return None,
    };
    Some(letter)
}

/// Render a glyph board (indexed `[file][rank]`) as the piece placement field
/// of a FEN string. Returns `None` for a malformed board or an unknown glyph.
pub fn board_to_fen(board: &[Vec<String>]) -> Option<String> {
    if board.len() != BOARD_LEN || board.iter().any(|file| file.len() != BOARD_LEN) {
        return None;
    }

    let mut rows = Vec::with_capacity(BOARD_LEN);
    for rank in (0..BOARD_LEN).rev() {
        let mut row = String::new();
        let mut empty = 0;
        for file in board {
            let glyph = file[rank].as_str();
            if glyph.is_empty() {
                empty += 1;
                continue;
            }
            if empty > 0 {
                row.push_str(&empty.to_string());
                empty = 0;
            }
            row.push(glyph_to_fen(glyph)?);
        }
        if empty > 0 {
            row.push_str(&empty.to_string());
        }
        rows.push(row);
    }
    Some(rows.join("/"))
}

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is a valid regex")
});

/// Replace `${VAR_NAME}` patterns in a string with values from environment variables.
/// Unknown or unset variables are replaced with an empty string.
pub fn expand_env_vars(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .into_owned()
}
