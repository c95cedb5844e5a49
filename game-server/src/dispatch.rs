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

use chess_common::{InboundMessage, MATCHING_ACTION, MOVE_ACTION, OutboundEnvelope};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    connection::ConnectionHandle,
    matcher::{Matcher, QueueOutcome, SessionDirectory},
    session::{MoveDisposition, SessionRegistry},
};

const INSUFFICIENT_DATA: &str = "insufficient data";

/// Routes parsed client messages into the matcher and the session registry.
#[derive(Clone)]
pub struct Dispatcher {
    matcher: Matcher,
    registry: SessionRegistry,
    directory: SessionDirectory,
}

impl Dispatcher {
    pub fn new(matcher: Matcher, registry: SessionRegistry, directory: SessionDirectory) -> Self {
        Self {
            matcher,
            registry,
            directory,
        }
    }

    /// Handle one message from a connection. `conn_id` is the connection's
    /// identifier slot, assigned on its first matching request.
    pub async fn handle_message(
        &self,
        connection: &ConnectionHandle,
        message: InboundMessage,
        conn_id: &mut Option<String>,
    ) {
        match message.action.as_str() {
            MATCHING_ACTION => {
                let Some(player_id) = message.field("player_id") else {
                    connection.send(&OutboundEnvelope::error(INSUFFICIENT_DATA));
                    return;
                };
                let conn_id = conn_id.get_or_insert_with(|| Uuid::new_v4().to_string());
                match self
                    .matcher
                    .enter_queue(player_id, conn_id, connection.clone())
                    .await
                {
                    Ok(QueueOutcome::Queued) => {}
                    Ok(QueueOutcome::Paired(session_id) | QueueOutcome::Rejoined(session_id)) => {
                        debug!(player_id = %player_id, session_id = %session_id, "player seated");
                    }
                    Err(error) => {
                        debug!(player_id = %player_id, error = %error, "matching request not queued");
                    }
                }
            }
            MOVE_ACTION => {
                let (Some(session_id), Some(player_id), Some(move_text)) = (
                    message.field("session_id"),
                    message.field("player_id"),
                    message.field("move"),
                ) else {
                    connection.send(&OutboundEnvelope::error(INSUFFICIENT_DATA));
                    return;
                };
                match self
                    .registry
                    .process_move(session_id, player_id, move_text, connection)
                    .await
                {
                    MoveDisposition::UnknownSession => {
                        debug!(session_id = %session_id, "move for unknown session ignored");
                    }
                    MoveDisposition::Rejected(error) => {
                        debug!(session_id = %session_id, error = %error, "move rejected");
                    }
                    MoveDisposition::Applied(snapshot) => {
                        debug!(
                            session_id = %session_id,
                            is_white_turn = snapshot.is_white_turn,
                            "move applied"
                        );
                    }
                    MoveDisposition::Finished(status) => {
                        debug!(session_id = %session_id, status = status.as_str(), "move ended the game");
                    }
                }
            }
            other => debug!(action = %other, "ignoring unknown action"),
        }
    }

    /// The connection behind `conn_id` closed.
    pub async fn handle_disconnect(&self, conn_id: &str) {
        let Some(player_id) = self.matcher.release_connection(conn_id).await else {
            return;
        };
        let Some(session_id) = self.directory.get(&player_id).await else {
            return;
        };
        if let Err(error) = self
            .registry
            .player_leave(&session_id, &player_id, conn_id)
            .await
        {
            debug!(session_id = %session_id, player_id = %player_id, error = %error, "leave after disconnect");
        } else {
            info!(session_id = %session_id, player_id = %player_id, "player disconnected from session");
        }
    }
}
