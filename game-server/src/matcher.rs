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

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use chess_common::{GameStateSnapshot, OutboundEnvelope, PlayerId, PlayerStateView, SessionId};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    connection::ConnectionHandle,
    error::MatchError,
    session::{Participant, SessionRegistry},
};

/// Player id to live session id. Shared by the matcher and the game-over
/// handler, which clears both players' entries when a match ends.
#[derive(Clone, Default)]
pub struct SessionDirectory {
    sessions: Arc<Mutex<HashMap<PlayerId, SessionId>>>,
}

impl SessionDirectory {
    pub async fn get(&self, player_id: &str) -> Option<SessionId> {
        self.sessions.lock().await.get(player_id).cloned()
    }

    pub async fn bind(&self, player_id: &str, session_id: &str) {
        self.sessions
            .lock()
            .await
            .insert(player_id.to_string(), session_id.to_string());
    }

    pub async fn remove(&self, player_id: &str) {
        self.sessions.lock().await.remove(player_id);
    }
}

struct QueueEntry {
    ticket: Uuid,
    player_id: PlayerId,
    conn_id: String,
    connection: ConnectionHandle,
    enqueued_at: Instant,
}

impl QueueEntry {
    fn participant(&self) -> Participant {
        Participant {
            player_id: self.player_id.clone(),
            conn_id: self.conn_id.clone(),
            handle: self.connection.clone(),
        }
    }
}

#[derive(Default)]
struct MatcherState {
    queue: VecDeque<QueueEntry>,
    /// Connection id to the player it queued or rejoined for.
    connections: HashMap<String, PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOutcome {
    Rejoined(SessionId),
    Queued,
    Paired(SessionId),
}

struct Pairing {
    session_id: SessionId,
    snapshot: GameStateSnapshot,
    white: QueueEntry,
    black: QueueEntry,
}

/// FIFO matchmaking. Lock order is matcher state, then the session
/// directory, then the session registry.
#[derive(Clone)]
pub struct Matcher {
    state: Arc<Mutex<MatcherState>>,
    directory: SessionDirectory,
    registry: SessionRegistry,
    matching_timeout: Duration,
}

impl Matcher {
    pub fn new(
        registry: SessionRegistry,
        directory: SessionDirectory,
        matching_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(MatcherState::default())),
            directory,
            registry,
            matching_timeout,
        }
    }

    /// Queue a player, or put them back into their running game.
    pub async fn enter_queue(
        &self,
        player_id: &str,
        conn_id: &str,
        connection: ConnectionHandle,
    ) -> Result<QueueOutcome, MatchError> {
        let mut state = self.state.lock().await;

        if let Some(session_id) = self.directory.get(player_id).await {
            let participant = Participant {
                player_id: player_id.to_string(),
                conn_id: conn_id.to_string(),
                handle: connection.clone(),
            };
            return match self.registry.player_join(&session_id, participant).await {
                Ok((game_state, player_state)) => {
                    state
                        .connections
                        .insert(conn_id.to_string(), player_id.to_string());
                    drop(state);
                    connection.send(&OutboundEnvelope::Matched {
                        session_id: session_id.clone(),
                        game_state,
                        player_state,
                    });
                    Ok(QueueOutcome::Rejoined(session_id))
                }
                Err(error) => {
                    drop(state);
                    let error = MatchError::Rejoin(error);
                    info!(player_id = %player_id, session_id = %session_id, error = %error, "rejoin refused");
                    connection.send(&OutboundEnvelope::error(error.to_string()));
                    Err(error)
                }
            };
        }

        let already_queued = state.queue.iter().any(|entry| entry.player_id == player_id)
            || state
                .connections
                .iter()
                .any(|(queued_conn, queued_player)| {
                    queued_player == player_id && queued_conn != conn_id
                });
        if already_queued {
            drop(state);
            info!(player_id = %player_id, conn_id = %conn_id, "duplicate matching request");
            connection.send(&OutboundEnvelope::Queueing {
                error: MatchError::AlreadyQueued.to_string(),
            });
            return Err(MatchError::AlreadyQueued);
        }

        let ticket = Uuid::new_v4();
        state
            .connections
            .insert(conn_id.to_string(), player_id.to_string());
        state.queue.push_back(QueueEntry {
            ticket,
            player_id: player_id.to_string(),
            conn_id: conn_id.to_string(),
            connection,
            enqueued_at: Instant::now(),
        });
        info!(player_id = %player_id, queued = state.queue.len(), "player queued");
        self.spawn_watchdog(player_id.to_string(), ticket);

        let pairing = self.try_pair(&mut state).await;
        drop(state);

        match pairing {
            Some(pairing) => {
                let session_id = pairing.session_id.clone();
                notify_matched(pairing);
                Ok(QueueOutcome::Paired(session_id))
            }
            None => Ok(QueueOutcome::Queued),
        }
    }

    /// Pair the two oldest entries. The first one dequeued plays white.
    async fn try_pair(&self, state: &mut MatcherState) -> Option<Pairing> {
        if state.queue.len() < 2 {
            return None;
        }
        let white = state.queue.pop_front()?;
        let black = state.queue.pop_front()?;

        let session_id = Uuid::new_v4().to_string();
        let snapshot = self
            .registry
            .create_session(&session_id, white.participant(), black.participant())
            .await;
        self.directory.bind(&white.player_id, &session_id).await;
        self.directory.bind(&black.player_id, &session_id).await;

        info!(
            session_id = %session_id,
            white = %white.player_id,
            black = %black.player_id,
            white_waited_ms = white.enqueued_at.elapsed().as_millis() as u64,
            "players matched"
        );
        Some(Pairing {
            session_id,
            snapshot,
            white,
            black,
        })
    }

    fn spawn_watchdog(&self, player_id: PlayerId, ticket: Uuid) {
        let matcher = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(matcher.matching_timeout).await;
            matcher.expire_if_unmatched(&player_id, ticket).await;
        });
    }

    /// Drop a still-unpaired queue entry and tell its connection. Returns
    /// whether anything was evicted.
    async fn expire_if_unmatched(&self, player_id: &str, ticket: Uuid) -> bool {
        let mut state = self.state.lock().await;
        if self.directory.get(player_id).await.is_some() {
            return false;
        }
        let Some(position) = state.queue.iter().position(|entry| entry.ticket == ticket) else {
            return false;
        };
        let Some(entry) = state.queue.remove(position) else {
            return false;
        };
        state.connections.remove(&entry.conn_id);
        drop(state);

        info!(player_id = %player_id, "matching timed out");
        entry.connection.send(&OutboundEnvelope::Timeout {
            message: MatchError::MatchingTimeout.to_string(),
        });
        true
    }

    /// Forget a closed connection. Returns the player it belonged to; a
    /// still-queued entry for it is removed.
    pub async fn release_connection(&self, conn_id: &str) -> Option<PlayerId> {
        let mut state = self.state.lock().await;
        let player_id = state.connections.remove(conn_id)?;
        let before = state.queue.len();
        state.queue.retain(|entry| entry.conn_id != conn_id);
        if state.queue.len() != before {
            debug!(player_id = %player_id, conn_id = %conn_id, "removed queued player on disconnect");
        }
        Some(player_id)
    }
}

fn notify_matched(pairing: Pairing) {
    let Pairing {
        session_id,
        snapshot,
        white,
        black,
    } = pairing;
    for (entry, is_white_side) in [(white, true), (black, false)] {
        entry.connection.send(&OutboundEnvelope::Matched {
            session_id: session_id.clone(),
            game_state: snapshot.clone(),
            player_state: PlayerStateView { is_white_side },
        });
    }
}
