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

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chess_common::{
    GameRecord, GameStateSnapshot, GameStatus, OutboundEnvelope, PlayerId, PlayerStateView,
    SessionId, board_to_fen,
};
use chess_engine::{Color, Game, parse_move_text};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::{connection::ConnectionHandle, error::SessionError};

/// A finished match handed to the game-over collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    pub session_id: SessionId,
    pub white_player_id: PlayerId,
    pub black_player_id: PlayerId,
    pub moves: Vec<String>,
    pub status: GameStatus,
}

impl FinishedGame {
    pub fn into_record(self, finished_at: DateTime<Utc>) -> GameRecord {
        GameRecord {
            session_id: self.session_id,
            player1_id: self.white_player_id,
            player2_id: self.black_player_id,
            moves: self.moves,
            status: self.status,
            finished_at,
        }
    }
}

#[async_trait]
pub trait GameOverHandler: Send + Sync {
    async fn on_game_over(&self, finished: FinishedGame);
}

/// A player joining a session over a specific connection.
#[derive(Debug, Clone)]
pub struct Participant {
    pub player_id: PlayerId,
    pub conn_id: String,
    pub handle: ConnectionHandle,
}

#[derive(Debug, Clone)]
struct Slot {
    conn_id: String,
    handle: ConnectionHandle,
}

/// A live match. An empty slot keeps the seat of a disconnected player.
struct GameSession {
    game: Game,
    slots: HashMap<PlayerId, Option<Slot>>,
}

impl GameSession {
    fn live_handles(&self) -> Vec<ConnectionHandle> {
        self.slots
            .values()
            .flatten()
            .map(|slot| slot.handle.clone())
            .collect()
    }

    fn player_state(&self, player_id: &str) -> Result<PlayerStateView, SessionError> {
        let side = self
            .game
            .side_of(player_id)
            .ok_or(SessionError::InvalidPlayerId)?;
        Ok(PlayerStateView {
            is_white_side: side == Color::White,
        })
    }
}

/// Result of one move request, for callers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveDisposition {
    UnknownSession,
    Rejected(SessionError),
    Applied(GameStateSnapshot),
    Finished(GameStatus),
}

/// Owns every live match. Each session sits behind its own lock, which
/// serializes moves, joins, leaves and termination for that session.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SessionId, Arc<Mutex<GameSession>>>>>,
    game_over: Arc<dyn GameOverHandler>,
}

impl SessionRegistry {
    pub fn new(game_over: Arc<dyn GameOverHandler>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            game_over,
        }
    }

    async fn lookup(&self, session_id: &str) -> Option<Arc<Mutex<GameSession>>> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    /// Start a fresh game between two connected players; `white` moves first.
    pub async fn create_session(
        &self,
        session_id: &str,
        white: Participant,
        black: Participant,
    ) -> GameStateSnapshot {
        let game = Game::new(white.player_id.clone(), black.player_id.clone());
        let snapshot = game.snapshot();
        let slots = [white, black]
            .into_iter()
            .map(|participant| {
                let slot = Slot {
                    conn_id: participant.conn_id,
                    handle: participant.handle,
                };
                (participant.player_id, Some(slot))
            })
            .collect();

        self.sessions.lock().await.insert(
            session_id.to_string(),
            Arc::new(Mutex::new(GameSession { game, slots })),
        );
        info!(session_id = %session_id, "session created");
        snapshot
    }

    /// Bind a connection to a member's empty slot.
    pub async fn player_join(
        &self,
        session_id: &str,
        participant: Participant,
    ) -> Result<(GameStateSnapshot, PlayerStateView), SessionError> {
        let session = self
            .lookup(session_id)
            .await
            .ok_or(SessionError::InvalidSessionId)?;
        let mut session = session.lock().await;

        let slot = session
            .slots
            .get_mut(&participant.player_id)
            .ok_or(SessionError::PlayerIdNotInSession)?;
        if slot.is_some() {
            return Err(SessionError::AlreadyInSession);
        }
        *slot = Some(Slot {
            conn_id: participant.conn_id,
            handle: participant.handle,
        });

        info!(
            session_id = %session_id,
            player_id = %participant.player_id,
            "player rejoined session"
        );
        let view = session.player_state(&participant.player_id)?;
        Ok((session.game.snapshot(), view))
    }

    /// Release a member's slot, keeping the seat. A slot already rebound to
    /// another connection is left alone.
    pub async fn player_leave(
        &self,
        session_id: &str,
        player_id: &str,
        conn_id: &str,
    ) -> Result<(), SessionError> {
        let session = self
            .lookup(session_id)
            .await
            .ok_or(SessionError::InvalidSessionId)?;
        let mut session = session.lock().await;

        let slot = session
            .slots
            .get_mut(player_id)
            .ok_or(SessionError::PlayerIdNotInSession)?;
        if slot.as_ref().is_some_and(|bound| bound.conn_id == conn_id) {
            *slot = None;
            info!(session_id = %session_id, player_id = %player_id, "player left session");
        }
        Ok(())
    }

    /// Apply one `xx-yy` move. Failures go to `requester` only; a success is
    /// pushed to every connected member, and a finished game is handed to
    /// the game-over handler before the session is dropped.
    pub async fn process_move(
        &self,
        session_id: &str,
        player_id: &str,
        move_text: &str,
        requester: &ConnectionHandle,
    ) -> MoveDisposition {
        let Some(session) = self.lookup(session_id).await else {
            return MoveDisposition::UnknownSession;
        };

        let reject = |error: SessionError| {
            info!(
                session_id = %session_id,
                player_id = %player_id,
                move_text = %move_text,
                error = %error,
                "invalid move"
            );
            requester.send(&OutboundEnvelope::error(error.to_string()));
            MoveDisposition::Rejected(error)
        };

        let (from, to) = match parse_move_text(move_text) {
            Ok(squares) => squares,
            Err(error) => return reject(error.into()),
        };

        let mut guard = session.lock().await;
        if guard.game.side_of(player_id).is_none() {
            drop(guard);
            return reject(SessionError::PlayerIdNotInSession);
        }
        if let Err(error) = guard.game.play(player_id, from, to) {
            drop(guard);
            return reject(error.into());
        }

        let snapshot = guard.game.snapshot();
        let handles = guard.live_handles();
        let finished = guard.game.is_over().then(|| FinishedGame {
            session_id: session_id.to_string(),
            white_player_id: guard.game.white_player().to_string(),
            black_player_id: guard.game.black_player().to_string(),
            moves: guard.game.moves(),
            status: guard.game.status(),
        });
        drop(guard);

        info!(
            session_id = %session_id,
            player_id = %player_id,
            move_text = %move_text,
            fen = %board_to_fen(&snapshot.board).unwrap_or_default(),
            "valid move"
        );
        let update = OutboundEnvelope::Session {
            game_state: snapshot.clone(),
        };
        for handle in &handles {
            handle.send(&update);
        }

        let Some(finished) = finished else {
            return MoveDisposition::Applied(snapshot);
        };

        let status = finished.status;
        info!(session_id = %session_id, status = status.as_str(), "game over");
        let endgame = OutboundEnvelope::endgame(status);
        for handle in &handles {
            handle.send(&endgame);
            handle.close();
        }
        self.game_over.on_game_over(finished).await;
        self.sessions.lock().await.remove(session_id);
        MoveDisposition::Finished(status)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex as StdMutex;

    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::connection::{Outbound, drain, drain_envelopes};

    #[derive(Default)]
    pub(crate) struct RecordingGameOverHandler {
        pub(crate) finished: StdMutex<Vec<FinishedGame>>,
    }

    #[async_trait]
    impl GameOverHandler for RecordingGameOverHandler {
        async fn on_game_over(&self, finished: FinishedGame) {
            self.finished.lock().unwrap().push(finished);
        }
    }

    pub(crate) fn participant(
        player_id: &str,
        conn_id: &str,
    ) -> (Participant, UnboundedReceiver<Outbound>) {
        let (handle, rx) = ConnectionHandle::channel();
        (
            Participant {
                player_id: player_id.to_string(),
                conn_id: conn_id.to_string(),
                handle,
            },
            rx,
        )
    }

    impl SessionRegistry {
        pub(crate) async fn snapshot(
            &self,
            session_id: &str,
        ) -> Result<GameStateSnapshot, SessionError> {
            let session = self
                .lookup(session_id)
                .await
                .ok_or(SessionError::InvalidSessionId)?;
            let session = session.lock().await;
            Ok(session.game.snapshot())
        }
    }

    struct Fixture {
        registry: SessionRegistry,
        recorder: Arc<RecordingGameOverHandler>,
        white: ConnectionHandle,
        white_rx: UnboundedReceiver<Outbound>,
        black: ConnectionHandle,
        black_rx: UnboundedReceiver<Outbound>,
    }

    async fn fixture() -> Fixture {
        let recorder = Arc::new(RecordingGameOverHandler::default());
        let registry = SessionRegistry::new(recorder.clone());
        let (white, white_rx) = participant("alice", "conn-a");
        let (black, black_rx) = participant("bob", "conn-b");
        let white_handle = white.handle.clone();
        let black_handle = black.handle.clone();
        registry.create_session("s-1", white, black).await;
        Fixture {
            registry,
            recorder,
            white: white_handle,
            white_rx,
            black: black_handle,
            black_rx,
        }
    }

    #[tokio::test]
    async fn move_for_unknown_session_is_a_silent_noop() {
        let mut fx = fixture().await;
        let disposition = fx
            .registry
            .process_move("missing", "alice", "e2-e4", &fx.white)
            .await;
        assert_eq!(disposition, MoveDisposition::UnknownSession);
        assert!(drain(&mut fx.white_rx).is_empty());
        assert!(drain(&mut fx.black_rx).is_empty());
    }

    #[tokio::test]
    async fn malformed_move_text_never_reaches_the_game() {
        let mut fx = fixture().await;
        let before = fx.registry.snapshot("s-1").await.unwrap();

        let disposition = fx
            .registry
            .process_move("s-1", "alice", "e2e4", &fx.white)
            .await;
        assert!(matches!(
            disposition,
            MoveDisposition::Rejected(SessionError::Move(chess_engine::MoveError::Parse(_)))
        ));
        assert_eq!(fx.registry.snapshot("s-1").await.unwrap(), before);
        assert_eq!(
            drain_envelopes(&mut fx.white_rx),
            vec![OutboundEnvelope::error("couldn't parse move \"e2e4\"")]
        );
        assert!(drain(&mut fx.black_rx).is_empty());
    }

    #[tokio::test]
    async fn rejected_move_is_reported_to_requester_only() {
        let mut fx = fixture().await;
        let disposition = fx
            .registry
            .process_move("s-1", "bob", "e7-e5", &fx.black)
            .await;
        assert!(matches!(
            disposition,
            MoveDisposition::Rejected(SessionError::Move(chess_engine::MoveError::WrongTurn(_)))
        ));
        assert_eq!(
            drain_envelopes(&mut fx.black_rx),
            vec![OutboundEnvelope::error("wrong turn for player id: bob")]
        );
        assert!(drain(&mut fx.white_rx).is_empty());

        let stranger = fx
            .registry
            .process_move("s-1", "mallory", "e2-e4", &fx.white)
            .await;
        assert_eq!(
            stranger,
            MoveDisposition::Rejected(SessionError::PlayerIdNotInSession)
        );
    }

    #[tokio::test]
    async fn accepted_move_is_broadcast_to_both_players() {
        let mut fx = fixture().await;
        let disposition = fx
            .registry
            .process_move("s-1", "alice", "e2-e4", &fx.white)
            .await;
        let MoveDisposition::Applied(snapshot) = disposition else {
            panic!("expected an applied move, got {disposition:?}");
        };
        assert!(!snapshot.is_white_turn);

        let expected = vec![OutboundEnvelope::Session {
            game_state: snapshot,
        }];
        assert_eq!(drain_envelopes(&mut fx.white_rx), expected);
        assert_eq!(drain_envelopes(&mut fx.black_rx), expected);
    }

    #[tokio::test]
    async fn checkmate_ends_session_and_runs_handler_once() {
        let mut fx = fixture().await;
        for (player, handle, text) in [
            ("alice", &fx.white, "f2-f3"),
            ("bob", &fx.black, "e7-e5"),
            ("alice", &fx.white, "g2-g4"),
        ] {
            let disposition = fx.registry.process_move("s-1", player, text, handle).await;
            assert!(matches!(disposition, MoveDisposition::Applied(_)));
        }
        drain(&mut fx.white_rx);
        drain(&mut fx.black_rx);

        let disposition = fx
            .registry
            .process_move("s-1", "bob", "d8-h4", &fx.black)
            .await;
        assert_eq!(
            disposition,
            MoveDisposition::Finished(GameStatus::BlackCheckmate)
        );

        for rx in [&mut fx.white_rx, &mut fx.black_rx] {
            let received = drain(rx);
            assert_eq!(received.len(), 3);
            assert_eq!(
                received[1],
                Outbound::Text(
                    r#"{"type":"endgame","data":{"game_state":"BLACK_CHECKMATE"}}"#.to_string()
                )
            );
            assert_eq!(received[2], Outbound::Close);
        }

        let finished = fx.recorder.finished.lock().unwrap().clone();
        assert_eq!(
            finished,
            vec![FinishedGame {
                session_id: "s-1".to_string(),
                white_player_id: "alice".to_string(),
                black_player_id: "bob".to_string(),
                moves: vec![
                    "f2-f3".to_string(),
                    "e7-e5".to_string(),
                    "g2-g4".to_string(),
                    "d8-h4".to_string(),
                ],
                status: GameStatus::BlackCheckmate,
            }]
        );
        assert_eq!(
            fx.registry.snapshot("s-1").await,
            Err(SessionError::InvalidSessionId)
        );
        assert_eq!(
            fx.registry
                .process_move("s-1", "alice", "e2-e4", &fx.white)
                .await,
            MoveDisposition::UnknownSession
        );
    }

    #[tokio::test]
    async fn join_requires_membership_and_an_empty_slot() {
        let fx = fixture().await;
        let (again, _again_rx) = participant("alice", "conn-a2");
        assert_eq!(
            fx.registry.player_join("s-1", again.clone()).await.unwrap_err(),
            SessionError::AlreadyInSession
        );

        let (stranger, _stranger_rx) = participant("mallory", "conn-m");
        assert_eq!(
            fx.registry.player_join("s-1", stranger).await.unwrap_err(),
            SessionError::PlayerIdNotInSession
        );
        assert_eq!(
            fx.registry.player_join("nope", again.clone()).await.unwrap_err(),
            SessionError::InvalidSessionId
        );

        fx.registry
            .player_leave("s-1", "alice", "conn-a")
            .await
            .unwrap();
        let (_, view) = fx.registry.player_join("s-1", again).await.unwrap();
        assert_eq!(view, PlayerStateView { is_white_side: true });
    }

    #[tokio::test]
    async fn leave_from_a_stale_connection_keeps_the_new_binding() {
        let mut fx = fixture().await;
        fx.registry
            .player_leave("s-1", "bob", "conn-b")
            .await
            .unwrap();
        let (rejoin, mut rejoin_rx) = participant("bob", "conn-b2");
        fx.registry.player_join("s-1", rejoin).await.unwrap();

        fx.registry
            .player_leave("s-1", "bob", "conn-b")
            .await
            .unwrap();
        fx.registry
            .process_move("s-1", "alice", "e2-e4", &fx.white)
            .await;
        assert_eq!(drain_envelopes(&mut rejoin_rx).len(), 1);
        assert!(drain(&mut fx.black_rx).is_empty());
    }
}
