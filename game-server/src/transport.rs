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

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use chess_common::InboundMessage;
use tracing::{debug, info, warn};

use crate::{
    AppState,
    connection::{ConnectionHandle, Outbound},
    dispatch::Dispatcher,
};

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.dispatcher))
}

/// Per-connection loop: inbound frames go to the dispatcher, outbound
/// messages queued on the connection handle are written to the socket.
async fn handle_socket(mut socket: WebSocket, dispatcher: Dispatcher) {
    let (connection, mut outbound) = ConnectionHandle::channel();
    let mut conn_id: Option<String> = None;
    info!("websocket connected");

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<InboundMessage>(text.as_str()) {
                            Ok(message) => {
                                dispatcher.handle_message(&connection, message, &mut conn_id).await;
                            }
                            Err(error) => {
                                warn!(error = %error, "closing connection after unparseable message");
                                let _ = socket.send(Message::Close(None)).await;
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        debug!(error = %error, "websocket read failed");
                        break;
                    }
                }
            }
            command = outbound.recv() => {
                match command {
                    Some(Outbound::Text(payload)) => {
                        if let Err(error) = socket.send(Message::Text(payload.into())).await {
                            warn!(error = %error, "failed to push websocket message");
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    info!(conn_id = conn_id.as_deref().unwrap_or("-"), "websocket closed");
    if let Some(conn_id) = conn_id {
        dispatcher.handle_disconnect(&conn_id).await;
    }
}
