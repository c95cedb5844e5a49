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

use chess_common::OutboundEnvelope;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What the socket task should do next for a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Send side of one client connection. Cloning shares the connection; the
/// socket task owns the receiving end and performs the actual I/O, so
/// sending never blocks the caller.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, envelope: &OutboundEnvelope) {
        let payload = match serde_json::to_string(envelope) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "failed to encode outbound envelope");
                return;
            }
        };
        if self.tx.send(Outbound::Text(payload)).is_err() {
            debug!("dropping message for closed connection");
        }
    }

    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

#[cfg(test)]
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut received = Vec::new();
    while let Ok(message) = rx.try_recv() {
        received.push(message);
    }
    received
}

/// Decoded envelopes among the drained messages, in order.
#[cfg(test)]
pub(crate) fn drain_envelopes(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<OutboundEnvelope> {
    drain(rx)
        .into_iter()
        .filter_map(|message| match message {
            Outbound::Text(payload) => serde_json::from_str(&payload).ok(),
            Outbound::Close => None,
        })
        .collect()
}
