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

mod api;
mod config;
mod connection;
mod dispatch;
mod error;
mod matcher;
mod records;
mod session;
mod transport;

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::ServerConfig,
    dispatch::Dispatcher,
    matcher::{Matcher, SessionDirectory},
    records::{ArchiveOnGameOver, GameRecordStore, load_record_store},
    session::SessionRegistry,
};

#[derive(Clone)]
struct AppState {
    dispatcher: Dispatcher,
    records: Arc<dyn GameRecordStore>,
}

impl AppState {
    /// Wire the matcher, the session registry and the game-over archive
    /// around a record store.
    fn new(records: Arc<dyn GameRecordStore>, config: &ServerConfig) -> Self {
        let directory = SessionDirectory::default();
        let archive = ArchiveOnGameOver::new(records.clone(), directory.clone());
        let registry = SessionRegistry::new(Arc::new(archive));
        let matcher = Matcher::new(registry.clone(), directory.clone(), config.matching_timeout);
        Self {
            dispatcher: Dispatcher::new(matcher, registry, directory),
            records,
        }
    }

    #[cfg(test)]
    fn for_records(records: Arc<dyn GameRecordStore>) -> Self {
        let config = ServerConfig {
            bind_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            matching_timeout: std::time::Duration::from_secs(5),
            records_table: "test_sessions".to_string(),
        };
        Self::new(records, &config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "game_server=debug,tower_http=info".to_string()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        matching_timeout_seconds = config.matching_timeout.as_secs(),
        records_table = %config.records_table,
        "game-server configuration loaded"
    );

    let records = load_record_store(&config.records_table).await;
    let app = build_router(AppState::new(records, &config));

    info!(bind_addr = %config.bind_addr, "game-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context(format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/ws", get(transport::ws_handler))
        .route("/v1/sessions", get(api::list_sessions_handler))
        .route("/v1/sessions/{session_id}", get(api::get_session_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
