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

use anyhow::Context;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{Client as DynamoClient, types::AttributeValue};
use chess_common::{GameRecord, GameStatus};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    matcher::SessionDirectory,
    session::{FinishedGame, GameOverHandler},
};

/// Storage for finished games.
#[async_trait]
pub trait GameRecordStore: Send + Sync {
    async fn save(&self, record: &GameRecord) -> anyhow::Result<()>;
    async fn get_by_session_id(&self, session_id: &str) -> anyhow::Result<Option<GameRecord>>;
    async fn list_by_player_id(&self, player_id: &str) -> anyhow::Result<Vec<GameRecord>>;
}

#[derive(Default)]
pub struct InMemoryGameRecordStore {
    records: RwLock<Vec<GameRecord>>,
}

#[async_trait]
impl GameRecordStore for InMemoryGameRecordStore {
    async fn save(&self, record: &GameRecord) -> anyhow::Result<()> {
        let mut records = self.records.write().await;
        records.retain(|existing| existing.session_id != record.session_id);
        records.push(record.clone());
        Ok(())
    }

    async fn get_by_session_id(&self, session_id: &str) -> anyhow::Result<Option<GameRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.session_id == session_id)
            .cloned())
    }

    async fn list_by_player_id(&self, player_id: &str) -> anyhow::Result<Vec<GameRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.involves(player_id))
            .cloned()
            .collect())
    }
}

/// One item per finished game, keyed by `session_id`. Moves are stored as a
/// JSON array string.
pub struct DynamoGameRecordStore {
    client: DynamoClient,
    table_name: String,
}

#[async_trait]
impl GameRecordStore for DynamoGameRecordStore {
    async fn save(&self, record: &GameRecord) -> anyhow::Result<()> {
        let mut item = HashMap::new();
        item.insert(
            "session_id".to_string(),
            AttributeValue::S(record.session_id.clone()),
        );
        item.insert(
            "player1_id".to_string(),
            AttributeValue::S(record.player1_id.clone()),
        );
        item.insert(
            "player2_id".to_string(),
            AttributeValue::S(record.player2_id.clone()),
        );
        item.insert(
            "moves".to_string(),
            AttributeValue::S(serde_json::to_string(&record.moves)?),
        );
        item.insert(
            "status".to_string(),
            AttributeValue::S(record.status.as_str().to_string()),
        );
        item.insert(
            "finished_at".to_string(),
            AttributeValue::S(record.finished_at.to_rfc3339()),
        );

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .context("failed to persist game record")?;
        Ok(())
    }

    async fn get_by_session_id(&self, session_id: &str) -> anyhow::Result<Option<GameRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("session_id", AttributeValue::S(session_id.to_string()))
            .send()
            .await
            .context("failed to load game record")?;
        output.item().map(record_from_item).transpose()
    }

    async fn list_by_player_id(&self, player_id: &str) -> anyhow::Result<Vec<GameRecord>> {
        let mut records = Vec::new();
        let mut start_key = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("player1_id = :player_id OR player2_id = :player_id")
                .expression_attribute_values(":player_id", AttributeValue::S(player_id.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .context("failed to scan game records")?;

            for item in output.items() {
                records.push(record_from_item(item)?);
            }
            start_key = output.last_evaluated_key().cloned();
            if start_key.is_none() {
                break;
            }
        }
        records.sort_by_key(|record| record.finished_at);
        Ok(records)
    }
}

fn string_attribute(item: &HashMap<String, AttributeValue>, key: &str) -> anyhow::Result<String> {
    item.get(key)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .with_context(|| format!("game record is missing {key}"))
}

fn record_from_item(item: &HashMap<String, AttributeValue>) -> anyhow::Result<GameRecord> {
    let moves: Vec<String> = serde_json::from_str(&string_attribute(item, "moves")?)
        .context("game record moves are not a JSON array")?;
    let status = string_attribute(item, "status")?;
    let finished_at = string_attribute(item, "finished_at")?;

    Ok(GameRecord {
        session_id: string_attribute(item, "session_id")?,
        player1_id: string_attribute(item, "player1_id")?,
        player2_id: string_attribute(item, "player2_id")?,
        moves,
        status: GameStatus::parse(&status)
            .with_context(|| format!("unknown game status {status}"))?,
        finished_at: DateTime::parse_from_rfc3339(&finished_at)
            .context("invalid finished_at")?
            .with_timezone(&Utc),
    })
}

/// DynamoDB when `DYNAMODB_ENDPOINT` or `AWS_REGION` is set, memory otherwise.
pub async fn load_record_store(table_name: &str) -> Arc<dyn GameRecordStore> {
    if std::env::var("DYNAMODB_ENDPOINT").is_err() && std::env::var("AWS_REGION").is_err() {
        info!("game records kept in memory");
        return Arc::new(InMemoryGameRecordStore::default());
    }

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Ok(endpoint) = std::env::var("DYNAMODB_ENDPOINT") {
        loader = loader.endpoint_url(endpoint);
    }
    let config = loader.load().await;

    info!(table_name = %table_name, "game records stored in DynamoDB");
    Arc::new(DynamoGameRecordStore {
        client: DynamoClient::new(&config),
        table_name: table_name.to_string(),
    })
}

/// Archives a finished game and forgets both players' session.
pub struct ArchiveOnGameOver {
    store: Arc<dyn GameRecordStore>,
    directory: SessionDirectory,
}

impl ArchiveOnGameOver {
    pub fn new(store: Arc<dyn GameRecordStore>, directory: SessionDirectory) -> Self {
        Self { store, directory }
    }
}

#[async_trait]
impl GameOverHandler for ArchiveOnGameOver {
    async fn on_game_over(&self, finished: FinishedGame) {
        self.directory.remove(&finished.white_player_id).await;
        self.directory.remove(&finished.black_player_id).await;

        let record = finished.into_record(Utc::now());
        match self.store.save(&record).await {
            Ok(()) => info!(
                session_id = %record.session_id,
                status = record.status.as_str(),
                moves = record.moves.len(),
                "game record saved"
            ),
            Err(error) => warn!(
                session_id = %record.session_id,
                error = %error,
                "failed to save game record"
            ),
        }
    }
}
