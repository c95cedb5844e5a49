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

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use chess_common::{DEFAULT_MATCHING_TIMEOUT_SECONDS, expand_env_vars};
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_BIND: &str = "0.0.0.0:7202";
const DEFAULT_RECORDS_TABLE: &str = "chess_sessions";

/// Optional YAML file named by `CHESS_SERVER_CONFIG_PATH`.
#[derive(Debug, Default, Deserialize)]
struct ServerConfigFile {
    bind: Option<String>,
    matching_timeout_seconds: Option<u64>,
    records_table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub matching_timeout: Duration,
    pub records_table: String,
}

impl ServerConfig {
    /// Environment variables win over the config file.
    pub fn from_env() -> anyhow::Result<Self> {
        let file = load_config_file();
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    fn resolve(
        file: ServerConfigFile,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind = non_empty("CHESS_SERVER_BIND")
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .context(format!("invalid CHESS_SERVER_BIND {bind}"))?;

        let matching_timeout_seconds = non_empty("MATCHING_TIMEOUT_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .or(file.matching_timeout_seconds)
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MATCHING_TIMEOUT_SECONDS);

        let records_table = non_empty("GAME_RECORDS_TABLE")
            .or(file.records_table)
            .unwrap_or_else(|| DEFAULT_RECORDS_TABLE.to_string());

        Ok(Self {
            bind_addr,
            matching_timeout: Duration::from_secs(matching_timeout_seconds),
            records_table,
        })
    }
}

fn load_config_file() -> ServerConfigFile {
    let Some(path) = std::env::var("CHESS_SERVER_CONFIG_PATH")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    else {
        return ServerConfigFile::default();
    };

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) => {
            warn!(path = %path, error = %error, "failed to read server config file");
            return ServerConfigFile::default();
        }
    };

    match parse_config_file(&raw) {
        Ok(file) => {
            info!(path = %path, "loaded server config file");
            file
        }
        Err(error) => {
            warn!(path = %path, error = %error, "failed to parse server config yaml");
            ServerConfigFile::default()
        }
    }
}

fn parse_config_file(raw: &str) -> Result<ServerConfigFile, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(ServerConfigFile::default());
    }
    serde_yaml::from_str(&expand_env_vars(raw))
}
