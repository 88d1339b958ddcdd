// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Client for the json-server document store holding `teams` and `players`.

use super::{ensure_success, id_segment, json_body, UpstreamError};
use serde::Serialize;
use serde_json::Value;
use sportbridge_core::{Player, RestData, Team};
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "JSON server";

pub const TEAMS: &str = "teams";
pub const PLAYERS: &str = "players";

#[derive(Debug, Clone)]
pub struct JsonStoreClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl JsonStoreClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    async fn create<T: Serialize>(&self, collection: &str, record: &T) -> Result<(), UpstreamError> {
        let response = self
            .http
            .post(self.collection_url(collection))
            .timeout(self.timeout)
            .json(record)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(SERVICE, e))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    pub async fn create_team(&self, team: &Team) -> Result<(), UpstreamError> {
        debug!(team = %team.name, "Creating team");
        self.create(TEAMS, team).await
    }

    pub async fn create_player(&self, player: &Player) -> Result<(), UpstreamError> {
        debug!(player = %player.name, team_id = player.team_id, "Creating player");
        self.create(PLAYERS, player).await
    }

    /// Fetch a whole collection. The store must answer with a JSON array.
    pub async fn list(&self, collection: &str, timeout: Duration) -> Result<Vec<Value>, UpstreamError> {
        let response = self
            .http
            .get(self.collection_url(collection))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        match json_body(SERVICE, response).await? {
            Value::Array(items) => Ok(items),
            other => Err(UpstreamError::Request {
                service: SERVICE,
                message: format!("expected a JSON array for /{}, got {}", collection, other),
            }),
        }
    }

    /// Teams then players, each list exactly as the store returned it.
    pub async fn fetch_all(&self) -> Result<RestData, UpstreamError> {
        self.fetch_all_within(self.timeout).await
    }

    pub async fn fetch_all_within(&self, timeout: Duration) -> Result<RestData, UpstreamError> {
        let teams = self.list(TEAMS, timeout).await?;
        let players = self.list(PLAYERS, timeout).await?;
        Ok(RestData { teams, players })
    }

    pub async fn delete(&self, collection: &str, id: &Value) -> Result<(), UpstreamError> {
        let url = format!("{}/{}", self.collection_url(collection), id_segment(id));
        let response = self
            .http
            .delete(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(SERVICE, e))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}
