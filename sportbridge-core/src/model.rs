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

//! Records exchanged between the gateway and its three backing stores.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A sports team as stored in the JSON document store.
///
/// Optional fields are omitted from the wire form when absent so that the
/// store never receives explicit `null`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "foundingDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub founding_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach: Option<String>,
}

/// A player belonging to a [`Team`] through `team_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    pub team_id: i64,
}

/// Raw JSON object as returned by an upstream store.
pub type Record = Map<String, Value>;

/// Snapshot of both JSON store collections, carried verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestData {
    #[serde(default)]
    pub teams: Vec<Value>,
    #[serde(default)]
    pub players: Vec<Value>,
}

impl RestData {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty() && self.players.is_empty()
    }
}

/// One GraphQL document paired with its variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLBatchOperation {
    pub query: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl GraphQLBatchOperation {
    pub fn new(query: impl Into<String>, variables: Map<String, Value>) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

/// Aggregate outcome of a REST to GraphQL transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub message: String,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub total_operations: usize,
    pub validated_teams: usize,
    pub validated_players: usize,
    pub skipped_records: usize,
    pub batches: usize,
}

impl TransferSummary {
    pub fn completed(
        successful_operations: usize,
        failed_operations: usize,
        total_operations: usize,
    ) -> Self {
        Self {
            message: format!(
                "Transfer completed. {} successful, {} failed",
                successful_operations, failed_operations
            ),
            successful_operations,
            failed_operations,
            total_operations,
            ..Default::default()
        }
    }
}

/// Counts from a best-effort bulk delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    pub deleted_players: usize,
    pub deleted_teams: usize,
    pub failed: usize,
}
