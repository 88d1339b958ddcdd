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

//! GraphQL documents used by the transfer flow and the builders that turn
//! validated records into [`GraphQLBatchOperation`]s.

use crate::model::{GraphQLBatchOperation, Record};
use serde_json::{Map, Value};

/// Default number of operations sent per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Introspection probe used to decide whether the GraphQL server is up
pub const PROBE_QUERY: &str = "{ __schema { types { name } } }";

/// Lists every identifier currently held by the GraphQL store
pub const LIST_IDS_QUERY: &str = "{ allTeams { id } allPlayers { id } }";

pub const DELETE_PLAYER_MUTATION: &str =
    "mutation DeletePlayer($id: ID!) { deletePlayer(id: $id) { id } }";

pub const DELETE_TEAM_MUTATION: &str =
    "mutation DeleteTeam($id: ID!) { deleteTeam(id: $id) { id } }";

pub const CREATE_TEAM_MUTATION: &str = r#"
mutation CreateTeam($name: String!, $url: String!, $description: String!,
                    $foundingDate: String!, $sport: String!, $location: String!, $coach: String!) {
    createTeam(
        name: $name,
        url: $url,
        description: $description,
        foundingDate: $foundingDate,
        sport: $sport,
        location: $location,
        coach: $coach
    ) {
        id
        name
    }
}
"#;

pub const CREATE_PLAYER_MUTATION: &str = r#"
mutation CreatePlayer($name: String!, $height: String!, $weight: String!,
                      $nationality: String!, $team_id: Int!) {
    createPlayer(
        name: $name,
        height: $height,
        weight: $weight,
        nationality: $nationality,
        team_id: $team_id
    ) {
        id
        name
    }
}
"#;

const TEAM_OPTIONAL_FIELDS: &[&str] = &[
    "url",
    "description",
    "foundingDate",
    "sport",
    "location",
    "coach",
];

const PLAYER_OPTIONAL_FIELDS: &[&str] = &["height", "weight", "nationality"];

// Mutation variables are declared non-null, so absent and null both become "".
fn field_or_empty(record: &Record, field: &str) -> Value {
    match record.get(field) {
        Some(Value::Null) | None => Value::String(String::new()),
        Some(value) => value.clone(),
    }
}

fn field_or_null(record: &Record, field: &str) -> Value {
    record.get(field).cloned().unwrap_or(Value::Null)
}

/// Build the `CreateTeam` operation for a validated team record.
pub fn team_operation(team: &Record) -> GraphQLBatchOperation {
    let mut variables = Map::new();
    variables.insert("name".to_string(), field_or_null(team, "name"));
    for &field in TEAM_OPTIONAL_FIELDS {
        variables.insert(field.to_string(), field_or_empty(team, field));
    }
    GraphQLBatchOperation::new(CREATE_TEAM_MUTATION, variables)
}

/// Build the `CreatePlayer` operation for a validated player record.
pub fn player_operation(player: &Record) -> GraphQLBatchOperation {
    let mut variables = Map::new();
    variables.insert("name".to_string(), field_or_null(player, "name"));
    for &field in PLAYER_OPTIONAL_FIELDS {
        variables.insert(field.to_string(), field_or_empty(player, field));
    }
    variables.insert("team_id".to_string(), field_or_null(player, "team_id"));
    GraphQLBatchOperation::new(CREATE_PLAYER_MUTATION, variables)
}

/// All create operations for a transfer: teams first, then players.
pub fn build_operations(teams: &[Record], players: &[Record]) -> Vec<GraphQLBatchOperation> {
    teams
        .iter()
        .map(team_operation)
        .chain(players.iter().map(player_operation))
        .collect()
}

/// Delete operation for one identifier returned by [`LIST_IDS_QUERY`].
pub fn delete_operation(mutation: &str, id: &Value) -> GraphQLBatchOperation {
    let mut variables = Map::new();
    variables.insert("id".to_string(), id.clone());
    GraphQLBatchOperation::new(mutation, variables)
}

/// Number of batches needed for `total` operations.
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}

/// A GraphQL response counts as a success when it is an object with no
/// `errors` key, whatever that key holds.
pub fn is_success(result: &Value) -> bool {
    result
        .as_object()
        .is_some_and(|obj| !obj.contains_key("errors"))
}

/// Synthetic GraphQL error document for failures that never reached the
/// server's resolver layer.
pub fn error_result(message: impl Into<String>) -> Value {
    serde_json::json!({ "errors": [ { "message": message.into() } ] })
}
