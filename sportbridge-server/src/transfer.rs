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

//! REST to GraphQL transfer.
//!
//! Steps run strictly in order: probe, clear, fetch, validate, build, replay.
//! Clearing is best-effort and not atomic; a transfer interrupted midway can
//! leave the GraphQL store partially cleared.

use crate::api::ApiError;
use crate::clients::{GraphQLClient, JsonStoreClient, UpstreamError};
use serde::Serialize;
use serde_json::Value;
use sportbridge_core::operations::{
    delete_operation, DELETE_PLAYER_MUTATION, DELETE_TEAM_MUTATION, LIST_IDS_QUERY,
};
use sportbridge_core::{
    batch_count, build_operations, is_success, validate_all, validate_player, validate_team,
    ClearReport, GraphQLBatchOperation, RestData, TransferSummary, Validated,
};
use std::time::Duration;
use tracing::{info, warn};

pub const GRAPHQL_DOWN_MESSAGE: &str =
    "GraphQL server is not running. Please start json-graphql-server on port 3000.";

pub const NO_DATA_MESSAGE: &str = "No data found to transfer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TransferOutcome {
    NoData { message: String },
    Completed(TransferSummary),
}

pub struct TransferPipeline<'a> {
    graphql: &'a GraphQLClient,
    json_store: &'a JsonStoreClient,
    batch_size: usize,
    fetch_timeout: Duration,
}

impl<'a> TransferPipeline<'a> {
    pub fn new(
        graphql: &'a GraphQLClient,
        json_store: &'a JsonStoreClient,
        batch_size: usize,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            graphql,
            json_store,
            batch_size: batch_size.max(1),
            fetch_timeout,
        }
    }

    pub async fn run(&self) -> Result<TransferOutcome, ApiError> {
        self.ensure_reachable().await?;

        let cleared = self.clear_existing().await?;
        info!(
            deleted_players = cleared.deleted_players,
            deleted_teams = cleared.deleted_teams,
            failed = cleared.failed,
            "Cleared GraphQL store"
        );

        let data = self.fetch_source().await?;
        if data.is_empty() {
            info!("Nothing to transfer");
            return Ok(TransferOutcome::NoData {
                message: NO_DATA_MESSAGE.to_string(),
            });
        }

        let teams = validate_logged(&data.teams, validate_team);
        let players = validate_logged(&data.players, validate_player);
        let operations = build_operations(&teams.records, &players.records);

        let mut summary = self.replay(&operations).await;
        summary.validated_teams = teams.records.len();
        summary.validated_players = players.records.len();
        summary.skipped_records = teams.rejected.len() + players.rejected.len();

        info!(
            successful = summary.successful_operations,
            failed = summary.failed_operations,
            total = summary.total_operations,
            skipped = summary.skipped_records,
            "Transfer finished"
        );
        Ok(TransferOutcome::Completed(summary))
    }

    pub async fn ensure_reachable(&self) -> Result<(), ApiError> {
        if self.graphql.is_reachable().await {
            Ok(())
        } else {
            warn!(url = %self.graphql.url(), "GraphQL server unreachable");
            Err(ApiError::ServiceUnavailable(GRAPHQL_DOWN_MESSAGE.to_string()))
        }
    }

    /// Delete every player, then every team. Only a timeout while listing
    /// identifiers aborts the transfer.
    pub async fn clear_existing(&self) -> Result<ClearReport, ApiError> {
        let current = match self.graphql.execute(LIST_IDS_QUERY, None).await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                return Err(ApiError::GatewayTimeout(
                    "Timeout while clearing GraphQL data".to_string(),
                ));
            }
            Err(e) => {
                warn!(error = %e, "Could not list existing GraphQL data, skipping clear");
                return Ok(ClearReport::default());
            }
        };

        let player_ids = ids_at(&current, "/data/allPlayers");
        let team_ids = ids_at(&current, "/data/allTeams");

        let (deleted_players, failed_players) =
            self.delete_each("player", DELETE_PLAYER_MUTATION, &player_ids).await;
        let (deleted_teams, failed_teams) =
            self.delete_each("team", DELETE_TEAM_MUTATION, &team_ids).await;

        Ok(ClearReport {
            deleted_players,
            deleted_teams,
            failed: failed_players + failed_teams,
        })
    }

    async fn delete_each(&self, kind: &str, mutation: &str, ids: &[Value]) -> (usize, usize) {
        let mut deleted = 0;
        let mut failed = 0;
        for id in ids {
            let result = self
                .graphql
                .execute_operation(&delete_operation(mutation, id))
                .await;
            match result {
                Ok(body) if is_success(&body) => deleted += 1,
                Ok(body) => {
                    failed += 1;
                    warn!(kind, %id, errors = %body["errors"], "Failed to delete");
                }
                Err(e) => {
                    failed += 1;
                    warn!(kind, %id, error = %e, "Failed to delete");
                }
            }
        }
        (deleted, failed)
    }

    pub async fn fetch_source(&self) -> Result<RestData, ApiError> {
        self.json_store
            .fetch_all_within(self.fetch_timeout)
            .await
            .map_err(|e| match e {
                UpstreamError::Timeout { .. } => ApiError::GatewayTimeout(
                    "Timeout while fetching data from REST server".to_string(),
                ),
                other => ApiError::Internal(format!(
                    "Failed to fetch data from REST server: {}",
                    other
                )),
            })
    }

    /// Send operations in sequential batches and tally the results.
    pub async fn replay(&self, operations: &[GraphQLBatchOperation]) -> TransferSummary {
        let mut successful = 0;
        let mut failed = 0;

        for (index, batch) in operations.chunks(self.batch_size).enumerate() {
            let results = self.graphql.send_operations(batch).await;
            for result in &results {
                if is_success(result) {
                    successful += 1;
                } else {
                    failed += 1;
                    warn!(batch = index, %result, "GraphQL operation failed");
                }
            }
        }

        let mut summary = TransferSummary::completed(successful, failed, operations.len());
        summary.batches = batch_count(operations.len(), self.batch_size);
        summary
    }
}

fn validate_logged<F>(values: &[Value], validate: F) -> Validated
where
    F: Fn(&Value) -> Result<sportbridge_core::Record, sportbridge_core::ValidationError>,
{
    let validated = validate_all(values, validate);
    for e in &validated.rejected {
        warn!(reason = %e, "Skipping invalid record");
    }
    validated
}

fn ids_at(body: &Value, pointer: &str) -> Vec<Value> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|item| item.get("id").cloned()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::stalled_upstream;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const CREATED: &str = r#"{"data": {"createTeam": {"id": "1", "name": "x"}}}"#;

    fn graphql(server: &Server) -> GraphQLClient {
        GraphQLClient::new(
            reqwest::Client::new(),
            format!("{}/graphql", server.url()),
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
    }

    fn json_store(server: &Server) -> JsonStoreClient {
        JsonStoreClient::new(reqwest::Client::new(), server.url(), Duration::from_secs(5))
    }

    async fn mock_introspection(server: &mut Server) -> mockito::Mock {
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("__schema".into()))
            .with_status(200)
            .with_body(r#"{"data": {"__schema": {"types": []}}}"#)
            .create_async()
            .await
    }

    async fn mock_empty_store(server: &mut Server) {
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("allTeams".into()))
            .with_status(200)
            .with_body(r#"{"data": {"allTeams": [], "allPlayers": []}}"#)
            .create_async()
            .await;
    }

    async fn mock_source(server: &mut Server, teams: Value, players: Value) {
        server
            .mock("GET", "/teams")
            .with_status(200)
            .with_body(teams.to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/players")
            .with_status(200)
            .with_body(players.to_string())
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn test_single_team_and_player() {
        let mut gql = Server::new_async().await;
        let mut rest = Server::new_async().await;
        mock_introspection(&mut gql).await;
        mock_empty_store(&mut gql).await;
        let team_mock = gql
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("createTeam".into()))
            .with_status(200)
            .with_body(CREATED)
            .expect(1)
            .create_async()
            .await;
        let player_mock = gql
            .mock("POST", "/graphql")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("createPlayer".into()),
                Matcher::PartialJson(json!({"variables": {"name": "P", "team_id": 1}})),
            ]))
            .with_status(200)
            .with_body(r#"{"data": {"createPlayer": {"id": "1", "name": "P"}}}"#)
            .expect(1)
            .create_async()
            .await;
        mock_source(
            &mut rest,
            json!([{"name": "A"}]),
            json!([{"name": "P", "team_id": 1}]),
        )
        .await;

        let (g, j) = (graphql(&gql), json_store(&rest));
        let outcome = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .run()
            .await
            .unwrap();

        let TransferOutcome::Completed(summary) = outcome else {
            panic!("expected a completed transfer");
        };
        assert_eq!(summary.successful_operations, 2);
        assert_eq!(summary.failed_operations, 0);
        assert_eq!(summary.total_operations, 2);
        assert_eq!(summary.batches, 1);
        team_mock.assert_async().await;
        player_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_records_are_dropped() {
        let mut gql = Server::new_async().await;
        let mut rest = Server::new_async().await;
        mock_introspection(&mut gql).await;
        mock_empty_store(&mut gql).await;
        let creates = gql
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("create(Team|Player)".into()))
            .with_status(200)
            .with_body(CREATED)
            .expect(2)
            .create_async()
            .await;
        mock_source(
            &mut rest,
            json!([{"name": "A"}, {"id": 2, "sport": "Hockey"}]),
            json!([{"name": "P", "team_id": 1}, {"name": "Orphan"}, {"team_id": 1}]),
        )
        .await;

        let (g, j) = (graphql(&gql), json_store(&rest));
        let outcome = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .run()
            .await
            .unwrap();

        let TransferOutcome::Completed(summary) = outcome else {
            panic!("expected a completed transfer");
        };
        assert_eq!(summary.total_operations, 2);
        assert_eq!(summary.validated_teams, 1);
        assert_eq!(summary.validated_players, 1);
        assert_eq!(summary.skipped_records, 3);
        creates.assert_async().await;
    }

    #[tokio::test]
    async fn test_twenty_five_operations_use_three_batches() {
        let mut gql = Server::new_async().await;
        let rest = Server::new_async().await;
        let creates = gql
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("createTeam".into()))
            .with_status(200)
            .with_body(CREATED)
            .expect(25)
            .create_async()
            .await;

        let teams: Vec<_> = (0..25)
            .map(|i| json!({"name": format!("Team {i}")}).as_object().unwrap().clone())
            .collect();
        let operations = build_operations(&teams, &[]);

        let (g, j) = (graphql(&gql), json_store(&rest));
        let summary = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .replay(&operations)
            .await;

        assert_eq!(summary.batches, 3);
        assert_eq!(summary.successful_operations, 25);
        assert_eq!(summary.total_operations, 25);
        creates.assert_async().await;
    }

    #[tokio::test]
    async fn test_failures_do_not_halt_later_batches() {
        let mut gql = Server::new_async().await;
        let rest = Server::new_async().await;
        gql.mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({"variables": {"name": "Team 0"}})))
            .with_status(200)
            .with_body(r#"{"errors": [{"message": "duplicate"}]}"#)
            .create_async()
            .await;
        let rest_of_them = gql
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("Team [1-9]".into()))
            .with_status(200)
            .with_body(CREATED)
            .expect(11)
            .create_async()
            .await;

        let teams: Vec<_> = (0..12)
            .map(|i| json!({"name": format!("Team {i}")}).as_object().unwrap().clone())
            .collect();
        let operations = build_operations(&teams, &[]);

        let (g, j) = (graphql(&gql), json_store(&rest));
        let summary = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .replay(&operations)
            .await;

        assert_eq!(summary.failed_operations, 1);
        assert_eq!(summary.successful_operations, 11);
        assert_eq!(summary.message, "Transfer completed. 11 successful, 1 failed");
        rest_of_them.assert_async().await;
    }

    #[tokio::test]
    async fn test_clear_deletes_players_then_teams() {
        let mut gql = Server::new_async().await;
        let rest = Server::new_async().await;
        gql.mock("POST", "/graphql")
            .match_body(Matcher::Regex("allTeams".into()))
            .with_status(200)
            .with_body(
                json!({"data": {
                    "allTeams": [{"id": "1"}],
                    "allPlayers": [{"id": "1"}, {"id": "2"}]
                }})
                .to_string(),
            )
            .create_async()
            .await;
        let player_deletes = gql
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("deletePlayer".into()))
            .with_status(200)
            .with_body(r#"{"data": {"deletePlayer": {"id": "1"}}}"#)
            .expect(2)
            .create_async()
            .await;
        let team_deletes = gql
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("deleteTeam".into()))
            .with_status(200)
            .with_body(r#"{"errors": [{"message": "no such team"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let (g, j) = (graphql(&gql), json_store(&rest));
        let report = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .clear_existing()
            .await
            .unwrap();

        assert_eq!(
            report,
            ClearReport {
                deleted_players: 2,
                deleted_teams: 0,
                failed: 1
            }
        );
        player_deletes.assert_async().await;
        team_deletes.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_graphql_skips_everything() {
        let rest = Server::new_async().await;
        let g = GraphQLClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/graphql",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let j = json_store(&rest);

        let err = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_source_reports_no_data() {
        let mut gql = Server::new_async().await;
        let mut rest = Server::new_async().await;
        mock_introspection(&mut gql).await;
        mock_empty_store(&mut gql).await;
        mock_source(&mut rest, json!([]), json!([])).await;

        let (g, j) = (graphql(&gql), json_store(&rest));
        let outcome = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .run()
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"message": "No data found to transfer"})
        );
    }

    #[tokio::test]
    async fn test_source_failure_maps_to_internal() {
        let mut gql = Server::new_async().await;
        let mut rest = Server::new_async().await;
        mock_introspection(&mut gql).await;
        mock_empty_store(&mut gql).await;
        rest.mock("GET", "/teams")
            .with_status(503)
            .with_body("down for maintenance")
            .create_async()
            .await;

        let (g, j) = (graphql(&gql), json_store(&rest));
        let err = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .run()
            .await
            .unwrap_err();

        match err {
            ApiError::Internal(message) => {
                assert!(message.starts_with("Failed to fetch data from REST server"));
                assert!(message.contains("down for maintenance"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_source_fetch_timeout() {
        let mut gql = Server::new_async().await;
        mock_introspection(&mut gql).await;
        mock_empty_store(&mut gql).await;
        let store = stalled_upstream(false).await;

        let g = graphql(&gql);
        let j = JsonStoreClient::new(reqwest::Client::new(), store, Duration::from_secs(5));
        let err = TransferPipeline::new(&g, &j, 10, Duration::from_secs(1))
            .run()
            .await
            .unwrap_err();

        match err {
            ApiError::GatewayTimeout(message) => {
                assert_eq!(message, "Timeout while fetching data from REST server");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clear_listing_timeout() {
        let rest = Server::new_async().await;
        let g = GraphQLClient::new(
            reqwest::Client::new(),
            format!("{}/graphql", stalled_upstream(false).await),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let j = json_store(&rest);

        let err = TransferPipeline::new(&g, &j, 10, Duration::from_secs(5))
            .clear_existing()
            .await
            .unwrap_err();

        match err {
            ApiError::GatewayTimeout(message) => {
                assert_eq!(message, "Timeout while clearing GraphQL data");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ids_at_skips_entries_without_id() {
        let body = json!({"data": {"allTeams": [{"id": "1"}, {"name": "x"}, {"id": 3}]}});
        assert_eq!(ids_at(&body, "/data/allTeams"), vec![json!("1"), json!(3)]);
        assert!(ids_at(&body, "/data/allPlayers").is_empty());
    }
}
