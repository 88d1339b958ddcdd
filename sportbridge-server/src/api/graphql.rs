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

//! `/graphql` routes: REST to GraphQL transfer and query passthrough.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::{ApiError, AppState};
use crate::clients::UpstreamError;
use crate::transfer::{TransferOutcome, TransferPipeline, GRAPHQL_DOWN_MESSAGE};

pub fn graphql_router() -> Router<AppState> {
    Router::new()
        .route("/transfer", post(transfer_to_graphql))
        .route("/query", post(query_graphql))
}

#[derive(Debug, Deserialize)]
pub struct GraphQLQuery {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
}

/// POST /graphql/transfer
pub async fn transfer_to_graphql(
    State(state): State<AppState>,
) -> Result<Json<TransferOutcome>, ApiError> {
    let outcome = TransferPipeline::new(
        &state.graphql,
        &state.json_store,
        state.config.transfer.batch_size,
        state.config.timeouts.transfer_fetch(),
    )
    .run()
    .await?;
    Ok(Json(outcome))
}

/// POST /graphql/query - forward a document and return the upstream body,
/// GraphQL `errors` included.
pub async fn query_graphql(
    State(state): State<AppState>,
    Json(request): Json<GraphQLQuery>,
) -> Result<Json<Value>, ApiError> {
    if !state.graphql.is_reachable().await {
        return Err(ApiError::ServiceUnavailable(GRAPHQL_DOWN_MESSAGE.to_string()));
    }

    state
        .graphql
        .execute(&request.query, request.variables.as_ref())
        .await
        .map(Json)
        .map_err(|e| match e {
            UpstreamError::Timeout { .. } => {
                ApiError::GatewayTimeout("Timeout while querying GraphQL server".to_string())
            }
            UpstreamError::Unreachable { .. } => {
                ApiError::ServiceUnavailable("GraphQL server not reachable".to_string())
            }
            other => ApiError::Internal(format!("GraphQL query failed: {}", other)),
        })
}
