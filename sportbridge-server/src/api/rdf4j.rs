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

//! `/rdf4j` routes: raw SPARQL passthrough and the AI player ranking.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiError, AppState};
use crate::ranking::{generate_ranking, RankingResponse};

pub fn rdf4j_router() -> Router<AppState> {
    Router::new()
        .route("/query", get(query_rdf4j))
        .route("/ranking", get(generate_player_ranking))
}

#[derive(Debug, Deserialize)]
pub struct SparqlQueryParams {
    pub sparql_query: String,
}

/// GET /rdf4j/query?sparql_query=...
///
/// The query text is forwarded verbatim and the result document is returned
/// unchanged.
pub async fn query_rdf4j(
    State(state): State<AppState>,
    Query(params): Query<SparqlQueryParams>,
) -> Result<Json<Value>, ApiError> {
    debug!(len = params.sparql_query.len(), "Forwarding SPARQL query");
    let results = state.sparql.query(&params.sparql_query).await?;
    Ok(Json(results))
}

/// GET /rdf4j/ranking - always 200, failures are reported in the body
pub async fn generate_player_ranking(State(state): State<AppState>) -> Json<RankingResponse> {
    Json(generate_ranking(&state.sparql, state.completion.as_ref(), &state.config.llm).await)
}
