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

//! `/rest` routes: create and list teams and players in the JSON store.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use sportbridge_core::{ClearReport, Player, RestData, Team};
use tracing::{info, warn};

use crate::api::{ApiError, AppState, MessageResponse};
use crate::clients::json_store::{PLAYERS, TEAMS};
use crate::clients::UpstreamError;

pub fn rest_router() -> Router<AppState> {
    Router::new()
        .route("/teams", post(create_teams))
        .route("/players", post(create_players))
        .route("/data", get(get_data))
        .route("/clear", post(clear_data))
}

/// POST /rest/teams
pub async fn create_teams(
    State(state): State<AppState>,
    Json(teams): Json<Vec<Team>>,
) -> Result<impl IntoResponse, ApiError> {
    for team in &teams {
        state.json_store.create_team(team).await?;
    }
    info!(count = teams.len(), "Teams created");
    Ok(MessageResponse::new("Teams created successfully"))
}

/// POST /rest/players
pub async fn create_players(
    State(state): State<AppState>,
    Json(players): Json<Vec<Player>>,
) -> Result<impl IntoResponse, ApiError> {
    for player in &players {
        state.json_store.create_player(player).await?;
    }
    info!(count = players.len(), "Players created");
    Ok(MessageResponse::new("Players created successfully"))
}

/// GET /rest/data
pub async fn get_data(State(state): State<AppState>) -> Result<Json<RestData>, ApiError> {
    let data = state.json_store.fetch_all().await.map_err(fetch_error)?;
    Ok(Json(data))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: ClearReport,
}

/// POST /rest/clear - empty both collections, players first
pub async fn clear_data(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let data = state.json_store.fetch_all().await.map_err(fetch_error)?;

    let (deleted_players, failed_players) = delete_all(&state, PLAYERS, &data.players).await;
    let (deleted_teams, failed_teams) = delete_all(&state, TEAMS, &data.teams).await;

    let report = ClearReport {
        deleted_players,
        deleted_teams,
        failed: failed_players + failed_teams,
    };
    info!(
        deleted_players,
        deleted_teams,
        failed = report.failed,
        "JSON store cleared"
    );

    Ok(Json(ClearResponse {
        message: "Data cleared".to_string(),
        report,
    }))
}

async fn delete_all(state: &AppState, collection: &str, records: &[Value]) -> (usize, usize) {
    let mut deleted = 0;
    let mut failed = 0;
    for id in records.iter().filter_map(|record| record.get("id")) {
        match state.json_store.delete(collection, id).await {
            Ok(()) => deleted += 1,
            Err(e) => {
                failed += 1;
                warn!(collection, %id, error = %e, "Failed to delete record");
            }
        }
    }
    (deleted, failed)
}

fn fetch_error(err: UpstreamError) -> ApiError {
    if err.is_timeout() {
        ApiError::GatewayTimeout("Timeout while fetching data from JSON server".to_string())
    } else {
        ApiError::Internal(format!("Failed to fetch data from JSON server: {}", err))
    }
}
