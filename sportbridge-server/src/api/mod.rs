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

//! HTTP surface of the gateway.

pub mod graphql;
pub mod health;
pub mod rdf4j;
pub mod rest;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::clients::{GraphQLClient, JsonStoreClient, SparqlClient, UpstreamError};
use crate::config::GatewayConfig;
use crate::llm::{CompletionProvider, OpenAIProvider};

pub use graphql::graphql_router;
pub use rdf4j::rdf4j_router;
pub use rest::rest_router;

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::ServiceUnavailable(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::Internal(msg) => msg,
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), %detail, "Request failed");
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// The frontend reads `detail` from every error body.
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unreachable { .. } => ApiError::ServiceUnavailable(err.to_string()),
            UpstreamError::Timeout { .. } => ApiError::GatewayTimeout(err.to_string()),
            UpstreamError::Status { .. } | UpstreamError::Request { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

/// Plain `{"message": ...}` success body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub json_store: JsonStoreClient,
    pub sparql: SparqlClient,
    pub graphql: GraphQLClient,
    pub completion: Arc<dyn CompletionProvider>,
}

impl AppState {
    /// Build every upstream client from `config`. The data-service clients
    /// share one connection pool.
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let completion: Arc<dyn CompletionProvider> = Arc::new(OpenAIProvider::new(
            &config.llm.api_base,
            config.timeouts.llm(),
        ));

        Ok(Self {
            json_store: JsonStoreClient::new(
                http.clone(),
                &config.upstream.json_store_url,
                config.timeouts.json_store(),
            ),
            sparql: SparqlClient::new(
                http.clone(),
                &config.upstream.sparql_url,
                config.timeouts.sparql(),
            ),
            graphql: GraphQLClient::new(
                http,
                &config.upstream.graphql_url,
                config.timeouts.graphql_probe(),
                config.timeouts.graphql(),
            ),
            completion,
            config: Arc::new(config),
        })
    }

    pub fn with_completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion = provider;
        self
    }
}
