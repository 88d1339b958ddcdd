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

//! Sportbridge gateway: one HTTP front for a JSON document store, a SPARQL
//! triple store and a GraphQL server, plus an AI player ranking.

pub mod api;
pub mod clients;
pub mod config;
pub mod llm;
pub mod ranking;
pub mod transfer;

use anyhow::Result;
use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{graphql_router, health, rdf4j_router, rest_router, AppState};
use config::GatewayConfig;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sportbridge_server=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    let _ = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
}

/// Full application router with the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let enable_cors = state.config.server.enable_cors;

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/rest", rest_router())
        .nest("/rdf4j", rdf4j_router())
        .nest("/graphql", graphql_router())
        .with_state(state)
        .layer(if enable_cors {
            // Wildcard origins cannot be combined with credentials.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
        })
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: GatewayConfig) -> Result<()> {
    tracing::info!("Starting Sportbridge gateway");

    config.validate()?;
    let addr = config.socket_addr()?;

    tracing::info!(
        json_store = %config.upstream.json_store_url,
        sparql = %config.upstream.sparql_url,
        graphql = %config.upstream.graphql_url,
        "Upstream services"
    );
    if config.llm.resolve_api_key().is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; /rdf4j/ranking will report a key error");
    }

    let state = AppState::new(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
