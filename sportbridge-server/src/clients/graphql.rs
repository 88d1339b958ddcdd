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

//! Client for the json-graphql-server endpoint.

use super::{ensure_success, json_body, UpstreamError};
use serde::Serialize;
use serde_json::{Map, Value};
use sportbridge_core::operations::{error_result, PROBE_QUERY};
use sportbridge_core::GraphQLBatchOperation;
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE: &str = "GraphQL server";

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct GraphQLClient {
    http: reqwest::Client,
    url: String,
    probe_timeout: Duration,
    timeout: Duration,
}

impl GraphQLClient {
    pub fn new(
        http: reqwest::Client,
        url: impl Into<String>,
        probe_timeout: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            probe_timeout,
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(
        &self,
        request: &GraphQLRequest<'_>,
        timeout: Duration,
    ) -> Result<reqwest::Response, UpstreamError> {
        self.http
            .post(&self.url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(SERVICE, e))
    }

    /// Send the introspection probe. Reachable means HTTP 200, nothing else.
    pub async fn is_reachable(&self) -> bool {
        let request = GraphQLRequest {
            query: PROBE_QUERY,
            variables: None,
        };
        match self.post(&request, self.probe_timeout).await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(url = %self.url, error = %e, "GraphQL probe failed");
                false
            }
        }
    }

    /// Execute one document and return the response body as-is, including
    /// any GraphQL `errors`. Only transport and HTTP failures are errors here.
    pub async fn execute(
        &self,
        query: &str,
        variables: Option<&Map<String, Value>>,
    ) -> Result<Value, UpstreamError> {
        let request = GraphQLRequest { query, variables };
        let response = self.post(&request, self.timeout).await?;
        let response = ensure_success(SERVICE, response).await?;
        json_body(SERVICE, response).await
    }

    pub async fn execute_operation(
        &self,
        operation: &GraphQLBatchOperation,
    ) -> Result<Value, UpstreamError> {
        self.execute(&operation.query, Some(&operation.variables))
            .await
    }

    /// Send operations one after another. Every operation yields exactly one
    /// result; transport failures become a synthetic `errors` document.
    pub async fn send_operations(&self, operations: &[GraphQLBatchOperation]) -> Vec<Value> {
        let mut results = Vec::with_capacity(operations.len());
        for operation in operations {
            let result = match self.execute_operation(operation).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "GraphQL operation did not complete");
                    error_result(match &e {
                        UpstreamError::Timeout { .. } => "GraphQL server timeout".to_string(),
                        UpstreamError::Unreachable { .. } => {
                            "GraphQL server not reachable".to_string()
                        }
                        other => other.to_string(),
                    })
                }
            };
            results.push(result);
        }
        results
    }
}
