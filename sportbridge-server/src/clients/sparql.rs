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

use super::{ensure_success, json_body, UpstreamError};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "SPARQL endpoint";

/// Media type of SPARQL 1.1 Query Results JSON
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// SPARQL protocol client for a single repository endpoint
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl SparqlClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Run a query via HTTP GET and return the results document untouched.
    ///
    /// The query text is sent as given; nothing is parsed or rewritten.
    pub async fn query(&self, sparql: &str) -> Result<Value, UpstreamError> {
        debug!(endpoint = %self.endpoint, len = sparql.len(), "Running SPARQL query");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("query", sparql)])
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_JSON)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;
        json_body(SERVICE, response).await
    }
}

/// The `results.bindings` array of a SELECT result, or an empty slice.
pub fn bindings(results: &Value) -> &[Value] {
    results
        .pointer("/results/bindings")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Lexical value of `var` in one binding row.
pub fn binding_value<'a>(binding: &'a Value, var: &str) -> Option<&'a str> {
    binding.get(var)?.get("value")?.as_str()
}
