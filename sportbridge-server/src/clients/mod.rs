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

//! Outbound clients for the services the gateway fronts.
//!
//! Every client shares one `reqwest::Client` connection pool and applies a
//! per-request timeout. Failures are classified into [`UpstreamError`] so the
//! HTTP layer can pick a status code without inspecting transport details.

pub mod graphql;
pub mod json_store;
pub mod sparql;

pub use graphql::GraphQLClient;
pub use json_store::JsonStoreClient;
pub use sparql::SparqlClient;

use serde_json::Value;

/// Errors from calls to a downstream service
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} not reachable: {message}")]
    Unreachable {
        service: &'static str,
        message: String,
    },

    #[error("{service} timed out: {message}")]
    Timeout {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} request failed: {message}")]
    Request {
        service: &'static str,
        message: String,
    },
}

impl UpstreamError {
    /// Classify a transport error raised while talking to `service`.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout { service, message }
        } else if err.is_connect() {
            Self::Unreachable { service, message }
        } else {
            Self::Request { service, message }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Turn a non-2xx response into [`UpstreamError::Status`], keeping the body.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

/// Read a JSON body, classifying decode failures as request errors.
pub(crate) async fn json_body(
    service: &'static str,
    response: reqwest::Response,
) -> Result<Value, UpstreamError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| UpstreamError::from_reqwest(service, e))
}

/// Render a record identifier as a URL path segment.
pub(crate) fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_segment() {
        assert_eq!(id_segment(&json!(12)), "12");
        assert_eq!(id_segment(&json!("a1")), "a1");
    }

    #[tokio::test]
    async fn test_connect_failure_is_unreachable() {
        // Port 1 is reserved and nothing listens on it.
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();

        let err = UpstreamError::from_reqwest("JSON store", err);
        assert!(err.is_unreachable());
        assert!(err.to_string().starts_with("JSON store not reachable"));
    }

    #[test]
    fn test_status_message_embeds_body() {
        let err = UpstreamError::Status {
            service: "GraphQL server",
            status: 400,
            body: "bad query".to_string(),
        };
        assert_eq!(err.to_string(), "GraphQL server returned HTTP 400: bad query");
        assert!(!err.is_timeout());
    }
}
