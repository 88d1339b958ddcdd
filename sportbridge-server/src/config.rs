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

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API key values that ship in sample `.env` files and never authenticate
pub const PLACEHOLDER_API_KEYS: &[&str] = &["your-api-key-here", "YOUR_ACTUAL_API_KEY"];

/// Sportbridge Gateway Configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub llm: LLMConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP listen address (e.g., "127.0.0.1:8000")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable permissive CORS (any origin, method and header)
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

/// Locations of the three data services
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// JSON document store base URL (json-server)
    #[serde(default = "default_json_store_url")]
    pub json_store_url: String,

    /// SPARQL 1.1 query endpoint of the RDF4J repository
    #[serde(default = "default_sparql_url")]
    pub sparql_url: String,

    /// GraphQL endpoint (json-graphql-server)
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
}

/// Outbound call timeouts, in seconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_probe_timeout")]
    pub graphql_probe_secs: u64,

    #[serde(default = "default_graphql_timeout")]
    pub graphql_secs: u64,

    #[serde(default = "default_json_store_timeout")]
    pub json_store_secs: u64,

    /// Timeout for pulling source data at the start of a transfer
    #[serde(default = "default_transfer_fetch_timeout")]
    pub transfer_fetch_secs: u64,

    #[serde(default = "default_sparql_timeout")]
    pub sparql_secs: u64,

    #[serde(default = "default_llm_timeout")]
    pub llm_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferConfig {
    /// Operations per GraphQL batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LLMConfig {
    /// OpenAI API key. When unset, OPENAI_API_KEY is read on every call.
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_json_store_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_sparql_url() -> String {
    "http://localhost:8080/rdf4j-server/repositories/grafexamen".to_string()
}

fn default_graphql_url() -> String {
    "http://localhost:3000/graphql".to_string()
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_graphql_timeout() -> u64 {
    10
}

fn default_json_store_timeout() -> u64 {
    10
}

fn default_transfer_fetch_timeout() -> u64 {
    100
}

fn default_sparql_timeout() -> u64 {
    30
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_batch_size() -> usize {
    sportbridge_core::DEFAULT_BATCH_SIZE
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u16 {
    1500
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            json_store_url: default_json_store_url(),
            sparql_url: default_sparql_url(),
            graphql_url: default_graphql_url(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            graphql_probe_secs: default_probe_timeout(),
            graphql_secs: default_graphql_timeout(),
            json_store_secs: default_json_store_timeout(),
            transfer_fetch_secs: default_transfer_fetch_timeout(),
            sparql_secs: default_sparql_timeout(),
            llm_secs: default_llm_timeout(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl TimeoutConfig {
    pub fn graphql_probe(&self) -> Duration {
        Duration::from_secs(self.graphql_probe_secs)
    }

    pub fn graphql(&self) -> Duration {
        Duration::from_secs(self.graphql_secs)
    }

    pub fn json_store(&self) -> Duration {
        Duration::from_secs(self.json_store_secs)
    }

    pub fn transfer_fetch(&self) -> Duration {
        Duration::from_secs(self.transfer_fetch_secs)
    }

    pub fn sparql(&self) -> Duration {
        Duration::from_secs(self.sparql_secs)
    }

    pub fn llm(&self) -> Duration {
        Duration::from_secs(self.llm_secs)
    }
}

impl LLMConfig {
    /// Resolve the API key at call time: the configured key wins, otherwise
    /// OPENAI_API_KEY is read from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with<F>(&self, var: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.openai_api_key
            .clone()
            .or_else(|| var("OPENAI_API_KEY"))
    }
}

/// True when the key is absent in practice: empty or a known placeholder.
pub fn is_placeholder_key(key: &str) -> bool {
    key.trim().is_empty() || PLACEHOLDER_API_KEYS.contains(&key)
}

impl GatewayConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with priority: env > file > defaults
    ///
    /// Supported environment variables:
    /// - SPORTBRIDGE_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:8000)
    /// - SPORTBRIDGE_JSON_STORE_URL: JSON store base URL
    /// - SPORTBRIDGE_SPARQL_URL: SPARQL endpoint URL
    /// - SPORTBRIDGE_GRAPHQL_URL: GraphQL endpoint URL
    /// - SPORTBRIDGE_ENABLE_CORS: Enable CORS (default: true)
    /// - OPENAI_API_BASE: OpenAI-compatible API base URL
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        Ok(config.merge_with_env(|name| std::env::var(name).ok()))
    }

    /// Override fields whose environment variable is set
    fn merge_with_env<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = var("SPORTBRIDGE_HTTP_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Some(cors) = var("SPORTBRIDGE_ENABLE_CORS") {
            self.server.enable_cors = cors.parse().unwrap_or(true);
        }
        if let Some(url) = var("SPORTBRIDGE_JSON_STORE_URL") {
            self.upstream.json_store_url = url;
        }
        if let Some(url) = var("SPORTBRIDGE_SPARQL_URL") {
            self.upstream.sparql_url = url;
        }
        if let Some(url) = var("SPORTBRIDGE_GRAPHQL_URL") {
            self.upstream.graphql_url = url;
        }
        if let Some(base) = var("OPENAI_API_BASE") {
            self.llm.api_base = base;
        }
        self
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        for (name, value) in [
            ("upstream.json_store_url", &self.upstream.json_store_url),
            ("upstream.sparql_url", &self.upstream.sparql_url),
            ("upstream.graphql_url", &self.upstream.graphql_url),
            ("llm.api_base", &self.llm.api_base),
        ] {
            url::Url::parse(value)
                .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", name, value, e))?;
        }

        if self.transfer.batch_size == 0 {
            anyhow::bail!("transfer.batch_size must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.upstream.json_store_url, "http://localhost:4000");
        assert_eq!(config.upstream.graphql_url, "http://localhost:3000/graphql");
        assert_eq!(config.transfer.batch_size, 10);
        assert_eq!(config.timeouts.graphql_probe(), Duration::from_secs(5));
        assert_eq!(config.timeouts.transfer_fetch(), Duration::from_secs(100));
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            graphql_url = "http://graphql.internal:3000/graphql"

            [transfer]
            batch_size = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.graphql_url, "http://graphql.internal:3000/graphql");
        assert_eq!(config.upstream.json_store_url, "http://localhost:4000");
        assert_eq!(config.transfer.batch_size, 25);
        assert_eq!(config.timeouts.graphql_secs, 10);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SPORTBRIDGE_HTTP_ADDR", "0.0.0.0:9000"),
            ("SPORTBRIDGE_GRAPHQL_URL", "http://gql:3000/graphql"),
            ("SPORTBRIDGE_ENABLE_CORS", "false"),
        ]
        .into_iter()
        .collect();

        let config = GatewayConfig::default()
            .merge_with_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.upstream.graphql_url, "http://gql:3000/graphql");
        assert!(!config.server.enable_cors);
        assert_eq!(config.upstream.sparql_url, default_sparql_url());
    }

    #[test]
    fn test_api_key_resolution_order() {
        let from_env = |name: &str| (name == "OPENAI_API_KEY").then(|| "sk-env".to_string());
        let nothing = |_: &str| None;

        let mut llm = LLMConfig::default();
        assert_eq!(llm.resolve_api_key_with(nothing), None);
        assert_eq!(llm.resolve_api_key_with(from_env).as_deref(), Some("sk-env"));

        llm.openai_api_key = Some("sk-file".to_string());
        assert_eq!(llm.resolve_api_key_with(from_env).as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.server.listen_addr = "not-an-addr".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.upstream.sparql_url = "localhost without scheme".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.transfer.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_placeholder_keys() {
        assert!(is_placeholder_key("your-api-key-here"));
        assert!(is_placeholder_key("YOUR_ACTUAL_API_KEY"));
        assert!(is_placeholder_key("  "));
        assert!(!is_placeholder_key("sk-live-123"));
    }
}
