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

//! AI player ranking: a fixed SPARQL selection of players flattened into
//! records and handed to a completion API.
//!
//! Every failure after the HTTP request has been accepted is reported inside
//! the JSON payload. The endpoint never answers with an error status.

use crate::clients::sparql::{binding_value, bindings};
use crate::clients::SparqlClient;
use crate::config::{is_placeholder_key, LLMConfig};
use crate::llm::{ChatMessage, CompletionProvider, CompletionRequest};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Nationality the ranking query is restricted to
pub const RANKED_NATIONALITY: &str = "American";

pub const RANKING_QUERY: &str = r#"
PREFIX schema: <http://schema.org/>
PREFIX ex: <http://example.org/>

SELECT ?teamName ?playerName ?playerHeight ?playerWeight ?playerNationality ?playerStats
WHERE {
    ?team a schema:SportsTeam ;
          schema:name ?teamName .

    ?team schema:member ?player .
    ?player schema:name ?playerName ;
            schema:nationality ?playerNationality .
    OPTIONAL { ?player schema:height ?playerHeight . }
    OPTIONAL { ?player schema:weight ?playerWeight . }
    OPTIONAL { ?player ex:stats ?playerStats . }

    FILTER(?playerNationality = "American")
}
ORDER BY ?teamName ?playerName
"#;

pub const SYSTEM_PROMPT: &str =
    "You are an expert sports analyst who builds objective rankings based on data.";

pub const NO_PLAYERS_MESSAGE: &str = "No players found in the triple store for the 2024 ranking";

const MISSING: &str = "N/A";

const KEY_SUGGESTION: &str =
    "Set OPENAI_API_KEY (or llm.openai_api_key in the config file) to a valid key";

/// One binding row flattened for the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub team: String,
    pub nationality: String,
    pub height: String,
    pub weight: String,
    pub stats: String,
}

impl PlayerSummary {
    fn from_binding(binding: &Value) -> Self {
        let field = |var: &str| binding_value(binding, var).unwrap_or(MISSING).to_string();
        Self {
            name: field("playerName"),
            team: field("teamName"),
            nationality: field("playerNationality"),
            height: field("playerHeight"),
            weight: field("playerWeight"),
            stats: field("playerStats"),
        }
    }
}

pub fn players_from_results(results: &Value) -> Vec<PlayerSummary> {
    bindings(results)
        .iter()
        .map(PlayerSummary::from_binding)
        .collect()
}

pub fn build_prompt(players: &[PlayerSummary]) -> String {
    let listing = players
        .iter()
        .map(|p| {
            format!(
                "- {} ({}) - Height: {}, Weight: {}, Stats: {}",
                p.name, p.team, p.height, p.weight, p.stats
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following sports players and create a ranking based on their 2024 statistics.

Players:
{listing}

Please:
1. Rank the players from 1 to {count} based on their performance
2. Explain the criteria used for the ranking
3. Give a short comment for each player in the top 5
4. Return the answer as JSON with the structure:
{{
    "ranking": [
        {{"position": 1, "name": "Player Name", "team": "Team Name", "score": 95, "comment": "Explanation"}},
        ...
    ],
    "criteria": "Explanation of the criteria used",
    "summary": "General summary of the analysis"
}}
"#,
        listing = listing,
        count = players.len()
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpenAIRanking {
    Ranked {
        openai_response: String,
        model_used: String,
        tokens_used: u32,
    },
    Failed {
        error: String,
        suggestion: String,
        debug_info: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RankingResponse {
    Ranked {
        original_data: Value,
        players_count: usize,
        openai_ranking: OpenAIRanking,
    },
    Failed {
        error: String,
    },
}

/// Ask the completion API for a ranking of `players`. `api_key` is the
/// key resolved for this call, if any.
pub async fn rank_players(
    provider: &dyn CompletionProvider,
    llm: &LLMConfig,
    api_key: Option<String>,
    players: &[PlayerSummary],
) -> OpenAIRanking {
    let api_key = match api_key {
        Some(key) if !is_placeholder_key(&key) => key,
        found => {
            warn!("Completion API key missing or placeholder");
            return OpenAIRanking::Failed {
                error: "OpenAI API key is not configured correctly".to_string(),
                suggestion: KEY_SUGGESTION.to_string(),
                debug_info: format!(
                    "API key found: {}",
                    if found.is_some() { "placeholder" } else { "no" }
                ),
            };
        }
    };

    let request = CompletionRequest {
        model: llm.model.clone(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(players)),
        ],
        max_tokens: llm.max_tokens,
        temperature: llm.temperature,
    };

    match provider.complete(&api_key, request).await {
        Ok(response) => OpenAIRanking::Ranked {
            openai_response: response.content,
            model_used: response.model,
            tokens_used: response.tokens_used,
        },
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "Completion call failed");
            OpenAIRanking::Failed {
                error: format!("OpenAI call failed: {}", e),
                suggestion: KEY_SUGGESTION.to_string(),
                debug_info: "API key found: yes".to_string(),
            }
        }
    }
}

/// Full ranking flow: query, flatten, rank.
pub async fn generate_ranking(
    sparql: &SparqlClient,
    provider: &dyn CompletionProvider,
    llm: &LLMConfig,
) -> RankingResponse {
    let results = match sparql.query(RANKING_QUERY).await {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "Ranking query failed");
            return RankingResponse::Failed {
                error: format!("Failed to generate ranking: {}", e),
            };
        }
    };

    let players = players_from_results(&results);
    if players.is_empty() {
        info!(nationality = RANKED_NATIONALITY, "Ranking query returned no players");
        return RankingResponse::Failed {
            error: NO_PLAYERS_MESSAGE.to_string(),
        };
    }

    info!(players = players.len(), "Requesting player ranking");
    let openai_ranking = rank_players(provider, llm, llm.resolve_api_key(), &players).await;

    RankingResponse::Ranked {
        original_data: results,
        players_count: players.len(),
        openai_ranking,
    }
}
