// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{ChatMessage, ChatResponse, CompletionProvider, CompletionRequest};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client as OpenAIClient,
};
use std::time::Duration;
use tracing::info;

// OpenAI Provider
pub struct OpenAIProvider {
    api_base: String,
    timeout: Duration,
}

impl OpenAIProvider {
    /// `timeout` bounds each completion call, retries included.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_base: api_base.into(),
            timeout,
        }
    }

    fn client(&self, api_key: &str) -> OpenAIClient<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&self.api_base);
        OpenAIClient::with_config(config)
    }

    fn convert_messages(&self, messages: Vec<ChatMessage>) -> Vec<ChatCompletionRequestMessage> {
        messages
            .into_iter()
            .filter_map(|msg| match msg.role.as_str() {
                "system" => ChatCompletionRequestSystemMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .ok()
                    .map(ChatCompletionRequestMessage::System),
                "user" => ChatCompletionRequestUserMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .ok()
                    .map(ChatCompletionRequestMessage::User),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(
        &self,
        api_key: &str,
        request: CompletionRequest,
    ) -> anyhow::Result<ChatResponse> {
        let model_name = request.model.clone();

        let body = CreateChatCompletionRequestArgs::default()
            .model(&model_name)
            .messages(self.convert_messages(request.messages))
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build()?;

        let client = self.client(api_key);
        let response = tokio::time::timeout(self.timeout, client.chat().create(body))
            .await
            .map_err(|_| anyhow::anyhow!("request timed out after {}s", self.timeout.as_secs()))??;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();
        let tokens_used = response.usage.as_ref().map_or(0, |usage| usage.total_tokens);

        info!(model = %model_name, tokens_used, "Completion received");

        Ok(ChatResponse {
            content,
            model: model_name,
            tokens_used,
        })
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
