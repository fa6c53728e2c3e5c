// Copyright 2025 AgentLens (https://github.com/agentlens)
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

//! Anthropic messages API.
//!
//! Shape differences from the neutral request: system messages are hoisted
//! into the top-level `system` field, `max_tokens` is mandatory, and the
//! reply text arrives as a list of content blocks.

use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::chat::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, ProviderError, Result, TokenUsage,
};
use crate::http::{build_http, env_api_key, post_json};

pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    model: String,
    http: HttpClient,
}

impl AnthropicClient {
    /// Client with the key from `ANTHROPIC_API_KEY`.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let api_key = env_api_key(ENV_ANTHROPIC_API_KEY)?;
        Self::with_api_key(model, api_key)
    }

    pub fn with_api_key(model: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "Anthropic API key must not be empty".into(),
            ));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            http: build_http()?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ChatModel for AnthropicClient {
    fn provider(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let (system, messages): (Vec<_>, Vec<_>) = request
            .messages
            .iter()
            .partition(|message| message.role == "system");

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": messages,
        });
        if !system.is_empty() {
            let system_text = system
                .iter()
                .map(|message| message.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            body["system"] = json!(system_text);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let response = post_json(
            &self.http,
            &url,
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", API_VERSION),
            ],
            &body,
        )?;
        let completion: MessagesResponse = serde_json::from_value(response)?;

        let text = completion
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<String>();
        if completion.content.is_empty() {
            return Err(ProviderError::UnexpectedResponse(
                "no content blocks returned".into(),
            ));
        }
        Ok(ChatResponse {
            message: ChatMessage::assistant(text),
            model: completion.model,
            usage: TokenUsage::new(completion.usage.input_tokens, completion.usage.output_tokens),
            finish_reason: completion.stop_reason,
        })
    }
}
