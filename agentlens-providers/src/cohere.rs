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

//! Cohere v2 chat API.

use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::chat::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, ProviderError, Result, TokenUsage,
};
use crate::http::{build_http, env_api_key, post_json};

pub const ENV_CO_API_KEY: &str = "CO_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.cohere.com";

pub struct CohereClient {
    api_key: String,
    base_url: String,
    model: String,
    http: HttpClient,
}

impl CohereClient {
    /// Client with the key from `CO_API_KEY`.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let api_key = env_api_key(ENV_CO_API_KEY)?;
        Self::with_api_key(model, api_key)
    }

    pub fn with_api_key(model: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "Cohere API key must not be empty".into(),
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
struct ChatV2Response {
    message: MessageOut,
    finish_reason: Option<String>,
    usage: Usage,
}

#[derive(Deserialize)]
struct MessageOut {
    content: Vec<ContentBlock>,
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
    tokens: Tokens,
}

#[derive(Deserialize)]
struct Tokens {
    input_tokens: u32,
    output_tokens: u32,
}

impl ChatModel for CohereClient {
    fn provider(&self) -> &'static str {
        "cohere"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let url = format!("{}/v2/chat", self.base_url.trim_end_matches('/'));
        let auth = format!("Bearer {}", self.api_key);
        let response = post_json(&self.http, &url, &[("Authorization", &auth)], &body)?;
        let completion: ChatV2Response = serde_json::from_value(response)?;

        if completion.message.content.is_empty() {
            return Err(ProviderError::UnexpectedResponse(
                "no content blocks returned".into(),
            ));
        }
        let text = completion
            .message
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<String>();
        Ok(ChatResponse {
            message: ChatMessage::assistant(text),
            // v2/chat does not echo a resolved model name back.
            model: request.model.clone(),
            usage: TokenUsage::new(
                completion.usage.tokens.input_tokens,
                completion.usage.tokens.output_tokens,
            ),
            finish_reason: completion.finish_reason,
        })
    }
}
