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

//! OpenAI chat completions.

use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::chat::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, ProviderError, Result, TokenUsage,
};
use crate::http::{build_http, env_api_key, post_json};

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    http: HttpClient,
}

impl OpenAiClient {
    /// Client with the key from `OPENAI_API_KEY`.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let api_key = env_api_key(ENV_OPENAI_API_KEY)?;
        Self::with_api_key(model, api_key)
    }

    pub fn with_api_key(model: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "OpenAI API key must not be empty".into(),
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
struct CompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatModel for OpenAiClient {
    fn provider(&self) -> &'static str {
        "openai"
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

        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let auth = format!("Bearer {}", self.api_key);
        let response = post_json(&self.http, &url, &[("Authorization", &auth)], &body)?;
        let completion: CompletionResponse = serde_json::from_value(response)?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::UnexpectedResponse("no choices returned".into()))?;
        Ok(ChatResponse {
            message: choice.message,
            model: completion.model,
            usage: TokenUsage::new(
                completion.usage.prompt_tokens,
                completion.usage.completion_tokens,
            ),
            finish_reason: choice.finish_reason,
        })
    }
}
