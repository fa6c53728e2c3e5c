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

//! Prompt hub: pull and push named templates.

use std::collections::HashMap;

use parking_lot::RwLock;
use reqwest::blocking::Client as HttpClient;
use reqwest::Method;
use serde_json::json;

use agentlens_client::ClientConfig;

use crate::error::PromptError;
use crate::template::PromptTemplate;

/// Storage of named, versioned prompt templates.
pub trait PromptStore: Send + Sync {
    /// Fetch a template by name; latest version unless one is named.
    fn pull(&self, name: &str, version: Option<&str>) -> Result<PromptTemplate, PromptError>;

    /// Store a new version of a template, returning its version tag.
    fn push(&self, template: &PromptTemplate) -> Result<String, PromptError>;
}

/// Prompt hub over the platform HTTP API.
pub struct HubClient {
    config: ClientConfig,
    http: HttpClient,
}

impl HubClient {
    pub fn new(config: ClientConfig) -> Result<Self, PromptError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PromptError::Hub(err.to_string()))?;
        Ok(Self { config, http })
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        params: Option<&[(&str, String)]>,
    ) -> Result<serde_json::Value, PromptError> {
        let url = format!("{}{}", self.config.url.trim_end_matches('/'), path);

        let mut request = self
            .http
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.config.api_key);
        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .map_err(|err| PromptError::Hub(err.to_string()))?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(PromptError::NotFound(url));
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(PromptError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .map_err(|err| PromptError::Hub(err.to_string()))
    }
}

impl PromptStore for HubClient {
    fn pull(&self, name: &str, version: Option<&str>) -> Result<PromptTemplate, PromptError> {
        let params = version.map(|v| [("version", v.to_string())]);
        let response = self.request(
            Method::GET,
            &format!("/api/v1/prompts/{name}"),
            None,
            params.as_ref().map(|p| p.as_slice()),
        )?;
        let template = serde_json::from_value(response)?;
        tracing::debug!(prompt = name, "pulled prompt");
        Ok(template)
    }

    fn push(&self, template: &PromptTemplate) -> Result<String, PromptError> {
        let body = json!({"messages": template.messages});
        let response = self.request(
            Method::POST,
            &format!("/api/v1/prompts/{}", template.name),
            Some(body),
            None,
        )?;
        let version = response["version"]
            .as_str()
            .ok_or_else(|| PromptError::Hub("push response carried no version".to_string()))?
            .to_string();
        tracing::debug!(prompt = %template.name, version = %version, "pushed prompt");
        Ok(version)
    }
}

/// In-memory prompt store for tests and offline use.
#[derive(Default)]
pub struct InMemoryPromptStore {
    prompts: RwLock<HashMap<String, Vec<PromptTemplate>>>,
}

impl InMemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PromptStore for InMemoryPromptStore {
    fn pull(&self, name: &str, version: Option<&str>) -> Result<PromptTemplate, PromptError> {
        let prompts = self.prompts.read();
        let versions = prompts
            .get(name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))?;
        let template = match version {
            Some(version) => versions.iter().find(|t| t.version == version),
            None => versions.last(),
        };
        template
            .cloned()
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    fn push(&self, template: &PromptTemplate) -> Result<String, PromptError> {
        let mut prompts = self.prompts.write();
        let versions = prompts.entry(template.name.clone()).or_default();
        let mut stored = template.clone();
        stored.version = format!("v{}", versions.len() + 1);
        let version = stored.version.clone();
        versions.push(stored);
        Ok(version)
    }
}
