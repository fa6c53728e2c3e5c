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

//! Client configuration.

use std::time::Duration;

use agentlens_core::{LensError, Result};

/// Environment variable holding the platform base URL.
pub const ENV_API_URL: &str = "AGENTLENS_API_URL";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "AGENTLENS_API_KEY";
/// Environment variable holding the default project name.
pub const ENV_PROJECT: &str = "AGENTLENS_PROJECT";

const DEFAULT_API_URL: &str = "https://api.agentlens.dev";
const DEFAULT_PROJECT: &str = "default";

/// AgentLens client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the AgentLens platform.
    pub url: String,
    /// API key; sent as the `x-api-key` header.
    pub api_key: String,
    /// Project runs land in when the record names none.
    pub project_name: String,
    /// Request timeout (default: 30 seconds).
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a new client configuration.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LensError::Configuration("API key must not be empty".into()));
        }
        Ok(Self {
            url: url.into(),
            api_key,
            project_name: DEFAULT_PROJECT.to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    /// Read the configuration from `AGENTLENS_*` environment variables.
    ///
    /// A missing API key is a configuration error; the URL and project fall
    /// back to defaults.
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = std::env::var(ENV_API_KEY).map_err(|_| {
            LensError::Configuration(format!("{ENV_API_KEY} is not set"))
        })?;
        let mut config = Self::new(url, api_key)?;
        if let Ok(project) = std::env::var(ENV_PROJECT) {
            config.project_name = project;
        }
        Ok(config)
    }

    /// Set the default project name.
    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = project_name.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
