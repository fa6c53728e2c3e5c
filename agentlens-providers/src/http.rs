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

//! Shared plumbing for the vendor HTTP clients.

use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use serde_json::Value;

use crate::chat::{ProviderError, Result};

pub(crate) fn build_http() -> Result<HttpClient> {
    HttpClient::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|err| ProviderError::Configuration(err.to_string()))
}

pub(crate) fn env_api_key(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| ProviderError::Configuration(format!("{var} is not set")))
}

/// One blocking POST with vendor headers; non-2xx becomes an API error.
pub(crate) fn post_json(
    http: &HttpClient,
    url: &str,
    headers: &[(&str, &str)],
    body: &Value,
) -> Result<Value> {
    let mut request = http.post(url).json(body);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    tracing::debug!(url, "sending provider request");

    let response = request
        .send()
        .map_err(|err| ProviderError::Http(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json()
        .map_err(|err| ProviderError::Http(err.to_string()))
}
