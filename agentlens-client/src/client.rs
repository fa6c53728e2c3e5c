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

//! AgentLens platform client.
//!
//! Speaks plain JSON/HTTP to the hosted platform and implements the
//! [`Reporter`] boundary of the tracing core. Every call is one blocking
//! round-trip; there is no internal retry, queueing or batching. Delivery
//! is best-effort by design.

use reqwest::blocking::Client as HttpClient;
use reqwest::Method;
use serde_json::{json, Value};
use uuid::Uuid;

use agentlens_core::{LensError, Reporter, Result, RunRecord};

use crate::config::ClientConfig;

/// Blocking client for the AgentLens platform API.
pub struct LensClient {
    config: ClientConfig,
    http: HttpClient,
}

impl LensClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| LensError::Configuration(err.to_string()))?;
        Ok(Self { config, http })
    }

    /// Create a client from `AGENTLENS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        params: Option<&[(&str, String)]>,
    ) -> Result<Value> {
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
            .map_err(|err| LensError::Reporting(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(LensError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .map_err(|err| LensError::Reporting(err.to_string()))
    }

    /// Check platform health.
    pub fn health(&self) -> Result<Value> {
        self.request(Method::GET, "/api/v1/health", None, None)
    }

    /// Read a run back from the platform.
    pub fn read_run(&self, run_id: Uuid) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/api/v1/runs/{run_id}"),
            None,
            None,
        )
    }

    /// The run's serialized form plus the fields only the wire format carries.
    fn run_body(&self, run: &RunRecord) -> Result<Value> {
        let mut body = serde_json::to_value(run)?;
        body["status"] = json!(run.status().as_str());
        if run.project_name.is_none() {
            body["project_name"] = json!(self.config.project_name);
        }
        Ok(body)
    }
}

impl Reporter for LensClient {
    fn create_run(&self, run: &RunRecord) -> Result<Value> {
        let body = self.run_body(run)?;
        tracing::debug!(run_id = %run.id, "creating run");
        self.request(Method::POST, "/api/v1/runs", Some(body), None)
    }

    fn update_run(&self, run: &RunRecord) -> Result<Value> {
        let body = json!({
            "end_time": run.end_time,
            "outputs": run.outputs,
            "error": run.error,
            "status": run.status().as_str(),
        });
        tracing::debug!(run_id = %run.id, status = run.status().as_str(), "updating run");
        self.request(
            Method::PATCH,
            &format!("/api/v1/runs/{}", run.id),
            Some(body),
            None,
        )
    }

    fn create_feedback(
        &self,
        run_id: Uuid,
        key: &str,
        value: Value,
        comment: Option<&str>,
    ) -> Result<Value> {
        let body = json!({
            "run_id": run_id,
            "key": key,
            "value": value,
            "comment": comment,
        });
        self.request(Method::POST, "/api/v1/feedback", Some(body), None)
    }

    fn list_run_feedback(&self, run_id: Uuid) -> Result<Vec<Value>> {
        let params = [("run_id", run_id.to_string())];
        let response = self.request(Method::GET, "/api/v1/feedback", None, Some(&params))?;
        match response {
            Value::Array(items) => Ok(items),
            other => Err(LensError::Reporting(format!(
                "expected a feedback list, got: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlens_core::run_types;
    use agentlens_core::TraceOutcome;
    use agentlens_core::RunTree;
    use mockito::Matcher;
    use std::sync::Arc;

    fn client(server: &mockito::ServerGuard) -> LensClient {
        LensClient::new(ClientConfig::new(server.url(), "test-key").unwrap()).unwrap()
    }

    #[test]
    fn test_create_run_posts_started_state() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/v1/runs")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "name": "add",
                "run_type": "chain",
                "status": "started",
                "project_name": "default",
            })))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create();

        let client = client(&server);
        let run = RunRecord::new("add", run_types::CHAIN);
        let response = client.create_run(&run).unwrap();
        assert_eq!(response, json!({"ok": true}));
        mock.assert();
    }

    #[test]
    fn test_update_run_patches_final_state() {
        let mut server = mockito::Server::new();
        let client = client(&server);

        let mut run = RunTree::builder("x", Arc::new(agentlens_core::InMemoryReporter::new()))
            .build();
        run.end(TraceOutcome::from_value(json!(5)));
        let record = run.record().clone();

        let mock = server
            .mock("PATCH", format!("/api/v1/runs/{}", record.id).as_str())
            .match_body(Matcher::PartialJson(json!({
                "status": "completed",
                "outputs": {"output": 5},
            })))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create();

        client.update_run(&record).unwrap();
        mock.assert();
    }

    #[test]
    fn test_api_error_propagates_status_and_body() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/v1/runs")
            .with_status(401)
            .with_body("bad key")
            .create();

        let client = client(&server);
        let run = RunRecord::new("x", run_types::CHAIN);
        match client.create_run(&run) {
            Err(LensError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_feedback_round_trip() {
        let mut server = mockito::Server::new();
        let run_id = Uuid::new_v4();

        let create = server
            .mock("POST", "/api/v1/feedback")
            .match_body(Matcher::PartialJson(json!({
                "key": "thumbs",
                "value": 1,
                "comment": "good",
            })))
            .with_status(200)
            .with_body(r#"{"id": "f1"}"#)
            .create();
        let list = server
            .mock("GET", "/api/v1/feedback")
            .match_query(Matcher::UrlEncoded("run_id".into(), run_id.to_string()))
            .with_status(200)
            .with_body(r#"[{"key": "thumbs", "value": 1}]"#)
            .create();

        let client = client(&server);
        client
            .create_feedback(run_id, "thumbs", json!(1), Some("good"))
            .unwrap();
        let feedback = client.list_run_feedback(run_id).unwrap();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0]["key"], json!("thumbs"));

        create.assert();
        list.assert();
    }

    #[test]
    fn test_explicit_project_name_not_overridden() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/v1/runs")
            .match_body(Matcher::PartialJson(json!({"project_name": "research"})))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create();

        let client = client(&server);
        let mut run = RunRecord::new("x", run_types::CHAIN);
        run.project_name = Some("research".into());
        client.create_run(&run).unwrap();
        mock.assert();
    }
}
