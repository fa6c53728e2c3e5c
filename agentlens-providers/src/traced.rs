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

//! Auto-tracing decorator for chat models.
//!
//! Wraps any [`ChatModel`] so every completion is recorded as an `"llm"` run:
//! inputs are the request messages and model, outputs the reply and token
//! usage, with the provider/model pair in metadata. The parent comes from
//! the ambient current-run context, so completions made inside a traced
//! chain nest under it automatically.

use std::sync::Arc;

use serde_json::{json, Map};

use agentlens_core::{run_types, trace, Reporter, TraceOptions};

use crate::chat::{ChatModel, ChatRequest, ChatResponse, Result};

/// A [`ChatModel`] whose completions are traced.
pub struct TracedChatModel<M: ChatModel> {
    inner: M,
    reporter: Arc<dyn Reporter>,
    project_name: Option<String>,
}

impl<M: ChatModel> TracedChatModel<M> {
    pub fn new(inner: M, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            inner,
            reporter,
            project_name: None,
        }
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: ChatModel> ChatModel for TracedChatModel<M> {
    fn provider(&self) -> &'static str {
        self.inner.provider()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut inputs = Map::new();
        inputs.insert("model".to_string(), json!(request.model));
        inputs.insert("messages".to_string(), json!(request.messages));

        let mut metadata = Map::new();
        metadata.insert("provider".to_string(), json!(self.inner.provider()));
        metadata.insert("model".to_string(), json!(self.inner.model()));

        let mut options = TraceOptions::new(format!(
            "{}.{}",
            self.inner.provider(),
            request.model
        ))
        .with_run_type(run_types::LLM)
        .with_inputs(inputs)
        .with_metadata(metadata);
        if let Some(project_name) = &self.project_name {
            options = options.with_project_name(project_name.clone());
        }

        trace(options, Arc::clone(&self.reporter), |_run| {
            self.inner.complete(request)
        })
    }
}
