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

//! Tool invocation tracing.
//!
//! Tools are externally supplied callables dispatched from inside an
//! LLM-response-handling loop. That loop already knows the active run id,
//! so [`TracedTool::call`] takes the parent explicitly per call instead of
//! reading the ambient context.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::context::{self, CurrentRun};
use crate::reporter::Reporter;
use crate::run::{run_types, TraceOutcome};
use crate::tree::RunTree;

/// An externally supplied callable (e.g. a function-calling target).
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn call(&self, input: Value) -> anyhow::Result<Value>;
}

/// Wraps a [`Tool`] so every invocation is executed and traced as a
/// `"tool"`-typed run.
pub struct TracedTool<T: Tool> {
    tool: T,
    reporter: Arc<dyn Reporter>,
    project_name: Option<String>,
}

impl<T: Tool> TracedTool<T> {
    pub fn new(tool: T, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            tool,
            reporter,
            project_name: None,
        }
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Execute the tool and trace the invocation.
    ///
    /// The tool's declared name and description land in the run metadata;
    /// the parent is the explicit `parent_run_id` argument, or none (a root
    /// run) when the dispatcher has no active run. Reporting is best-effort;
    /// the tool's own error propagates.
    pub fn call(&self, input: Value, parent_run_id: Option<Uuid>) -> anyhow::Result<Value> {
        let mut metadata = Map::new();
        metadata.insert("tool_name".to_string(), json!(self.tool.name()));
        if let Some(description) = self.tool.description() {
            metadata.insert("tool_description".to_string(), json!(description));
        }

        let mut inputs = Map::new();
        inputs.insert("input".to_string(), input.clone());

        let mut builder = RunTree::builder(self.tool.name(), Arc::clone(&self.reporter))
            .with_run_type(run_types::TOOL)
            .with_inputs(inputs)
            .with_metadata(metadata);
        if let Some(parent_run_id) = parent_run_id {
            builder = builder.with_parent_run_id(parent_run_id);
        }
        if let Some(project_name) = &self.project_name {
            builder = builder.with_project_name(project_name.clone());
        }
        let mut run = builder.build();

        if let Err(err) = run.post() {
            tracing::warn!(tool = %self.tool.name(), error = %err, "failed to post tool run");
        }
        let result = {
            // Nested traced calls made by the tool see this run as current.
            let _guard = context::enter(CurrentRun::from_record(run.record()));
            self.tool.call(input)
        };

        match &result {
            Ok(output) => run.end(TraceOutcome::from_value(output.clone())),
            Err(err) => run.end_with_error(err.to_string()),
        }
        if let Err(err) = run.patch() {
            tracing::warn!(tool = %self.tool.name(), error = %err, "failed to patch tool run");
        }
        result
    }
}
