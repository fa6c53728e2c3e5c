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

//! The reporter boundary: persistence of run and feedback records.
//!
//! The tracing core never talks to the platform directly; it hands finished
//! state to a [`Reporter`]. Responses are opaque JSON mappings. The core does
//! not retry failed calls; retry policy, if any, belongs to the implementation.

use parking_lot::RwLock;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::Result;
use crate::run::RunRecord;

/// Persists run create/update and feedback calls to the platform.
pub trait Reporter: Send + Sync {
    /// Report a run's initial "started" state.
    fn create_run(&self, run: &RunRecord) -> Result<Value>;

    /// Report a run's final state after it ended.
    fn update_run(&self, run: &RunRecord) -> Result<Value>;

    /// Attach a feedback record to a run.
    fn create_feedback(
        &self,
        run_id: Uuid,
        key: &str,
        value: Value,
        comment: Option<&str>,
    ) -> Result<Value>;

    /// List feedback previously attached to a run.
    fn list_run_feedback(&self, run_id: Uuid) -> Result<Vec<Value>>;
}

/// A feedback record held by [`InMemoryReporter`].
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub run_id: Uuid,
    pub key: String,
    pub value: Value,
    pub comment: Option<String>,
}

/// In-memory reporter for tests and offline use.
///
/// Records every call so assertions can inspect what would have been sent.
#[derive(Default)]
pub struct InMemoryReporter {
    created: RwLock<Vec<RunRecord>>,
    updated: RwLock<Vec<RunRecord>>,
    feedback: RwLock<Vec<FeedbackRecord>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of runs reported as started, in report order.
    pub fn created_runs(&self) -> Vec<RunRecord> {
        self.created.read().clone()
    }

    /// Snapshot of runs reported as finished, in report order.
    pub fn updated_runs(&self) -> Vec<RunRecord> {
        self.updated.read().clone()
    }

    /// The final reported state of a run, if it was patched.
    pub fn find_update(&self, run_id: Uuid) -> Option<RunRecord> {
        self.updated
            .read()
            .iter()
            .rev()
            .find(|run| run.id == run_id)
            .cloned()
    }

    pub fn feedback_records(&self) -> Vec<FeedbackRecord> {
        self.feedback.read().clone()
    }
}

impl Reporter for InMemoryReporter {
    fn create_run(&self, run: &RunRecord) -> Result<Value> {
        self.created.write().push(run.clone());
        Ok(json!({"id": run.id, "status": "started"}))
    }

    fn update_run(&self, run: &RunRecord) -> Result<Value> {
        self.updated.write().push(run.clone());
        Ok(json!({"id": run.id, "status": run.status().as_str()}))
    }

    fn create_feedback(
        &self,
        run_id: Uuid,
        key: &str,
        value: Value,
        comment: Option<&str>,
    ) -> Result<Value> {
        self.feedback.write().push(FeedbackRecord {
            run_id,
            key: key.to_string(),
            value: value.clone(),
            comment: comment.map(str::to_string),
        });
        Ok(json!({"run_id": run_id, "key": key}))
    }

    fn list_run_feedback(&self, run_id: Uuid) -> Result<Vec<Value>> {
        Ok(self
            .feedback
            .read()
            .iter()
            .filter(|record| record.run_id == run_id)
            .map(|record| {
                json!({
                    "run_id": record.run_id,
                    "key": record.key,
                    "value": record.value,
                    "comment": record.comment,
                })
            })
            .collect())
    }
}
