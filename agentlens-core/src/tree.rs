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

//! Run-tree lifecycle: create, post, end, patch, child creation.
//!
//! A [`RunTree`] owns one run record and the reporter it is destined for.
//! Ids are generated client-side at construction, so a child can be built
//! and start executing before its parent's start-report round-trips; a
//! failed `post` on the parent does not break the child's ability to
//! reference it.
//!
//! Error policy, per entry point: direct [`RunTree::post`] and
//! [`RunTree::patch`] propagate reporter failures to the caller. The
//! composite [`RunTree::trace`] treats reporting as best-effort (failures
//! are logged, the wrapped work still runs) and always propagates the
//! work's own error.

use std::fmt::Display;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context::{self, CurrentRun};
use crate::error::{LensError, Result};
use crate::reporter::Reporter;
use crate::run::{run_types, RunRecord, TraceOutcome};

/// One span and its lifecycle.
pub struct RunTree {
    run: RunRecord,
    reporter: Arc<dyn Reporter>,
    posted: bool,
}

impl RunTree {
    /// Start building a run with a fresh id and `start_time = now`.
    /// No network effect until [`RunTree::post`].
    pub fn builder(name: impl Into<String>, reporter: Arc<dyn Reporter>) -> RunTreeBuilder {
        RunTreeBuilder {
            run: RunRecord::new(name, run_types::CHAIN),
            reporter,
        }
    }

    pub fn id(&self) -> Uuid {
        self.run.id
    }

    pub fn record(&self) -> &RunRecord {
        &self.run
    }

    pub fn reporter(&self) -> Arc<dyn Reporter> {
        Arc::clone(&self.reporter)
    }

    /// Report the run's initial "started" state.
    ///
    /// Reporter failures propagate: a failed start-report means the trace is
    /// not actually recorded, and the caller gets to decide what that means.
    pub fn post(&mut self) -> Result<Value> {
        let response = self.reporter.create_run(&self.run)?;
        self.posted = true;
        tracing::debug!(run_id = %self.run.id, name = %self.run.name, "posted run");
        Ok(response)
    }

    /// Finish the run successfully. Local only; repeatable, last write wins.
    pub fn end(&mut self, outcome: TraceOutcome) {
        self.run.end_time = Some(Utc::now());
        self.run.outputs = Some(outcome.into_outputs());
        self.run.error = None;
    }

    /// Finish the run with an error. Local only; repeatable, last write wins.
    pub fn end_with_error(&mut self, error: impl Into<String>) {
        self.run.end_time = Some(Utc::now());
        self.run.error = Some(error.into());
        self.run.outputs = None;
    }

    /// Report the run's final state.
    ///
    /// Contract violation if the run was never posted; reporter failures
    /// propagate.
    pub fn patch(&mut self) -> Result<Value> {
        if !self.posted {
            return Err(LensError::ContractViolation(
                "patch() called on a run that was never posted".to_string(),
            ));
        }
        let response = self.reporter.update_run(&self.run)?;
        tracing::debug!(
            run_id = %self.run.id,
            status = self.run.status().as_str(),
            "patched run"
        );
        Ok(response)
    }

    /// Start building a child run.
    ///
    /// The child gets `parent_run_id = self.id` and inherits the session,
    /// project and reporter. Finish with [`RunTreeBuilder::build`] or
    /// [`RunTreeBuilder::post`].
    pub fn child(&self, name: impl Into<String>) -> RunTreeBuilder {
        let mut builder = Self::builder(name, Arc::clone(&self.reporter));
        builder.run.parent_run_id = Some(self.run.id);
        builder.run.session_id = self.run.session_id;
        builder.run.session_name = self.run.session_name.clone();
        builder.run.project_name = self.run.project_name.clone();
        builder
    }

    /// Wrap `work` in a child span.
    ///
    /// Creates and posts a child, installs it as the current run (saving the
    /// prior one), invokes `work` with it, then ends and patches the child
    /// according to the outcome. The work's error always propagates; the
    /// prior current run is restored on every path.
    pub fn trace<T, E, F>(
        &self,
        name: impl Into<String>,
        run_type: impl Into<String>,
        inputs: Map<String, Value>,
        work: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut RunTree) -> std::result::Result<T, E>,
        T: Serialize,
        E: Display,
    {
        let mut child = self
            .child(name)
            .with_run_type(run_type)
            .with_inputs(inputs)
            .build();
        run_scoped(&mut child, work)
    }

    /// Attach a feedback record to this run.
    pub fn add_feedback(
        &self,
        key: &str,
        value: impl Into<Value>,
        comment: Option<&str>,
    ) -> Result<Value> {
        self.reporter
            .create_feedback(self.run.id, key, value.into(), comment)
    }

    /// List feedback attached to this run.
    pub fn get_feedback(&self) -> Result<Vec<Value>> {
        self.reporter.list_run_feedback(self.run.id)
    }
}

/// Post `run`, install it as current, execute `work`, finalize and patch.
///
/// Shared by [`RunTree::trace`] and the top-level entry points. Reporting is
/// best-effort here: `post`/`patch` failures are logged and never abort or
/// mask the work. A `patch` failure on the error path in particular must not
/// hide that the work failed.
pub(crate) fn run_scoped<T, E, F>(run: &mut RunTree, work: F) -> std::result::Result<T, E>
where
    F: FnOnce(&mut RunTree) -> std::result::Result<T, E>,
    T: Serialize,
    E: Display,
{
    if let Err(err) = run.post() {
        tracing::warn!(run_id = %run.id(), error = %err, "failed to post run start");
    }
    let _guard = context::enter(CurrentRun::from_record(run.record()));

    let result = work(run);

    match &result {
        Ok(value) => {
            let outcome = match serde_json::to_value(value) {
                Ok(json) => TraceOutcome::from_value(json),
                Err(err) => {
                    tracing::warn!(run_id = %run.id(), error = %err, "unserializable output");
                    TraceOutcome::Scalar(Value::Null)
                }
            };
            run.end(outcome);
        }
        Err(err) => run.end_with_error(err.to_string()),
    }
    if let Err(err) = run.patch() {
        tracing::warn!(run_id = %run.id(), error = %err, "failed to patch run");
    }
    result
}

/// Builder for [`RunTree`], shared by root and child runs.
pub struct RunTreeBuilder {
    run: RunRecord,
    reporter: Arc<dyn Reporter>,
}

impl RunTreeBuilder {
    pub fn with_run_type(mut self, run_type: impl Into<String>) -> Self {
        self.run.run_type = run_type.into();
        self
    }

    pub fn with_inputs(mut self, inputs: Map<String, Value>) -> Self {
        self.run.inputs = inputs;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.run.tags = tags;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.run.metadata = metadata;
        self
    }

    pub fn with_parent_run_id(mut self, parent_run_id: Uuid) -> Self {
        self.run.parent_run_id = Some(parent_run_id);
        self
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.run.session_id = Some(session_id);
        self
    }

    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.run.session_name = Some(session_name.into());
        self
    }

    pub fn with_reference_example_id(mut self, example_id: Uuid) -> Self {
        self.run.reference_example_id = Some(example_id);
        self
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.run.project_name = Some(project_name.into());
        self
    }

    pub fn build(self) -> RunTree {
        RunTree {
            run: self.run,
            reporter: self.reporter,
            posted: false,
        }
    }

    /// Build and immediately report the "started" state.
    pub fn post(self) -> Result<RunTree> {
        let mut tree = self.build();
        tree.post()?;
        Ok(tree)
    }

    /// Build the run and wrap `work` in it.
    ///
    /// Same lifecycle as [`RunTree::trace`], for runs that need the full
    /// builder surface (tags, metadata, session) before executing.
    pub fn trace<T, E, F>(self, work: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut RunTree) -> std::result::Result<T, E>,
        T: Serialize,
        E: Display,
    {
        let mut run = self.build();
        run_scoped(&mut run, work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::InMemoryReporter;
    use crate::run::RunStatus;
    use serde_json::json;

    fn reporter() -> Arc<InMemoryReporter> {
        Arc::new(InMemoryReporter::new())
    }

    fn inputs(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_post_then_patch() {
        let reporter = reporter();
        let mut run = RunTree::builder("add", Arc::clone(&reporter) as Arc<dyn Reporter>)
            .with_inputs(inputs(json!({"a": 2, "b": 3})))
            .build();

        run.post().unwrap();
        run.end(TraceOutcome::from_value(json!(5)));
        run.patch().unwrap();

        let updated = reporter.find_update(run.id()).unwrap();
        assert_eq!(updated.status(), RunStatus::Completed);
        assert_eq!(updated.outputs.unwrap(), inputs(json!({"output": 5})));
        assert!(updated.error.is_none());
    }

    #[test]
    fn test_patch_before_post_is_contract_violation() {
        let mut run = RunTree::builder("x", reporter() as Arc<dyn Reporter>).build();
        run.end(TraceOutcome::from_value(json!(1)));
        assert!(matches!(
            run.patch(),
            Err(LensError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_end_is_last_write_wins() {
        let mut run = RunTree::builder("x", reporter() as Arc<dyn Reporter>).build();
        run.end(TraceOutcome::from_value(json!(1)));
        run.end_with_error("boom");
        assert_eq!(run.record().error.as_deref(), Some("boom"));
        assert!(run.record().outputs.is_none());

        run.end(TraceOutcome::from_value(json!(2)));
        assert!(run.record().error.is_none());
        assert_eq!(
            run.record().outputs.clone().unwrap(),
            inputs(json!({"output": 2}))
        );
    }

    #[test]
    fn test_child_inherits_session_and_project() {
        let session = Uuid::new_v4();
        let parent = RunTree::builder("parent", reporter() as Arc<dyn Reporter>)
            .with_session_id(session)
            .with_project_name("demo")
            .build();

        let child = parent.child("step").with_run_type(run_types::LLM).build();
        assert_eq!(child.record().parent_run_id, Some(parent.id()));
        assert_eq!(child.record().session_id, Some(session));
        assert_eq!(child.record().project_name.as_deref(), Some("demo"));
    }

    #[test]
    fn test_trace_propagates_work_error() {
        let reporter = reporter();
        let mut parent = RunTree::builder("outer", Arc::clone(&reporter) as Arc<dyn Reporter>)
            .build();
        parent.post().unwrap();

        let result: std::result::Result<Value, String> =
            parent.trace("inner", run_types::CHAIN, Map::new(), |_run| {
                Err("boom".to_string())
            });

        assert_eq!(result.unwrap_err(), "boom");
        let inner = reporter
            .updated_runs()
            .into_iter()
            .find(|run| run.name == "inner")
            .unwrap();
        assert_eq!(inner.status(), RunStatus::Error);
        assert_eq!(inner.error.as_deref(), Some("boom"));
        assert!(inner.outputs.is_none());
    }

    #[test]
    fn test_builder_trace_carries_tags_and_metadata() {
        let reporter = reporter();
        let parent = RunTree::builder("outer", Arc::clone(&reporter) as Arc<dyn Reporter>)
            .build();

        let result: std::result::Result<i64, String> = parent
            .child("step")
            .with_run_type(run_types::LLM)
            .with_tags(vec!["retry".into()])
            .with_metadata(inputs(json!({"attempt": 2})))
            .trace(|_run| Ok(7));

        assert_eq!(result.unwrap(), 7);
        let created = reporter.created_runs();
        assert_eq!(created[0].tags, vec!["retry".to_string()]);
        assert_eq!(created[0].metadata["attempt"], json!(2));
        assert_eq!(created[0].parent_run_id, Some(parent.id()));
    }

    #[test]
    fn test_feedback_round_trip() {
        let reporter = reporter();
        let run = RunTree::builder("x", Arc::clone(&reporter) as Arc<dyn Reporter>).build();
        run.add_feedback("thumbs", json!(1), Some("good")).unwrap();

        let feedback = run.get_feedback().unwrap();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0]["value"], json!(1));
        assert_eq!(feedback[0]["comment"], json!("good"));
    }
}
