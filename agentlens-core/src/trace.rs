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

//! Top-level trace entry points.
//!
//! [`trace`] wraps a block of work in a span without requiring the caller to
//! hold a [`RunTree`]. The parent is resolved from the explicit option if
//! given, else from the thread's current run, else the span becomes a root
//! trace.
//!
//! Error policy: [`trace`] always propagates the work's error after
//! recording and reporting it, matching [`RunTree::trace`]. Callers that
//! want fire-and-forget instrumentation use [`trace_best_effort`], which
//! records and logs the error and returns `None` instead.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context::{self, CurrentRun};
use crate::reporter::Reporter;
use crate::run::{run_types, TraceOutcome};
use crate::tree::{run_scoped, RunTree};

/// Options for a top-level trace.
#[derive(Debug, Clone)]
pub struct TraceOptions {
    name: String,
    run_type: String,
    inputs: Map<String, Value>,
    tags: Vec<String>,
    metadata: Map<String, Value>,
    parent_run_id: Option<Uuid>,
    project_name: Option<String>,
    session_id: Option<Uuid>,
    session_name: Option<String>,
    auto_end: bool,
}

impl TraceOptions {
    /// Options for a `"chain"` run with the given name; `auto_end` on.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_type: run_types::CHAIN.to_string(),
            inputs: Map::new(),
            tags: Vec::new(),
            metadata: Map::new(),
            parent_run_id: None,
            project_name: None,
            session_id: None,
            session_name: None,
            auto_end: true,
        }
    }

    pub fn with_run_type(mut self, run_type: impl Into<String>) -> Self {
        self.run_type = run_type.into();
        self
    }

    pub fn with_inputs(mut self, inputs: Map<String, Value>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_parent_run_id(mut self, parent_run_id: Uuid) -> Self {
        self.parent_run_id = Some(parent_run_id);
        self
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = Some(session_name.into());
        self
    }

    /// When off, the caller must end and patch the run inside `work`.
    pub fn with_auto_end(mut self, auto_end: bool) -> Self {
        self.auto_end = auto_end;
        self
    }

    /// Resolve the effective parent and build the run tree.
    ///
    /// When the parent comes from the ambient context, grouping fields the
    /// caller left unset are inherited from it as well.
    fn into_tree(self, reporter: Arc<dyn Reporter>) -> (RunTree, bool) {
        let ambient = if self.parent_run_id.is_none() {
            context::current_run()
        } else {
            None
        };

        let mut builder = RunTree::builder(self.name, reporter)
            .with_run_type(self.run_type)
            .with_inputs(self.inputs)
            .with_tags(self.tags)
            .with_metadata(self.metadata);

        if let Some(parent_run_id) = self.parent_run_id {
            builder = builder.with_parent_run_id(parent_run_id);
        } else if let Some(ambient) = &ambient {
            builder = builder.with_parent_run_id(ambient.id);
        }

        let inherited = ambient.as_ref();
        if let Some(session_id) = self
            .session_id
            .or_else(|| inherited.and_then(|run| run.session_id))
        {
            builder = builder.with_session_id(session_id);
        }
        if let Some(session_name) = self
            .session_name
            .or_else(|| inherited.and_then(|run| run.session_name.clone()))
        {
            builder = builder.with_session_name(session_name);
        }
        if let Some(project_name) = self
            .project_name
            .or_else(|| inherited.and_then(|run| run.project_name.clone()))
        {
            builder = builder.with_project_name(project_name);
        }

        (builder.build(), self.auto_end)
    }
}

/// Wrap `work` in a span.
///
/// Constructs and posts a run, installs it as the thread's current run
/// (saving the prior one), invokes `work` with it, ends and patches it
/// according to the outcome, and restores the prior current run on every
/// path. Reporting is best-effort: a failed start-report never prevents the
/// work from executing. The work's error propagates to the caller.
pub fn trace<T, E, F>(
    options: TraceOptions,
    reporter: Arc<dyn Reporter>,
    work: F,
) -> std::result::Result<T, E>
where
    F: FnOnce(&mut RunTree) -> std::result::Result<T, E>,
    T: Serialize,
    E: Display,
{
    let (mut run, auto_end) = options.into_tree(reporter);
    if auto_end {
        return run_scoped(&mut run, work);
    }

    // Manual lifecycle: post and install context, but leave end/patch to
    // the work itself.
    if let Err(err) = run.post() {
        tracing::warn!(run_id = %run.id(), error = %err, "failed to post run start");
    }
    let _guard = context::enter(CurrentRun::from_record(run.record()));
    work(&mut run)
}

/// Like [`trace`], but swallows the work's error after recording it.
///
/// The run still ends with the error text and is patched with status
/// "error"; the error itself is logged and `None` is returned. For
/// auto-instrumentation paths where a traced failure must not abort the
/// surrounding business logic.
pub fn trace_best_effort<T, E, F>(
    options: TraceOptions,
    reporter: Arc<dyn Reporter>,
    work: F,
) -> Option<T>
where
    F: FnOnce(&mut RunTree) -> std::result::Result<T, E>,
    T: Serialize,
    E: Display,
{
    let name = options.name.clone();
    match trace(options, reporter, work) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(run = %name, error = %err, "traced work failed");
            None
        }
    }
}

/// Convenience: a run ended by hand inside `work` when `auto_end` is off.
pub fn end_and_patch(run: &mut RunTree, outcome: TraceOutcome) {
    run.end(outcome);
    if let Err(err) = run.patch() {
        tracing::warn!(run_id = %run.id(), error = %err, "failed to patch run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::InMemoryReporter;
    use crate::run::RunStatus;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_trace_success_scalar_output() {
        let reporter = Arc::new(InMemoryReporter::new());
        let result: Result<i64, String> = trace(
            TraceOptions::new("add").with_inputs(object(json!({"a": 2, "b": 3}))),
            reporter.clone(),
            |_run| Ok(2 + 3),
        );

        assert_eq!(result.unwrap(), 5);
        let created = reporter.created_runs();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "add");
        assert!(created[0].parent_run_id.is_none());

        let updated = reporter.find_update(created[0].id).unwrap();
        assert_eq!(updated.status(), RunStatus::Completed);
        assert_eq!(updated.outputs.unwrap(), object(json!({"output": 5})));
        assert!(updated.error.is_none());
    }

    #[test]
    fn test_trace_mapping_output_used_as_is() {
        let reporter = Arc::new(InMemoryReporter::new());
        let result: Result<Value, String> = trace(
            TraceOptions::new("outer"),
            reporter.clone(),
            |run| {
                let inner: Result<Value, String> =
                    run.trace("inner", run_types::CHAIN, Map::new(), |_| {
                        Ok(json!({"sum": 5}))
                    });
                inner.unwrap();
                Ok(json!({"total": 5}))
            },
        );

        assert_eq!(result.unwrap(), json!({"total": 5}));
        let outer = reporter
            .updated_runs()
            .into_iter()
            .find(|run| run.name == "outer")
            .unwrap();
        assert_eq!(outer.outputs.unwrap(), object(json!({"total": 5})));
    }

    #[test]
    fn test_nested_parent_linkage_and_restoration() {
        let reporter = Arc::new(InMemoryReporter::new());
        assert!(context::current_run().is_none());

        let _: Result<(), String> = trace(TraceOptions::new("a"), reporter.clone(), |outer| {
            let outer_id = outer.id();
            assert_eq!(context::current_run_id(), Some(outer_id));
            let _: Result<(), String> =
                trace(TraceOptions::new("b"), outer.reporter(), |inner| {
                    assert_eq!(inner.record().parent_run_id, Some(outer_id));
                    assert_eq!(context::current_run_id(), Some(inner.id()));
                    Ok(())
                });
            // After the nested trace closes the outer run is current again.
            assert_eq!(context::current_run_id(), Some(outer_id));
            Ok(())
        });

        assert!(context::current_run().is_none());
    }

    #[test]
    fn test_trace_propagates_error() {
        let reporter = Arc::new(InMemoryReporter::new());
        let result: Result<Value, String> =
            trace(TraceOptions::new("x"), reporter.clone(), |_run| {
                Err("boom".to_string())
            });

        assert_eq!(result.unwrap_err(), "boom");
        let run = reporter.created_runs()[0].clone();
        let updated = reporter.find_update(run.id).unwrap();
        assert_eq!(updated.status(), RunStatus::Error);
        assert_eq!(updated.error.as_deref(), Some("boom"));
        assert!(context::current_run().is_none());
    }

    #[test]
    fn test_trace_best_effort_swallows_error() {
        let reporter = Arc::new(InMemoryReporter::new());
        let result: Option<Value> =
            trace_best_effort(TraceOptions::new("x"), reporter.clone(), |_run| {
                Err::<Value, _>("boom".to_string())
            });

        assert!(result.is_none());
        let updated = reporter.updated_runs();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status(), RunStatus::Error);
        assert_eq!(updated[0].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_explicit_parent_wins_over_context() {
        let reporter = Arc::new(InMemoryReporter::new());
        let explicit = Uuid::new_v4();

        let _: Result<(), String> = trace(TraceOptions::new("outer"), reporter.clone(), |_| {
            let _: Result<(), String> = trace(
                TraceOptions::new("inner").with_parent_run_id(explicit),
                reporter.clone(),
                |inner| {
                    assert_eq!(inner.record().parent_run_id, Some(explicit));
                    Ok(())
                },
            );
            Ok(())
        });
    }

    #[test]
    fn test_session_inherited_from_context_parent() {
        let reporter = Arc::new(InMemoryReporter::new());
        let session = Uuid::new_v4();

        let _: Result<(), String> = trace(
            TraceOptions::new("outer")
                .with_session_id(session)
                .with_project_name("demo"),
            reporter.clone(),
            |_| {
                let _: Result<(), String> =
                    trace(TraceOptions::new("inner"), reporter.clone(), |inner| {
                        assert_eq!(inner.record().session_id, Some(session));
                        assert_eq!(inner.record().project_name.as_deref(), Some("demo"));
                        Ok(())
                    });
                Ok(())
            },
        );
    }

    #[test]
    fn test_auto_end_off_leaves_run_open() {
        let reporter = Arc::new(InMemoryReporter::new());
        let _: Result<(), String> = trace(
            TraceOptions::new("manual").with_auto_end(false),
            reporter.clone(),
            |run| {
                end_and_patch(run, TraceOutcome::from_value(json!({"done": true})));
                Ok(())
            },
        );

        // Exactly one update, the manual one.
        assert_eq!(reporter.updated_runs().len(), 1);
        assert_eq!(
            reporter.updated_runs()[0].outputs.clone().unwrap(),
            object(json!({"done": true}))
        );
    }
}
