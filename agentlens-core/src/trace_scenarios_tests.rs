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

//! End-to-end tracing scenarios across the lifecycle, context and reporter.

use std::sync::Arc;

use chrono::Duration;
use serde_json::{json, Map, Value};

use crate::context;
use crate::reporter::{InMemoryReporter, Reporter};
use crate::run::{run_types, RunStatus, TraceOutcome};
use crate::trace::{trace, TraceOptions};
use crate::tree::RunTree;

fn object(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

#[test]
fn test_id_stable_across_lifecycle() {
    let reporter = Arc::new(InMemoryReporter::new());
    let mut run = RunTree::builder("stable", reporter.clone() as Arc<dyn Reporter>).build();
    let id = run.id();

    run.post().unwrap();
    assert_eq!(run.id(), id);
    run.end(TraceOutcome::from_value(json!("done")));
    assert_eq!(run.id(), id);
    run.patch().unwrap();
    assert_eq!(run.id(), id);
    assert_eq!(reporter.created_runs()[0].id, id);
    assert_eq!(reporter.updated_runs()[0].id, id);
}

#[test]
fn test_start_report_precedes_child_start_report() {
    let reporter = Arc::new(InMemoryReporter::new());
    let _: Result<(), String> = trace(TraceOptions::new("parent"), reporter.clone(), |run| {
        let _: Result<(), String> = run.trace("child", run_types::CHAIN, Map::new(), |_| Ok(()));
        Ok(())
    });

    let created = reporter.created_runs();
    assert_eq!(created[0].name, "parent");
    assert_eq!(created[1].name, "child");
    assert_eq!(created[1].parent_run_id, Some(created[0].id));
}

#[test]
fn test_runtime_is_non_negative() {
    let reporter = Arc::new(InMemoryReporter::new());
    let _: Result<(), String> = trace(TraceOptions::new("quick"), reporter.clone(), |_| Ok(()));

    let run = reporter.updated_runs()[0].clone();
    assert!(run.runtime().unwrap() >= Duration::zero());
    assert!(run.end_time.unwrap() >= run.start_time);
}

#[test]
fn test_outputs_and_error_mutually_exclusive() {
    let reporter = Arc::new(InMemoryReporter::new());

    let _: Result<Value, String> = trace(TraceOptions::new("ok"), reporter.clone(), |_| {
        Ok(json!({"fine": true}))
    });
    let _: Result<Value, String> =
        trace(TraceOptions::new("bad"), reporter.clone(), |_| {
            Err("boom".to_string())
        });

    for run in reporter.updated_runs() {
        match run.status() {
            RunStatus::Completed => {
                assert!(run.outputs.is_some());
                assert!(run.error.is_none());
            }
            RunStatus::Error => {
                assert!(run.error.is_some());
                assert!(run.outputs.is_none());
            }
            RunStatus::Started => panic!("run never finalized"),
        }
    }
}

#[test]
fn test_concurrent_chains_do_not_share_context() {
    let reporter = Arc::new(InMemoryReporter::new());
    let barrier = Arc::new(std::sync::Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|chain| {
            let reporter = reporter.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let _: Result<(), String> = trace(
                    TraceOptions::new(format!("outer-{chain}")),
                    reporter.clone() as Arc<dyn Reporter>,
                    |outer| {
                        let outer_id = outer.id();
                        // Hold both outer runs open at the same time.
                        barrier.wait();
                        let _: Result<(), String> = trace(
                            TraceOptions::new(format!("inner-{chain}")),
                            reporter.clone() as Arc<dyn Reporter>,
                            |inner| {
                                assert_eq!(inner.record().parent_run_id, Some(outer_id));
                                Ok(())
                            },
                        );
                        barrier.wait();
                        Ok(())
                    },
                );
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let created = reporter.created_runs();
    for chain in 0..2 {
        let outer = created
            .iter()
            .find(|run| run.name == format!("outer-{chain}"))
            .unwrap();
        let inner = created
            .iter()
            .find(|run| run.name == format!("inner-{chain}"))
            .unwrap();
        assert_eq!(inner.parent_run_id, Some(outer.id));
    }
}

#[test]
fn test_failing_reporter_does_not_block_work() {
    struct FailingReporter;

    impl Reporter for FailingReporter {
        fn create_run(&self, _run: &crate::run::RunRecord) -> crate::error::Result<Value> {
            Err(crate::error::LensError::Reporting("offline".into()))
        }
        fn update_run(&self, _run: &crate::run::RunRecord) -> crate::error::Result<Value> {
            Err(crate::error::LensError::Reporting("offline".into()))
        }
        fn create_feedback(
            &self,
            _run_id: uuid::Uuid,
            _key: &str,
            _value: Value,
            _comment: Option<&str>,
        ) -> crate::error::Result<Value> {
            Err(crate::error::LensError::Reporting("offline".into()))
        }
        fn list_run_feedback(&self, _run_id: uuid::Uuid) -> crate::error::Result<Vec<Value>> {
            Err(crate::error::LensError::Reporting("offline".into()))
        }
    }

    // Tracing is best-effort observability: the work still runs and its
    // value still comes back even when every report fails.
    let result: Result<i64, String> = trace(
        TraceOptions::new("offline"),
        Arc::new(FailingReporter),
        |_| Ok(41 + 1),
    );
    assert_eq!(result.unwrap(), 42);
    assert!(context::current_run().is_none());
}

#[test]
fn test_work_error_survives_patch_failure() {
    struct PatchFails(InMemoryReporter);

    impl Reporter for PatchFails {
        fn create_run(&self, run: &crate::run::RunRecord) -> crate::error::Result<Value> {
            self.0.create_run(run)
        }
        fn update_run(&self, _run: &crate::run::RunRecord) -> crate::error::Result<Value> {
            Err(crate::error::LensError::Reporting("patch refused".into()))
        }
        fn create_feedback(
            &self,
            run_id: uuid::Uuid,
            key: &str,
            value: Value,
            comment: Option<&str>,
        ) -> crate::error::Result<Value> {
            self.0.create_feedback(run_id, key, value, comment)
        }
        fn list_run_feedback(&self, run_id: uuid::Uuid) -> crate::error::Result<Vec<Value>> {
            self.0.list_run_feedback(run_id)
        }
    }

    // A patch failure on the error path must not mask the work's error.
    let result: Result<Value, String> = trace(
        TraceOptions::new("x"),
        Arc::new(PatchFails(InMemoryReporter::new())),
        |_| Err("boom".to_string()),
    );
    assert_eq!(result.unwrap_err(), "boom");
    assert!(context::current_run().is_none());
}

#[test]
fn test_root_trace_inputs_round_trip() {
    let reporter = Arc::new(InMemoryReporter::new());
    let _: Result<Value, String> = trace(
        TraceOptions::new("add")
            .with_inputs(object(json!({"a": 2, "b": 3})))
            .with_tags(vec!["math".into()])
            .with_metadata(object(json!({"caller": "tests"}))),
        reporter.clone(),
        |_| Ok(json!(5)),
    );

    let run = reporter.created_runs()[0].clone();
    assert_eq!(run.inputs, object(json!({"a": 2, "b": 3})));
    assert_eq!(run.tags, vec!["math".to_string()]);
    assert_eq!(run.metadata, object(json!({"caller": "tests"})));
}
