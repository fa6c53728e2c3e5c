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

//! Run records: the serializable unit of a trace span.
//!
//! A run is one recorded unit of work with a start, an optional end,
//! inputs/outputs, and a place in a tree established by `parent_run_id`.
//! The id is generated locally at construction so children can reference
//! their parent before the parent's start-report round-trips.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Run classification tags understood by the platform UI.
///
/// Stored as free-form strings on the record so integrations can define
/// their own kinds beyond these.
pub mod run_types {
    pub const CHAIN: &str = "chain";
    pub const LLM: &str = "llm";
    pub const TOOL: &str = "tool";
}

/// Lifecycle status reported for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Started,
    Completed,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Started => "started",
            RunStatus::Completed => "completed",
            RunStatus::Error => "error",
        }
    }
}

/// One traced unit of work (a span).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Globally unique identifier, generated locally at creation time.
    /// Assigned exactly once; never changes.
    pub id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Free-form classification tag ("chain", "llm", "tool", ...).
    pub run_type: String,
    /// Structured inputs captured at start.
    pub inputs: Map<String, Value>,
    /// Structured outputs captured at successful end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
    /// Textual error description captured at failed end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Back-reference to the parent run's id; establishes the tree without
    /// the parent holding live references to children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<Uuid>,
    /// Labels; order irrelevant for semantics, preserved for display.
    pub tags: Vec<String>,
    /// Free-form key/value annotations.
    pub metadata: Map<String, Value>,
    /// Grouping key correlating multiple root traces (e.g. one conversation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    /// Correlation id to a benchmark/eval example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_example_id: Option<Uuid>,
    /// Destination namespace on the platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

impl RunRecord {
    /// Create a record with a fresh id and `start_time = now`.
    pub fn new(name: impl Into<String>, run_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            run_type: run_type.into(),
            inputs: Map::new(),
            outputs: None,
            error: None,
            start_time: Utc::now(),
            end_time: None,
            parent_run_id: None,
            tags: Vec::new(),
            metadata: Map::new(),
            session_id: None,
            session_name: None,
            reference_example_id: None,
            project_name: None,
        }
    }

    /// A run is open from construction until it is ended.
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Derived duration, available only after the run ended.
    pub fn runtime(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    /// Status derived from the lifecycle state: "started" until ended,
    /// then "error" if an error was recorded, otherwise "completed".
    pub fn status(&self) -> RunStatus {
        if self.end_time.is_none() {
            RunStatus::Started
        } else if self.error.is_some() {
            RunStatus::Error
        } else {
            RunStatus::Completed
        }
    }
}

/// Shape of a traced call's return value.
///
/// The outputs mapping on a run record is always an object. Rather than
/// re-deriving the wrapping rule at each call site, every return value is
/// classified once, here: JSON objects pass through unchanged, anything
/// else is stored under the reserved `"output"` key.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOutcome {
    Mapped(Map<String, Value>),
    Scalar(Value),
}

impl TraceOutcome {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => TraceOutcome::Mapped(map),
            other => TraceOutcome::Scalar(other),
        }
    }

    /// Normalize to the outputs mapping stored on the run record.
    pub fn into_outputs(self) -> Map<String, Value> {
        match self {
            TraceOutcome::Mapped(map) => map,
            TraceOutcome::Scalar(value) => {
                let mut map = Map::new();
                map.insert("output".to_string(), value);
                map
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_assigned_once() {
        let run = RunRecord::new("add", run_types::CHAIN);
        let id = run.id;
        let mut run = run;
        run.end_time = Some(Utc::now());
        assert_eq!(run.id, id);
    }

    #[test]
    fn test_status_derivation() {
        let mut run = RunRecord::new("x", run_types::CHAIN);
        assert_eq!(run.status(), RunStatus::Started);
        assert!(run.is_open());

        run.end_time = Some(Utc::now());
        assert_eq!(run.status(), RunStatus::Completed);

        run.error = Some("boom".into());
        assert_eq!(run.status(), RunStatus::Error);
    }

    #[test]
    fn test_runtime_non_negative() {
        let mut run = RunRecord::new("x", run_types::CHAIN);
        assert!(run.runtime().is_none());
        run.end_time = Some(Utc::now());
        assert!(run.runtime().unwrap() >= Duration::zero());
    }

    #[test]
    fn test_tags_metadata_round_trip() {
        let mut run = RunRecord::new("x", run_types::CHAIN);
        run.tags = vec!["alpha".into(), "beta".into()];
        run.metadata
            .insert("k".into(), json!({"nested": [1, 2, 3]}));

        let serialized = serde_json::to_string(&run).unwrap();
        let back: RunRecord = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back.tags, vec!["alpha".to_string(), "beta".to_string()]);
        assert_eq!(back.metadata, run.metadata);
    }

    #[test]
    fn test_outcome_normalization() {
        let mapped = TraceOutcome::from_value(json!({"sum": 5}));
        assert_eq!(mapped.into_outputs(), json!({"sum": 5}).as_object().unwrap().clone());

        let scalar = TraceOutcome::from_value(json!(5));
        assert_eq!(
            scalar.into_outputs(),
            json!({"output": 5}).as_object().unwrap().clone()
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(RunStatus::Started).unwrap(), json!("started"));
        assert_eq!(RunStatus::Error.as_str(), "error");
    }
}
