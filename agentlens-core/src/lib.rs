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

//! AgentLens Core
//!
//! Run-tree tracing for the AgentLens observability platform: run records,
//! parent/child linkage through a thread-local current-run context, and the
//! start/end/patch lifecycle that reports spans to the platform.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use agentlens_core::{trace, InMemoryReporter, TraceOptions};
//! use serde_json::json;
//!
//! let reporter = Arc::new(InMemoryReporter::new());
//! let result: Result<i64, String> = trace(
//!     TraceOptions::new("add"),
//!     reporter.clone(),
//!     |_run| Ok(2 + 3),
//! );
//! assert_eq!(result.unwrap(), 5);
//! assert_eq!(reporter.updated_runs()[0].outputs.as_ref().unwrap()["output"], json!(5));
//! ```

pub mod context;
pub mod error;
pub mod reporter;
pub mod run;
pub mod tool;
pub mod trace;
pub mod traceable;
pub mod tree;

#[cfg(test)]
mod trace_scenarios_tests;

pub use context::{current_run, current_run_id, enter, ContextGuard, CurrentRun};
pub use error::{LensError, Result};
pub use reporter::{FeedbackRecord, InMemoryReporter, Reporter};
pub use run::{run_types, RunRecord, RunStatus, TraceOutcome};
pub use tool::{Tool, TracedTool};
pub use trace::{end_and_patch, trace, trace_best_effort, TraceOptions};
pub use traceable::{CallArgs, Traceable};
pub use tree::{RunTree, RunTreeBuilder};
