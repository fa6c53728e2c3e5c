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

//! Thread-local "current run" context.
//!
//! Holds at most one current run per OS thread, used as the implicit parent
//! for newly created runs. The slot follows a save-before-enter /
//! restore-after-exit discipline: [`enter`] returns an RAII guard that puts
//! the previous value back on every exit path, panics included. No call
//! chain observes or mutates another thread's current run.

use std::cell::RefCell;
use std::marker::PhantomData;

use uuid::Uuid;

use crate::run::RunRecord;

/// Lightweight handle to the run currently active on this thread.
///
/// Carries the grouping fields a nested run inherits when its parent is
/// resolved from context rather than passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRun {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    pub session_name: Option<String>,
    pub project_name: Option<String>,
}

impl CurrentRun {
    pub fn from_record(record: &RunRecord) -> Self {
        Self {
            id: record.id,
            session_id: record.session_id,
            session_name: record.session_name.clone(),
            project_name: record.project_name.clone(),
        }
    }
}

thread_local! {
    static CURRENT_RUN: RefCell<Option<CurrentRun>> = const { RefCell::new(None) };
}

/// The run currently active on this thread, if any.
pub fn current_run() -> Option<CurrentRun> {
    CURRENT_RUN.with(|slot| slot.borrow().clone())
}

/// Id of the current run, the implicit parent for new runs.
pub fn current_run_id() -> Option<Uuid> {
    CURRENT_RUN.with(|slot| slot.borrow().as_ref().map(|run| run.id))
}

/// Install `run` as the current run, returning a guard that restores the
/// previous value when dropped.
#[must_use = "dropping the guard immediately restores the previous run"]
pub fn enter(run: CurrentRun) -> ContextGuard {
    let prev = CURRENT_RUN.with(|slot| slot.borrow_mut().replace(run));
    ContextGuard {
        prev,
        _not_send: PhantomData,
    }
}

/// Restores the saved current run on drop.
///
/// Guards must be dropped in reverse order of creation, which falls out of
/// normal scoping; the guard is `!Send` so it cannot leave the thread whose
/// slot it saved.
pub struct ContextGuard {
    prev: Option<CurrentRun>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        CURRENT_RUN.with(|slot| *slot.borrow_mut() = prev);
    }
}
