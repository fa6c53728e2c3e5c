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

//! Method interception: wrap a designated call in a span.
//!
//! [`Traceable`] is an explicit higher-order decorator applied at call
//! sites. It computes the run name, metadata and parent id (each a constant
//! or a function of the receiver and the call's arguments), then invokes the
//! top-level trace entry point around the original call. The wrapping is
//! transparent: same arguments in, same return value out; the only side
//! effects are the emitted run and the parent-id context seen by nested
//! traced calls.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context;
use crate::reporter::Reporter;
use crate::run::run_types;
use crate::trace::{trace, TraceOptions};

/// Positional and named arguments of an intercepted call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a named argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.args
    }

    pub fn named(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    /// Inputs mapping for the run record: named arguments merged directly,
    /// positional values under the reserved `"args"` key.
    pub fn to_inputs(&self) -> Map<String, Value> {
        let mut inputs = self.kwargs.clone();
        if !self.args.is_empty() {
            inputs.insert("args".to_string(), Value::Array(self.args.clone()));
        }
        inputs
    }
}

type NameFn<R> = Box<dyn Fn(&R, &CallArgs) -> String + Send + Sync>;
type MetadataFn<R> = Box<dyn Fn(&R, &CallArgs) -> anyhow::Result<Map<String, Value>> + Send + Sync>;
type ParentIdFn<R> = Box<dyn Fn(&R, &CallArgs) -> Option<Uuid> + Send + Sync>;

enum NameSource<R> {
    Constant(String),
    Provider(NameFn<R>),
}

enum ParentSource<R> {
    Constant(Uuid),
    Provider(ParentIdFn<R>),
}

/// Decorator for a method on receivers of type `R`.
///
/// Built once per wrapped method and reused across calls.
pub struct Traceable<R> {
    /// The wrapped method's identifier, the fallback run name.
    method: String,
    run_type: String,
    name: Option<NameSource<R>>,
    metadata: Option<MetadataFn<R>>,
    parent_id: Option<ParentSource<R>>,
    project_name: Option<String>,
    reporter: Arc<dyn Reporter>,
}

impl<R> Traceable<R> {
    pub fn new(method: impl Into<String>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            method: method.into(),
            run_type: run_types::CHAIN.to_string(),
            name: None,
            metadata: None,
            parent_id: None,
            project_name: None,
            reporter,
        }
    }

    pub fn with_run_type(mut self, run_type: impl Into<String>) -> Self {
        self.run_type = run_type.into();
        self
    }

    /// Constant run name, overriding the method identifier.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(NameSource::Constant(name.into()));
        self
    }

    /// Run name computed from the receiver and call arguments.
    pub fn with_name_fn(
        mut self,
        provider: impl Fn(&R, &CallArgs) -> String + Send + Sync + 'static,
    ) -> Self {
        self.name = Some(NameSource::Provider(Box::new(provider)));
        self
    }

    /// Metadata computed from the receiver and call arguments.
    ///
    /// A failing provider is retried with empty arguments (so providers that
    /// ignore the call shape keep working), then degraded to empty metadata.
    pub fn with_metadata_fn(
        mut self,
        provider: impl Fn(&R, &CallArgs) -> anyhow::Result<Map<String, Value>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.metadata = Some(Box::new(provider));
        self
    }

    /// Constant parent run id.
    pub fn with_parent_run_id(mut self, parent_run_id: Uuid) -> Self {
        self.parent_id = Some(ParentSource::Constant(parent_run_id));
        self
    }

    /// Parent run id computed from the receiver and call arguments.
    pub fn with_parent_id_fn(
        mut self,
        provider: impl Fn(&R, &CallArgs) -> Option<Uuid> + Send + Sync + 'static,
    ) -> Self {
        self.parent_id = Some(ParentSource::Provider(Box::new(provider)));
        self
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    /// Invoke the wrapped method inside a span.
    ///
    /// `call` receives the original receiver and arguments unmodified and
    /// its return value becomes the run's outputs; its error propagates.
    pub fn call<T, E, F>(
        &self,
        receiver: &R,
        args: CallArgs,
        call: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&R, &CallArgs) -> std::result::Result<T, E>,
        T: Serialize,
        E: Display,
    {
        let name = self.resolve_name(receiver, &args);
        let metadata = self.resolve_metadata(receiver, &args);
        let parent_run_id = self.resolve_parent(receiver, &args);

        let mut options = TraceOptions::new(name)
            .with_run_type(self.run_type.clone())
            .with_inputs(args.to_inputs())
            .with_metadata(metadata);
        if let Some(parent_run_id) = parent_run_id {
            options = options.with_parent_run_id(parent_run_id);
        }
        if let Some(project_name) = &self.project_name {
            options = options.with_project_name(project_name.clone());
        }

        trace(options, Arc::clone(&self.reporter), |_run| {
            call(receiver, &args)
        })
    }

    fn resolve_name(&self, receiver: &R, args: &CallArgs) -> String {
        match &self.name {
            Some(NameSource::Provider(provider)) => provider(receiver, args),
            Some(NameSource::Constant(name)) => name.clone(),
            None => self.method.clone(),
        }
    }

    fn resolve_metadata(&self, receiver: &R, args: &CallArgs) -> Map<String, Value> {
        let Some(provider) = &self.metadata else {
            return Map::new();
        };
        match provider(receiver, args) {
            Ok(metadata) => metadata,
            Err(first) => match provider(receiver, &CallArgs::default()) {
                Ok(metadata) => {
                    tracing::debug!(
                        method = %self.method,
                        error = %first,
                        "metadata provider succeeded only without call arguments"
                    );
                    metadata
                }
                Err(second) => {
                    tracing::debug!(
                        method = %self.method,
                        error = %second,
                        "metadata provider failed, recording empty metadata"
                    );
                    Map::new()
                }
            },
        }
    }

    fn resolve_parent(&self, receiver: &R, args: &CallArgs) -> Option<Uuid> {
        match &self.parent_id {
            Some(ParentSource::Provider(provider)) => provider(receiver, args),
            Some(ParentSource::Constant(id)) => Some(*id),
            None => context::current_run_id(),
        }
    }
}
