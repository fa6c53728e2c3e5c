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

//! AgentLens SDK errors.
//!
//! Errors from the wrapped work itself are never folded into this type;
//! they flow through the tracing entry points generically and are only
//! captured as text on the run record.

use thiserror::Error;

/// AgentLens SDK errors.
#[derive(Error, Debug)]
pub enum LensError {
    /// Missing or invalid credential/identity at construction time.
    /// Raised immediately, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A reporter call failed before a response was received
    /// (connection refused, timeout, serialization of the request).
    #[error("reporting failed: {0}")]
    Reporting(String),

    /// The platform rejected the call.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A run lifecycle method was called out of order.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for AgentLens operations.
pub type Result<T> = std::result::Result<T, LensError>;
