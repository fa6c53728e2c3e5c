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

//! # AgentLens client
//!
//! Blocking JSON/HTTP client for the AgentLens observability platform,
//! implementing the tracing core's `Reporter` boundary.
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentlens_client::{ClientConfig, LensClient};
//! use agentlens_core::{trace, TraceOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LensClient::new(
//!         ClientConfig::new("https://api.agentlens.dev", "my-key")?
//!             .with_project_name("demo"),
//!     )?;
//!     let reporter = Arc::new(client);
//!
//!     let result: Result<i64, String> =
//!         trace(TraceOptions::new("add"), reporter, |_run| Ok(2 + 3));
//!     assert_eq!(result.unwrap(), 5);
//!     Ok(())
//! }
//! ```

mod client;
mod config;

pub use client::LensClient;
pub use config::{ClientConfig, ENV_API_KEY, ENV_API_URL, ENV_PROJECT};
