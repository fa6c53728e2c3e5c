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

//! # AgentLens prompts
//!
//! Pull and push chat prompt templates from the AgentLens hub and render
//! them with `{variable}` substitution.
//!
//! ```
//! use std::collections::HashMap;
//! use agentlens_prompts::{InMemoryPromptStore, PromptStore, PromptTemplate};
//!
//! let store = InMemoryPromptStore::new();
//! let template = PromptTemplate::new(
//!     "greeter",
//!     vec![PromptTemplate::message("system", "Greet {name} politely.")],
//! );
//! store.push(&template).unwrap();
//!
//! let pulled = store.pull("greeter", None).unwrap();
//! let vars = HashMap::from([("name".to_string(), "Ada".to_string())]);
//! let messages = pulled.format(&vars).unwrap();
//! assert_eq!(messages[0].content, "Greet Ada politely.");
//! ```

mod error;
mod hub;
mod template;

pub use error::PromptError;
pub use hub::{HubClient, InMemoryPromptStore, PromptStore};
pub use template::{MessageTemplate, PromptMessage, PromptTemplate};
