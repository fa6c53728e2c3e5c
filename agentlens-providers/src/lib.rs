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

//! # AgentLens providers
//!
//! Chat completion clients for OpenAI, Anthropic and Cohere behind one
//! [`ChatModel`] trait, plus [`TracedChatModel`] to record every completion
//! as an `"llm"` run on the AgentLens platform.
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentlens_core::InMemoryReporter;
//! use agentlens_providers::{ChatMessage, ChatModel, ChatRequest, OpenAiClient, TracedChatModel};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = TracedChatModel::new(
//!         OpenAiClient::new("gpt-4o")?,
//!         Arc::new(InMemoryReporter::new()),
//!     );
//!     let response = model.complete(&ChatRequest::new(
//!         "gpt-4o",
//!         vec![ChatMessage::user("What is the capital of France?")],
//!     ))?;
//!     println!("{}", response.message.content);
//!     Ok(())
//! }
//! ```

mod anthropic;
mod chat;
mod cohere;
mod http;
mod openai;
mod traced;

pub use anthropic::{AnthropicClient, ENV_ANTHROPIC_API_KEY};
pub use chat::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, ProviderError, Result, TokenUsage,
};
pub use cohere::{CohereClient, ENV_CO_API_KEY};
pub use openai::{OpenAiClient, ENV_OPENAI_API_KEY};
pub use traced::TracedChatModel;
