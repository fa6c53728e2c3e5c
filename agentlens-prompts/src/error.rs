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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("prompt not found: {0}")]
    NotFound(String),
    #[error("missing template variable: {0}")]
    MissingVariable(String),
    #[error("malformed template: {0}")]
    MalformedTemplate(String),
    #[error("hub error: {0}")]
    Hub(String),
    #[error("hub API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
