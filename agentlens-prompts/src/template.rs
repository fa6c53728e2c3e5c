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

//! Chat prompt templates.
//!
//! A template is a named, versioned sequence of role/content messages whose
//! content may contain `{variable}` placeholders. Substitution is the whole
//! templating story here: no conditionals, no loops. `{{` and `}}` escape
//! literal braces.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PromptError;

/// A rendered chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

/// One message of a template, before substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub role: String,
    pub content: String,
}

/// A named, versioned chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    /// Hub-assigned version tag; empty until pushed.
    #[serde(default)]
    pub version: String,
    pub messages: Vec<MessageTemplate>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, messages: Vec<MessageTemplate>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            messages,
        }
    }

    pub fn message(role: impl Into<String>, content: impl Into<String>) -> MessageTemplate {
        MessageTemplate {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Placeholder names referenced anywhere in the template, in order of
    /// first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for message in &self.messages {
            let mut chars = message.content.chars().peekable();
            while let Some(c) = chars.next() {
                if c != '{' {
                    continue;
                }
                if chars.peek() == Some(&'{') {
                    chars.next();
                    continue;
                }
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    name.push(c);
                }
                if !name.is_empty() && !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }

    /// Render the template into role/content messages.
    ///
    /// Every placeholder must be present in `variables`; extra variables are
    /// ignored.
    pub fn format(
        &self,
        variables: &HashMap<String, String>,
    ) -> Result<Vec<PromptMessage>, PromptError> {
        self.messages
            .iter()
            .map(|message| {
                Ok(PromptMessage {
                    role: message.role.clone(),
                    content: substitute(&message.content, variables)?,
                })
            })
            .collect()
    }
}

fn substitute(
    content: &str,
    variables: &HashMap<String, String>,
) -> Result<String, PromptError> {
    let mut output = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed || name.is_empty() {
                    return Err(PromptError::MalformedTemplate(content.to_string()));
                }
                match variables.get(&name) {
                    Some(value) => output.push_str(value),
                    None => return Err(PromptError::MissingVariable(name)),
                }
            }
            c => output.push(c),
        }
    }
    Ok(output)
}
