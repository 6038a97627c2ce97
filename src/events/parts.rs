// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Resource and prompt fetch records
//!
//! These are attached to assistant messages when the user pulls a resource
//! or a prompt from a backend, so the fetch shows up in the conversation
//! next to the tool calls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Progress of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Fetching,
    Complete,
    Error,
}

/// Content of a fetched resource, already flattened to text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedResource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFetchPart {
    pub server_name: String,
    pub uri: String,
    pub status: FetchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<FetchedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceFetchPart {
    pub fn fetching(server_name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            uri: uri.into(),
            status: FetchStatus::Fetching,
            resource: None,
            error: None,
        }
    }

    pub fn complete(mut self, resource: FetchedResource) -> Self {
        self.status = FetchStatus::Complete;
        self.resource = Some(resource);
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = FetchStatus::Error;
        self.error = Some(error.into());
        self
    }
}

/// One message of a rendered prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptLine {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPrompt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFetchPart {
    pub server_name: String,
    pub prompt_name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    pub status: FetchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<FetchedPrompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptFetchPart {
    pub fn fetching(
        server_name: impl Into<String>,
        prompt_name: impl Into<String>,
        args: Map<String, Value>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            prompt_name: prompt_name.into(),
            args,
            status: FetchStatus::Fetching,
            prompt: None,
            error: None,
        }
    }

    pub fn complete(mut self, prompt: FetchedPrompt) -> Self {
        self.status = FetchStatus::Complete;
        self.prompt = Some(prompt);
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = FetchStatus::Error;
        self.error = Some(error.into());
        self
    }
}

/// A fetch record as it appears in a raw message part list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FetchPart {
    ResourceFetch(ResourceFetchPart),
    PromptFetch(PromptFetchPart),
}

impl FetchPart {
    /// Raw JSON form, ready to be appended to a message's parts.
    pub fn to_part(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
