// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Raw and normalized conversation messages

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::TurnEvent;
use crate::error::{HubError, Result};

/// Message author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    #[serde(other)]
    Other,
}

/// A message as the chat SDK hands it over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Value>,
    /// Older SDKs send a flat string instead of parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Older SDKs keep tool calls beside the content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<Value>,
}

impl RawMessage {
    pub fn assistant(id: impl Into<String>, parts: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parts,
            content: None,
            tool_invocations: Vec::new(),
        }
    }

    /// The part list to normalize.
    ///
    /// When `parts` is empty, legacy tool invocations come first followed by
    /// the flat content as a single text part.
    pub fn effective_parts(&self) -> Vec<Value> {
        if !self.parts.is_empty() {
            return self.parts.clone();
        }
        let mut parts = self.tool_invocations.clone();
        if let Some(content) = self.content.as_deref().filter(|c| !c.is_empty()) {
            parts.push(json!({"type": "text", "text": content}));
        }
        parts
    }
}

/// A message after normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub events: Vec<TurnEvent>,
}

/// Parse a conversation from either a bare message array or `{"messages": [...]}`.
pub fn parse_conversation(value: Value) -> Result<Vec<RawMessage>> {
    let messages = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => object.remove("messages").ok_or_else(|| {
            HubError::Protocol("conversation object has no 'messages' field".to_string())
        })?,
        _ => {
            return Err(HubError::Protocol(
                "conversation must be an array or an object".to_string(),
            ))
        }
    };
    Ok(serde_json::from_value(messages)?)
}
