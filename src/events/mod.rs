// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Canonical event model
//!
//! Transports disagree on how a message part looks: local-process servers
//! emit `tool-<backend>__<tool>` parts with `args`/`result`, streaming HTTP
//! servers use `input`/`output`, and in-process calls carry an explicit
//! `toolName`. Everything downstream (phase classification, the session
//! ledger, rendering) only ever sees the types in this module.

pub mod message;
pub mod normalizer;
pub mod parts;

pub use message::*;
pub use normalizer::*;
pub use parts::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{HubError, Result};
use crate::naming::ToolName;

/// Which transport family produced a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTransport {
    /// Local process pipes (stdio)
    LocalProcess,
    /// HTTP with streamed responses
    StreamingHttp,
    /// In-process / SDK-native tool call
    Direct,
}

/// Lifecycle of a tool call. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallState {
    InputAvailable,
    Executing,
    Completed,
    Error,
}

impl ToolCallState {
    /// Parse the state strings used by either SDK generation.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "input-streaming" | "input-available" | "pending" | "call" | "partial-call" => {
                Some(Self::InputAvailable)
            }
            "executing" | "running" => Some(Self::Executing),
            "output-available" | "completed" | "result" => Some(Self::Completed),
            "output-error" | "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputAvailable => "input-available",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::InputAvailable => 0,
            Self::Executing => 1,
            Self::Completed | Self::Error => 2,
        }
    }

    /// Whether `next` is a strictly later state.
    pub fn can_advance_to(&self, next: ToolCallState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for ToolCallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation as seen by the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallEvent {
    /// `<backend>__<tool>`
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub state: ToolCallState,
    pub source_transport: SourceTransport,
}

impl ToolCallEvent {
    /// A fresh call whose input is known but which has not started.
    pub fn new(
        tool_name: &ToolName,
        args: Map<String, Value>,
        source_transport: SourceTransport,
    ) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            tool_call_id: None,
            args,
            result: None,
            state: ToolCallState::InputAvailable,
            source_transport,
        }
    }

    pub fn with_call_id(mut self, id: impl Into<String>) -> Self {
        self.tool_call_id = Some(id.into());
        self
    }

    /// Backend segment of the tool name.
    pub fn backend(&self) -> &str {
        self.tool_name
            .split_once(crate::naming::SEPARATOR)
            .map(|(backend, _)| backend)
            .unwrap_or(&self.tool_name)
    }

    /// Move to a later state. Re-applying the current state is a no-op;
    /// anything else that is not a forward move is rejected.
    pub fn advance(&mut self, next: ToolCallState) -> Result<()> {
        if next == self.state {
            return Ok(());
        }
        if !self.state.can_advance_to(next) {
            return Err(HubError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Record the outcome and move to the matching terminal state.
    pub fn finish(&mut self, result: Value, is_error: bool) -> Result<()> {
        let next = if is_error {
            ToolCallState::Error
        } else {
            ToolCallState::Completed
        };
        self.advance(next)?;
        self.result = Some(result);
        Ok(())
    }

    /// Fold a later snapshot of the same call into this one.
    ///
    /// Streaming transports re-send the whole part as it progresses; a
    /// snapshot that would move the state backwards is rejected and leaves
    /// `self` untouched.
    pub fn merge_snapshot(&mut self, newer: &ToolCallEvent) -> Result<()> {
        self.advance(newer.state)?;
        if !newer.args.is_empty() {
            self.args = newer.args.clone();
        }
        if newer.result.is_some() {
            self.result = newer.result.clone();
        }
        Ok(())
    }
}

/// Role of a text fragment within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextRole {
    /// Plain text; the classifier decides
    Unclassified,
    Reasoning,
    FinalAnswer,
}

/// A piece of streamed assistant text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub role: TextRole,
}

/// Step boundaries emitted by the streaming SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    StepStart,
    StepFinish,
}

/// One canonical event per message part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NormalizedEvent {
    ToolCall(ToolCallEvent),
    Text(TextFragment),
    Marker { marker: MarkerKind },
    ResourceFetch(ResourceFetchPart),
    PromptFetch(PromptFetchPart),
}

impl NormalizedEvent {
    pub fn as_tool_call(&self) -> Option<&ToolCallEvent> {
        match self {
            NormalizedEvent::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextFragment> {
        match self {
            NormalizedEvent::Text(fragment) => Some(fragment),
            _ => None,
        }
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self, NormalizedEvent::ToolCall(_))
    }
}

/// An event together with the index of its raw part in the turn.
///
/// Positions come from the raw part list, so dropping an unclassifiable part
/// never shifts the events after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEvent {
    pub position: usize,
    pub event: NormalizedEvent,
}
