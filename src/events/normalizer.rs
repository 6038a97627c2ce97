// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Message part normalizer
//!
//! The detection chain lives here and nowhere else. Order matters: an
//! explicit `toolName` wins over a `tool-*` type, which wins over the plain
//! content types.

use glob::Pattern;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    ConversationMessage, FetchPart, MarkerKind, NormalizedEvent, RawMessage, SourceTransport,
    TextFragment, TextRole, ToolCallEvent, ToolCallState, TurnEvent,
};
use crate::error::{HubError, Result};
use crate::naming::ToolName;

const TOOL_TYPE_PREFIX: &str = "tool-";

/// Backend-name globs used to label `tool-*` parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportHints {
    /// Backends reached over local process pipes
    #[serde(default)]
    pub local: Vec<String>,
    /// Backends reached over streaming HTTP
    #[serde(default)]
    pub remote: Vec<String>,
}

impl TransportHints {
    /// Compile the globs. Fails on the first invalid pattern.
    pub fn compile(&self) -> Result<CompiledHints> {
        let compile_all = |patterns: &[String]| -> Result<Vec<Pattern>> {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(HubError::from))
                .collect()
        };
        Ok(CompiledHints {
            local: compile_all(&self.local)?,
            remote: compile_all(&self.remote)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompiledHints {
    local: Vec<Pattern>,
    remote: Vec<Pattern>,
}

impl CompiledHints {
    /// Transport for a `tool-*` part whose backend segment is `backend`.
    pub fn transport_for(&self, backend: &str) -> SourceTransport {
        if self.local.iter().any(|p| p.matches(backend)) {
            SourceTransport::LocalProcess
        } else if self.remote.iter().any(|p| p.matches(backend)) {
            SourceTransport::StreamingHttp
        } else {
            SourceTransport::Direct
        }
    }
}

/// Converts raw message parts into [`NormalizedEvent`]s
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    hints: CompiledHints,
}

impl Normalizer {
    pub fn new(hints: &TransportHints) -> Result<Self> {
        Ok(Self {
            hints: hints.compile()?,
        })
    }

    /// Normalize one part, explaining why it was rejected.
    pub fn try_normalize(&self, part: &Value) -> Result<NormalizedEvent> {
        let Some(object) = part.as_object() else {
            return Err(HubError::Unclassifiable("part is not an object".to_string()));
        };
        let part_type = object.get("type").and_then(Value::as_str).unwrap_or("");

        // v4 wraps the call: {"type": "tool-invocation", "toolInvocation": {...}}
        if let Some(inner @ Value::Object(_)) = object.get("toolInvocation") {
            return self.try_normalize(inner);
        }

        if let Some(name) = object.get("toolName").and_then(Value::as_str) {
            let name = ToolName::parse(name)?;
            return Ok(NormalizedEvent::ToolCall(tool_call(
                object,
                &name,
                SourceTransport::Direct,
            )));
        }

        if let Some(rest) = part_type.strip_prefix(TOOL_TYPE_PREFIX) {
            let name = ToolName::parse(rest)?;
            let transport = self.hints.transport_for(name.backend());
            return Ok(NormalizedEvent::ToolCall(tool_call(object, &name, transport)));
        }

        match part_type {
            "text" => Ok(NormalizedEvent::Text(TextFragment {
                text: text_of(object, "text"),
                role: TextRole::Unclassified,
            })),
            "reasoning" => Ok(NormalizedEvent::Text(TextFragment {
                text: text_of(object, "reasoning"),
                role: TextRole::Reasoning,
            })),
            "step-start" => Ok(NormalizedEvent::Marker {
                marker: MarkerKind::StepStart,
            }),
            "step-finish" => Ok(NormalizedEvent::Marker {
                marker: MarkerKind::StepFinish,
            }),
            "resource-fetch" | "prompt-fetch" => {
                let fetch: FetchPart = serde_json::from_value(part.clone()).map_err(|e| {
                    HubError::Unclassifiable(format!("malformed {} part: {}", part_type, e))
                })?;
                Ok(match fetch {
                    FetchPart::ResourceFetch(resource) => NormalizedEvent::ResourceFetch(resource),
                    FetchPart::PromptFetch(prompt) => NormalizedEvent::PromptFetch(prompt),
                })
            }
            "" => Err(HubError::Unclassifiable("part has no type".to_string())),
            other => Err(HubError::Unclassifiable(format!(
                "unknown part type '{}'",
                other
            ))),
        }
    }

    /// Normalize one part, dropping anything that cannot be classified.
    pub fn normalize(&self, part: &Value) -> Option<NormalizedEvent> {
        match self.try_normalize(part) {
            Ok(event) => Some(event),
            Err(HubError::InvalidToolName(name)) => {
                tracing::warn!("Dropping tool part with invalid name '{}'", name);
                None
            }
            Err(e) => {
                tracing::debug!("Skipping part: {}", e);
                None
            }
        }
    }

    /// Normalize every part of a turn, keeping each raw index as the position.
    pub fn normalize_turn(&self, parts: &[Value]) -> Vec<TurnEvent> {
        parts
            .iter()
            .enumerate()
            .filter_map(|(position, part)| {
                self.normalize(part)
                    .map(|event| TurnEvent { position, event })
            })
            .collect()
    }

    pub fn normalize_message(&self, message: &RawMessage) -> ConversationMessage {
        ConversationMessage {
            id: message.id.clone(),
            role: message.role.clone(),
            events: self.normalize_turn(&message.effective_parts()),
        }
    }
}

fn tool_call(
    object: &Map<String, Value>,
    name: &ToolName,
    transport: SourceTransport,
) -> ToolCallEvent {
    let args = match first_present(object, "args", "input") {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            tracing::debug!("Ignoring non-object arguments for {}: {}", name, other);
            Map::new()
        }
        None => Map::new(),
    };
    let mut result = first_present(object, "result", "output").cloned();

    let state = match object.get("state").and_then(Value::as_str) {
        Some(raw) => ToolCallState::parse(raw).unwrap_or_else(|| {
            tracing::debug!("Unknown tool state '{}' for {}", raw, name);
            infer_state(result.is_some())
        }),
        None => infer_state(result.is_some()),
    };

    if state == ToolCallState::Error && result.is_none() {
        result = object
            .get("errorText")
            .filter(|v| !v.is_null())
            .cloned();
    }

    ToolCallEvent {
        tool_name: name.to_string(),
        tool_call_id: object
            .get("toolCallId")
            .and_then(Value::as_str)
            .map(str::to_string),
        args,
        result,
        state,
        source_transport: transport,
    }
}

fn infer_state(has_result: bool) -> ToolCallState {
    if has_result {
        ToolCallState::Completed
    } else {
        ToolCallState::InputAvailable
    }
}

/// `primary` if present and non-null, else `fallback`.
fn first_present<'a>(
    object: &'a Map<String, Value>,
    primary: &str,
    fallback: &str,
) -> Option<&'a Value> {
    object
        .get(primary)
        .filter(|v| !v.is_null())
        .or_else(|| object.get(fallback).filter(|v| !v.is_null()))
}

fn text_of(object: &Map<String, Value>, alternate: &str) -> String {
    object
        .get("text")
        .or_else(|| object.get(alternate))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
