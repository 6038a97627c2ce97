// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool call result rendering

use serde_json::{json, Value};

use crate::mcp::ToolContent;

/// Text rendering of a `tools/call` result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedResult {
    pub text: String,
    /// The backend flagged the call as failed (`isError`)
    pub is_error: bool,
}

/// Render the `content` array of a tool result.
///
/// Text items are kept verbatim; everything else becomes a short
/// placeholder. A result without a `content` array is malformed.
pub fn format_call_result(raw: &Value) -> Result<FormattedResult, String> {
    let Some(items) = raw.get("content").and_then(Value::as_array) else {
        return Err(format!("malformed tool result: {}", raw));
    };

    let text = items
        .iter()
        .map(format_content_item)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(FormattedResult {
        text,
        is_error: raw.get("isError").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn format_content_item(item: &Value) -> String {
    match serde_json::from_value::<ToolContent>(item.clone()) {
        Ok(ToolContent::Text { text }) => text,
        Ok(ToolContent::Image { mime_type, .. }) => {
            format!("[Image: {}]", mime_type.as_deref().unwrap_or("unknown"))
        }
        Ok(ToolContent::Audio { mime_type, .. }) => {
            format!("[Audio: {}]", mime_type.as_deref().unwrap_or("unknown"))
        }
        Ok(ToolContent::Resource { resource }) => {
            format!("[Resource: {}]", resource.uri.as_deref().unwrap_or("unknown"))
        }
        Ok(ToolContent::ResourceLink { uri, .. }) => format!("[Resource link: {}]", uri),
        Err(_) => match item.get("type").and_then(Value::as_str) {
            // A resource item whose payload did not parse still has a kind
            Some("resource") => "[Resource: unknown]".to_string(),
            Some(kind) => format!("[{} content]", kind),
            None => "[unknown content]".to_string(),
        },
    }
}

/// Error payload returned to the model in place of a tool result
pub fn dispatch_error(message: &str, tool_name: &str, server_name: &str) -> String {
    json!({
        "error": message,
        "toolName": tool_name,
        "serverName": server_name,
    })
    .to_string()
}
