// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Utility functions for mcp-hub
//!
//! Small pure helpers shared by the library and the CLI.

use serde_json::Value;

use crate::error::HubError;

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Pretty JSON, falling back to the compact form.
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Format an error for display to the user
pub fn format_error(error: &HubError) -> String {
    match error {
        HubError::Config(message) => {
            let mut msg = format!("Configuration error: {}\n", message);
            msg.push_str("Check mcp-config.json or pass --config <path>.");
            msg
        }
        HubError::InvalidToolName(name) => format!(
            "Invalid tool name {:?}: expected <backend>__<tool>, for example eda__load_data",
            name
        ),
        HubError::Transport(message) => {
            format!("Could not reach backend: {}", message)
        }
        _ => format!("Error: {}", error),
    }
}
