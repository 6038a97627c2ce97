// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Namespaced tool names
//!
//! Every tool exposed through the hub is addressed as `<backend>__<tool>`.
//! This is the one wire convention the rest of the system depends on.

use std::fmt;

use crate::error::{HubError, Result};

/// Separator between backend and tool segments
pub const SEPARATOR: &str = "__";

/// Namespace reserved for the hub's own in-process tools
pub const SYNTHETIC_NAMESPACE: &str = "mcp";

/// A validated two-segment tool name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolName {
    backend: String,
    tool: String,
}

impl ToolName {
    /// Join a backend and an original tool name. The joined name must parse
    /// back to the same two segments, so no two pairs share a name.
    pub fn new(backend: impl Into<String>, tool: impl Into<String>) -> Result<Self> {
        let backend = backend.into();
        let tool = tool.into();
        check_segment(&backend, &backend, &tool)?;
        check_segment(&tool, &backend, &tool)?;
        let name = Self { backend, tool };
        if !Self::parse(&name.to_string()).is_ok_and(|parsed| parsed == name) {
            return Err(HubError::InvalidToolName(name.to_string()));
        }
        Ok(name)
    }

    /// Parse `<backend>__<tool>`. Anything other than exactly two non-empty
    /// segments is rejected.
    pub fn parse(namespaced: &str) -> Result<Self> {
        let mut parts = namespaced.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(backend), Some(tool), None) if !backend.is_empty() && !tool.is_empty() => {
                Ok(Self {
                    backend: backend.to_string(),
                    tool: tool.to_string(),
                })
            }
            _ => Err(HubError::InvalidToolName(namespaced.to_string())),
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.backend, SEPARATOR, self.tool)
    }
}

fn check_segment(segment: &str, backend: &str, tool: &str) -> Result<()> {
    if segment.is_empty() || segment.contains(SEPARATOR) {
        return Err(HubError::InvalidToolName(format!(
            "{}{}{}",
            backend, SEPARATOR, tool
        )));
    }
    Ok(())
}

/// Check that a configured backend name can be used as a namespace.
pub fn check_backend_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(HubError::Config("Backend name must not be empty".to_string()));
    }
    if name.contains(SEPARATOR) {
        return Err(HubError::Config(format!(
            "Backend name '{}' must not contain '{}'",
            name, SEPARATOR
        )));
    }
    if name.ends_with('_') {
        return Err(HubError::Config(format!(
            "Backend name '{}' must not end with '_'",
            name
        )));
    }
    if name == SYNTHETIC_NAMESPACE {
        return Err(HubError::Config(format!(
            "Backend name '{}' is reserved",
            SYNTHETIC_NAMESPACE
        )));
    }
    Ok(())
}
