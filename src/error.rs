// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for mcp-hub
//!
//! Failures local to one backend or one tool call are normally reported as
//! data (a dropped event, an excluded backend, an error tool result). The
//! variants here describe why.

use thiserror::Error;

/// Main error type for hub operations
#[derive(Error, Debug)]
pub enum HubError {
    /// A raw message part matched none of the known shapes
    #[error("Unclassifiable message part: {0}")]
    Unclassifiable(String),

    /// A tool name that is not exactly `<backend>__<tool>`
    #[error("Invalid namespaced tool name: {0:?}")]
    InvalidToolName(String),

    /// Listing tools/resources/prompts from one backend failed
    #[error("Backend '{backend}' listing failed: {message}")]
    BackendList { backend: String, message: String },

    /// Invoking a tool failed or returned malformed content
    #[error("Dispatch of '{tool}' failed: {message}")]
    Dispatch { tool: String, message: String },

    /// Two tools of the same backend map to one namespaced name
    #[error("Duplicate tool '{tool}' in backend '{backend}'")]
    SchemaConflict { backend: String, tool: String },

    /// A tool-call state moved backwards or out of a terminal state
    #[error("Invalid tool state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failures talking to a backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend replied with something that is not valid MCP
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HubError {
    /// Shorthand for a listing failure of `backend`.
    pub fn backend_list(backend: impl Into<String>, message: impl ToString) -> Self {
        HubError::BackendList {
            backend: backend.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error only concerns a single event or call, as opposed to
    /// configuration that should stop the caller.
    pub fn is_contained(&self) -> bool {
        !matches!(self, HubError::Config(_) | HubError::SchemaConflict { .. })
    }
}

/// Result type alias for hub operations
pub type Result<T> = std::result::Result<T, HubError>;

impl From<regex::Error> for HubError {
    fn from(err: regex::Error) -> Self {
        HubError::Config(err.to_string())
    }
}

impl From<glob::PatternError> for HubError {
    fn from(err: glob::PatternError) -> Self {
        HubError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_tool_name_display() {
        let err = HubError::InvalidToolName("a__b__c".to_string());
        assert!(err.to_string().contains("a__b__c"));
    }

    #[test]
    fn test_backend_list_helper() {
        let err = HubError::backend_list("eda", "connection refused");
        assert_eq!(
            err.to_string(),
            "Backend 'eda' listing failed: connection refused"
        );
    }

    #[test]
    fn test_schema_conflict_display() {
        let err = HubError::SchemaConflict {
            backend: "eda".to_string(),
            tool: "load".to_string(),
        };
        assert!(err.to_string().contains("Duplicate tool 'load'"));
    }

    #[test]
    fn test_is_contained() {
        assert!(HubError::Unclassifiable("x".into()).is_contained());
        assert!(HubError::Dispatch {
            tool: "a__b".into(),
            message: "boom".into()
        }
        .is_contained());
        assert!(!HubError::Config("bad".into()).is_contained());
        assert!(!HubError::SchemaConflict {
            backend: "a".into(),
            tool: "b".into()
        }
        .is_contained());
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: HubError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_from_regex() {
        let err: HubError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, HubError::Config(_)));
    }

    #[test]
    fn test_result_alias() {
        fn ok() -> Result<u8> {
            Ok(7)
        }
        assert_eq!(ok().unwrap(), 7);
    }
}
