// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Subcommand implementations
//!
//! `mcp` holds the commands that talk to backends; `conversation` holds the
//! offline ones that only read message files.

pub mod conversation;
pub mod mcp;

use serde_json::Value;
use std::path::Path;

use crate::config::Settings;
use crate::error::{HubError, Result};

/// Resolve, load and validate settings.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let (settings, path) = Settings::discover(explicit)?;
    match &path {
        Some(path) => tracing::debug!("Using settings from {}", path.display()),
        None => tracing::debug!("No settings file found, using defaults"),
    }
    settings.validate()?;
    Ok(settings)
}

/// Read a JSON document from disk.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        HubError::Config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Parse a JSON object given on the command line.
pub fn parse_object_arg(raw: &str) -> Result<serde_json::Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(HubError::Config(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}
