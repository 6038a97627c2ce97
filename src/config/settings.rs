// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for mcp-hub
//!
//! Handles loading settings from `mcp-config.json`. The file keeps the
//! familiar `mcpServers` map and adds a `hub` section for the normalization
//! and catalog knobs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::catalog::DEFAULT_DENYLIST;
use crate::context::{DatasetRule, SummaryConfig};
use crate::events::TransportHints;
use crate::phase::ClassifierConfig;

mod io;
mod validation;

/// Main settings structure, stored in `mcp-config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Backend servers keyed by backend name
    #[serde(default)]
    pub mcp_servers: BTreeMap<String, BackendConfig>,

    /// Normalization, catalog and summary settings
    #[serde(default)]
    pub hub: HubConfig,
}

/// How to reach one backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendConfig {
    /// Local process speaking JSON-RPC over stdin/stdout
    Stdio(StdioBackendConfig),
    /// Remote server speaking JSON-RPC over HTTP (optionally SSE framed)
    Http(HttpBackendConfig),
}

impl BackendConfig {
    /// Parameter that this backend expects out-of-band instead of as a tool argument.
    pub fn credential_param(&self) -> Option<&str> {
        match self {
            BackendConfig::Stdio(_) => None,
            BackendConfig::Http(http) => http.credential_param.as_deref(),
        }
    }

    /// Whether tool calls to this backend need a bearer credential.
    pub fn requires_credential(&self) -> bool {
        match self {
            BackendConfig::Stdio(_) => false,
            BackendConfig::Http(http) => {
                http.auth_token_env.is_some() || http.auth_token.is_some()
            }
        }
    }

    /// Request timeout in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        match self {
            BackendConfig::Stdio(stdio) => stdio.timeout_ms,
            BackendConfig::Http(http) => http.timeout_ms,
        }
    }
}

/// Local process backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdioBackendConfig {
    /// Program to spawn
    pub command: String,

    /// Program arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment for the child process
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Remote HTTP backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpBackendConfig {
    /// Endpoint receiving JSON-RPC POSTs
    pub url: String,

    /// Declared transport ("http" or "sse"); informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,

    /// Extra static headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Bearer token (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token_env: Option<String>,

    /// Tool parameter carrying the credential, stripped from schemas and
    /// re-injected at dispatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_param: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Hub tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    /// Regex patterns (case-insensitive) of tool names that must never be exposed
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,

    /// Backend-name patterns used to label the transport of `tool-*` parts
    #[serde(default)]
    pub transport_hints: TransportHints,

    /// Phase classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Session summary settings
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Maximum characters kept from a read resource
    #[serde(default = "default_resource_max_chars")]
    pub resource_max_chars: usize,

    /// Whether the `mcp__*` resource/prompt tools are added to the catalog
    #[serde(default = "default_true")]
    pub synthetic_tools: bool,

    /// Backend-supplied dataset labeling rules
    #[serde(default)]
    pub dataset_rules: Vec<DatasetRule>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            transport_hints: TransportHints::default(),
            classifier: ClassifierConfig::default(),
            summary: SummaryConfig::default(),
            resource_max_chars: default_resource_max_chars(),
            synthetic_tools: true,
            dataset_rules: Vec::new(),
        }
    }
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|p| p.to_string()).collect()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_resource_max_chars() -> usize {
    50_000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.mcp_servers.is_empty());
        assert_eq!(settings.hub.denylist.len(), DEFAULT_DENYLIST.len());
        assert_eq!(settings.hub.resource_max_chars, 50_000);
        assert!(settings.hub.synthetic_tools);
    }

    #[test]
    fn test_hub_config_defaults_from_empty_object() {
        let hub: HubConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(hub.classifier.min_final_answer_chars, 100);
        assert_eq!(hub.summary.per_category, 3);
        assert!(hub.dataset_rules.is_empty());
    }

    #[test]
    fn test_backend_config_stdio_parse() {
        let json = r#"{"command": "uv", "args": ["run", "server.py"]}"#;
        let config: BackendConfig = serde_json::from_str(json).unwrap();
        match config {
            BackendConfig::Stdio(stdio) => {
                assert_eq!(stdio.command, "uv");
                assert_eq!(stdio.args, vec!["run", "server.py"]);
                assert_eq!(stdio.timeout_ms, 30_000);
            }
            BackendConfig::Http(_) => panic!("Expected stdio backend"),
        }
    }

    #[test]
    fn test_backend_config_http_parse() {
        let json = r#"{
            "url": "https://example.test/mcp",
            "transport": "http",
            "authTokenEnv": "SLEEPY_TOKEN",
            "credentialParam": "token"
        }"#;
        let config: BackendConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.credential_param(), Some("token"));
        assert!(config.requires_credential());
        match config {
            BackendConfig::Http(http) => {
                assert_eq!(http.url, "https://example.test/mcp");
                assert_eq!(http.auth_token_env.as_deref(), Some("SLEEPY_TOKEN"));
            }
            BackendConfig::Stdio(_) => panic!("Expected http backend"),
        }
    }

    #[test]
    fn test_stdio_backend_has_no_credential_param() {
        let config: BackendConfig = serde_json::from_str(r#"{"command": "node"}"#).unwrap();
        assert!(config.credential_param().is_none());
        assert!(!config.requires_credential());
    }

    #[test]
    fn test_full_settings_parse() {
        let json = r#"{
            "mcpServers": {
                "uv-mcp": {"command": "uv", "args": ["run", "eda"]},
                "remote": {"url": "http://localhost:9000/mcp"}
            },
            "hub": {
                "denylist": ["^exec_"],
                "transportHints": {"local": ["uv-*"], "remote": ["remote"]},
                "classifier": {"minFinalAnswerChars": 40, "answerDelimiter": "===A==="},
                "summary": {"budgetChars": 800, "perCategory": 2}
            }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.mcp_servers.len(), 2);
        assert_eq!(settings.hub.denylist, vec!["^exec_"]);
        assert_eq!(settings.hub.classifier.min_final_answer_chars, 40);
        assert_eq!(settings.hub.classifier.answer_delimiter, "===A===");
        assert_eq!(settings.hub.summary.budget_chars, 800);
        assert_eq!(settings.hub.transport_hints.local, vec!["uv-*"]);
    }

    #[test]
    fn test_settings_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mcp-config.json");

        let mut settings = Settings::default();
        settings.hub.resource_max_chars = 1234;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.hub.resource_max_chars, 1234);
    }

    #[test]
    fn test_settings_load_missing_file_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        let loaded = Settings::load_from(&path).unwrap();
        assert!(loaded.mcp_servers.is_empty());
    }
}
