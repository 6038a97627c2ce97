// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use tempfile::TempDir;

use mcp_hub::config::{BackendConfig, Settings};
use mcp_hub::error::HubError;

const SAMPLE: &str = r#"{
    "mcpServers": {
        "eda": {"command": "python", "args": ["-m", "eda_server"], "env": {"EDA_DATA": "/data"}},
        "warehouse": {
            "url": "https://warehouse.example.com/mcp",
            "transport": "http",
            "authTokenEnv": "WAREHOUSE_TOKEN_CONFIG_TESTS",
            "credentialParam": "api_key",
            "timeoutMs": 5000
        }
    },
    "hub": {
        "denylist": ["^drop_"],
        "transportHints": {"local": ["eda*"], "remote": ["warehouse"]},
        "classifier": {"minFinalAnswerChars": 40},
        "summary": {"budgetChars": 800},
        "syntheticTools": false,
        "datasetRules": [{"toolContains": "load", "dataset": "Compounds", "countRows": true}]
    }
}"#;

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert!(settings.mcp_servers.is_empty());
    assert!(settings.hub.synthetic_tools);
    assert_eq!(settings.hub.resource_max_chars, 50_000);
    assert_eq!(settings.hub.classifier.min_final_answer_chars, 100);
    assert_eq!(settings.hub.classifier.answer_delimiter, "---ANSWER---");
    assert_eq!(settings.hub.summary.budget_chars, 2000);
    assert_eq!(settings.hub.summary.per_category, 3);
    assert!(!settings.hub.denylist.is_empty());
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_deserialization() {
    let settings: Settings = serde_json::from_str(SAMPLE).expect("Should deserialize from JSON");

    match &settings.mcp_servers["eda"] {
        BackendConfig::Stdio(stdio) => {
            assert_eq!(stdio.command, "python");
            assert_eq!(stdio.args, vec!["-m", "eda_server"]);
            assert_eq!(stdio.env["EDA_DATA"], "/data");
        }
        other => panic!("Expected stdio backend, got {:?}", other),
    }
    match &settings.mcp_servers["warehouse"] {
        BackendConfig::Http(http) => {
            assert_eq!(http.url, "https://warehouse.example.com/mcp");
            assert_eq!(http.timeout_ms, 5000);
        }
        other => panic!("Expected http backend, got {:?}", other),
    }
    assert_eq!(
        settings.mcp_servers["warehouse"].credential_param(),
        Some("api_key")
    );
    assert!(settings.mcp_servers["warehouse"].requires_credential());

    // Unset fields keep their defaults
    assert_eq!(settings.hub.classifier.min_final_answer_chars, 40);
    assert_eq!(settings.hub.classifier.answer_delimiter, "---ANSWER---");
    assert_eq!(settings.hub.summary.budget_chars, 800);
    assert_eq!(settings.hub.summary.per_category, 3);
    assert!(!settings.hub.synthetic_tools);
    assert_eq!(settings.hub.dataset_rules[0].dataset.as_deref(), Some("Compounds"));
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_credential_priority() {
    let mut settings: Settings = serde_json::from_str(SAMPLE).unwrap();
    if let Some(BackendConfig::Http(http)) = settings.mcp_servers.get_mut("warehouse") {
        http.auth_token = Some("config-token".to_string());
    }

    // Without env var, should use config token
    std::env::remove_var("WAREHOUSE_TOKEN_CONFIG_TESTS");
    assert_eq!(
        settings.credential_for("warehouse"),
        Some("config-token".to_string())
    );

    // With env var set, should prefer env var
    std::env::set_var("WAREHOUSE_TOKEN_CONFIG_TESTS", "env-token");
    assert_eq!(
        settings.credential_for("warehouse"),
        Some("env-token".to_string())
    );

    std::env::remove_var("WAREHOUSE_TOKEN_CONFIG_TESTS");
    assert_eq!(settings.credential_for("eda"), None);
    assert_eq!(settings.credential_for("unknown"), None);
}

#[test]
fn test_settings_validation_rejects_bad_names() {
    for name in ["mcp", "bad__name", "", "trailing_"] {
        let json = format!(r#"{{"mcpServers": {{"{}": {{"command": "true"}}}}}}"#, name);
        let settings: Settings = serde_json::from_str(&json).unwrap();
        assert!(
            matches!(settings.validate(), Err(HubError::Config(_))),
            "{:?} should be rejected",
            name
        );
    }
}

#[test]
fn test_settings_validation_rejects_bad_patterns() {
    let mut settings = Settings::default();
    settings.hub.denylist = vec!["(".to_string()];
    assert!(matches!(settings.validate(), Err(HubError::Config(_))));

    let mut settings = Settings::default();
    settings.hub.classifier.answer_delimiter = "  ".to_string();
    assert!(matches!(settings.validate(), Err(HubError::Config(_))));
}

#[test]
fn test_settings_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("mcp-config.json");

    let settings: Settings = serde_json::from_str(SAMPLE).unwrap();
    settings.save_to(&path).unwrap();

    let (reloaded, used) = Settings::discover(Some(&path)).unwrap();
    assert_eq!(used.as_deref(), Some(path.as_path()));
    assert_eq!(reloaded.mcp_servers.len(), 2);
    assert_eq!(reloaded.hub.denylist, vec!["^drop_"]);
    assert_eq!(reloaded.hub.summary.budget_chars, 800);
}

#[test]
fn test_settings_missing_file_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load_from(&temp_dir.path().join("absent.json")).unwrap();
    assert!(settings.mcp_servers.is_empty());
}
