// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::{Path, PathBuf};

use crate::error::{HubError, Result};

use super::Settings;

/// File name looked up in the working directory and the hub home.
pub const CONFIG_FILE_NAME: &str = "mcp-config.json";

impl Settings {
    /// Load settings from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Resolve and load the settings file.
    ///
    /// An explicit path must exist. Otherwise `./mcp-config.json` is tried,
    /// then `$MCP_HUB_HOME/mcp-config.json` (default `~/.mcp-hub`). Returns the
    /// path that was used, if any.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(HubError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok((Self::load_from(path)?, Some(path.to_path_buf())));
        }

        let candidates = [
            std::env::current_dir()?.join(CONFIG_FILE_NAME),
            Self::hub_home().join(CONFIG_FILE_NAME),
        ];

        for candidate in candidates {
            if candidate.exists() {
                tracing::debug!("Loading settings from {}", candidate.display());
                return Ok((Self::load_from(&candidate)?, Some(candidate)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Save settings to a specific path, fully overwriting.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the hub home directory (~/.mcp-hub or $MCP_HUB_HOME).
    pub fn hub_home() -> PathBuf {
        if let Ok(home) = std::env::var("MCP_HUB_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mcp-hub")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_explicit_missing_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.json");
        let err = Settings::discover(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_discover_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        std::fs::write(
            &path,
            r#"{"mcpServers": {"eda": {"command": "python", "args": ["-m", "eda"]}}}"#,
        )
        .unwrap();

        let (settings, used) = Settings::discover(Some(&path)).unwrap();
        assert_eq!(used.as_deref(), Some(path.as_path()));
        assert!(settings.mcp_servers.contains_key("eda"));
    }

    #[test]
    fn test_load_from_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(HubError::Json(_))
        ));
    }

    #[test]
    fn test_save_to_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir").join(CONFIG_FILE_NAME);
        Settings::default().save_to(&path).unwrap();
        assert!(path.exists());
    }
}
