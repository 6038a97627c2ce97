// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::catalog::{check_backend_name, ToolDenylist};
use crate::error::{HubError, Result};

use super::{BackendConfig, Settings};

impl Settings {
    /// Get the bearer credential for a backend, checking the env var first.
    pub fn credential_for(&self, backend: &str) -> Option<String> {
        let BackendConfig::Http(http) = self.mcp_servers.get(backend)? else {
            return None;
        };

        // Priority: env var > config file.
        http.auth_token_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|token| !token.trim().is_empty())
            .or_else(|| http.auth_token.clone())
    }

    /// Check the settings for structural problems.
    ///
    /// Backend names must be usable as the first segment of a namespaced tool
    /// name, and every pattern must compile.
    pub fn validate(&self) -> Result<()> {
        for name in self.mcp_servers.keys() {
            check_backend_name(name)?;
        }

        ToolDenylist::new(&self.hub.denylist)?;
        self.hub.transport_hints.compile()?;

        if self.hub.classifier.answer_delimiter.trim().is_empty() {
            return Err(HubError::Config(
                "classifier.answerDelimiter must not be empty".to_string(),
            ));
        }
        if self.hub.summary.per_category == 0 {
            return Err(HubError::Config(
                "summary.perCategory must be at least 1".to_string(),
            ));
        }

        for (name, config) in &self.mcp_servers {
            if let BackendConfig::Http(http) = config {
                if reqwest::Url::parse(&http.url).is_err() {
                    return Err(HubError::Config(format!(
                        "Backend '{}' has an invalid url: {}",
                        name, http.url
                    )));
                }
            }
        }

        Ok(())
    }
}
