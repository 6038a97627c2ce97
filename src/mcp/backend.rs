// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Backend and credential seams

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::protocol::{GetPromptResult, Prompt, ReadResourceResult, Resource, Tool};
use crate::config::Settings;
use crate::error::{HubError, Result};
use crate::events::SourceTransport;

/// One connected tool server
#[async_trait]
pub trait Backend: Send + Sync {
    /// Transport family, used to label dispatched calls
    fn transport(&self) -> SourceTransport {
        SourceTransport::Direct
    }

    async fn list_tools(&self) -> Result<Vec<Tool>>;

    /// Invoke a tool by its original (un-namespaced) name. Returns the raw
    /// `tools/call` result.
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value>;

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        Ok(Vec::new())
    }

    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        Err(HubError::Protocol(format!(
            "resources are not supported (requested {})",
            uri
        )))
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        Ok(Vec::new())
    }

    async fn get_prompt(&self, name: &str, _args: Map<String, Value>) -> Result<GetPromptResult> {
        Err(HubError::Protocol(format!(
            "prompts are not supported (requested {})",
            name
        )))
    }
}

/// Connected backends keyed by backend name
pub type BackendSet = BTreeMap<String, Arc<dyn Backend>>;

/// Out-of-band bearer credential per backend
pub trait CredentialProvider: Send + Sync {
    fn credential(&self, backend: &str) -> Option<String>;
}

/// Reads credentials the way the settings describe them (env var, then inline)
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    settings: Settings,
}

impl EnvCredentials {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn credential(&self, backend: &str) -> Option<String> {
        self.settings.credential_for(backend)
    }
}

/// Fixed credentials, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(backend.into(), token.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self, backend: &str) -> Option<String> {
        self.tokens.get(backend).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    #[async_trait]
    impl Backend for Bare {
        async fn list_tools(&self) -> Result<Vec<Tool>> {
            Ok(Vec::new())
        }

        async fn call_tool(&self, _name: &str, _args: Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn test_default_resource_and_prompt_support() {
        let backend = Bare;
        assert_eq!(backend.transport(), SourceTransport::Direct);
        assert!(backend.list_resources().await.unwrap().is_empty());
        assert!(backend.list_prompts().await.unwrap().is_empty());
        assert!(matches!(
            backend.read_resource("mem://x").await,
            Err(HubError::Protocol(_))
        ));
        assert!(backend.get_prompt("p", Map::new()).await.is_err());
    }

    #[test]
    fn test_static_credentials() {
        let creds = StaticCredentials::new().with("sleepyrat", "abc");
        assert_eq!(creds.credential("sleepyrat").as_deref(), Some("abc"));
        assert!(creds.credential("other").is_none());
    }

    #[test]
    fn test_env_credentials_unknown_backend() {
        let creds = EnvCredentials::new(&Settings::default());
        assert!(creds.credential("missing").is_none());
    }
}
