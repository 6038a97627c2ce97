// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! MCP client backends and connection setup

use async_trait::async_trait;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::backend::{Backend, BackendSet, CredentialProvider};
use super::protocol::{
    CallToolParams, GetPromptResult, InitializeParams, Prompt, PromptsListResult,
    ReadResourceResult, Resource, ResourcesListResult, Tool, ToolsListResult,
};
use super::transport::{HttpChannel, RpcChannel, StdioChannel};
use crate::config::{BackendConfig, Settings};
use crate::error::{HubError, Result};
use crate::events::SourceTransport;

/// Upper bound on list pages, in case a server keeps returning cursors
const MAX_PAGES: usize = 64;

/// A backend reached through an MCP session on some channel
pub struct McpClient<C: RpcChannel> {
    name: String,
    channel: C,
    transport: SourceTransport,
}

/// Local-process backend
pub type StdioBackend = McpClient<StdioChannel>;

/// Streaming-HTTP backend
pub type HttpBackend = McpClient<HttpChannel>;

impl<C: RpcChannel> McpClient<C> {
    /// Run the initialize handshake on `channel`.
    pub async fn connect(
        name: impl Into<String>,
        channel: C,
        transport: SourceTransport,
    ) -> Result<Self> {
        let client = Self {
            name: name.into(),
            channel,
            transport,
        };

        let init = client
            .channel
            .request(
                "initialize",
                Some(serde_json::to_value(InitializeParams::default())?),
            )
            .await?;
        let server_info = init.get("serverInfo").cloned().unwrap_or_default();
        tracing::debug!("Initialized backend '{}': {}", client.name, server_info);
        client
            .channel
            .notify("notifications/initialized", None)
            .await?;

        Ok(client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        let value = self.channel.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| {
            HubError::Protocol(format!("{} from '{}': {}", method, self.name, e))
        })
    }

    /// Follow `nextCursor` until the listing is exhausted.
    async fn paginate<P, T>(
        &self,
        method: &str,
        split: impl Fn(P) -> (Vec<T>, Option<String>),
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let (page, next) = split(self.call::<P>(method, params).await?);
            items.extend(page);
            match next {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(items),
            }
        }
        tracing::warn!(
            "Backend '{}' returned more than {} pages for {}",
            self.name,
            MAX_PAGES,
            method
        );
        Ok(items)
    }
}

#[async_trait]
impl<C: RpcChannel> Backend for McpClient<C> {
    fn transport(&self) -> SourceTransport {
        self.transport
    }

    async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.paginate("tools/list", |page: ToolsListResult| {
            (page.tools, page.next_cursor)
        })
        .await
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments: Some(args),
        };
        self.channel
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        self.paginate("resources/list", |page: ResourcesListResult| {
            (page.resources, page.next_cursor)
        })
        .await
    }

    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        self.call("resources/read", Some(json!({ "uri": uri })))
            .await
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        self.paginate("prompts/list", |page: PromptsListResult| {
            (page.prompts, page.next_cursor)
        })
        .await
    }

    async fn get_prompt(&self, name: &str, args: Map<String, Value>) -> Result<GetPromptResult> {
        self.call(
            "prompts/get",
            Some(json!({ "name": name, "arguments": args })),
        )
        .await
    }
}

/// Outcome of connecting every configured backend
#[derive(Default)]
pub struct Connections {
    pub backends: BackendSet,
    /// Backends that could not be reached, with the reason
    pub failures: BTreeMap<String, HubError>,
}

/// Connect one configured backend.
pub async fn connect_backend(
    name: &str,
    config: &BackendConfig,
    credentials: &dyn CredentialProvider,
) -> Result<Arc<dyn Backend>> {
    match config {
        BackendConfig::Stdio(stdio) => {
            let channel = StdioChannel::spawn(stdio)?;
            let client = McpClient::connect(name, channel, SourceTransport::LocalProcess).await?;
            Ok(Arc::new(client))
        }
        BackendConfig::Http(http) => {
            let bearer = credentials.credential(name);
            if bearer.is_none() && config.requires_credential() {
                return Err(HubError::Config(format!(
                    "Backend '{}' requires a credential but none is available",
                    name
                )));
            }
            let channel = HttpChannel::new(http, bearer)?;
            let client = McpClient::connect(name, channel, SourceTransport::StreamingHttp).await?;
            Ok(Arc::new(client))
        }
    }
}

/// Connect every configured backend concurrently. A failure only excludes
/// that backend.
pub async fn connect_all(settings: &Settings, credentials: &dyn CredentialProvider) -> Connections {
    let attempts = settings.mcp_servers.iter().map(|(name, config)| async move {
        (name.clone(), connect_backend(name, config, credentials).await)
    });

    let mut connections = Connections::default();
    for (name, outcome) in join_all(attempts).await {
        match outcome {
            Ok(backend) => {
                tracing::info!("Connected backend '{}'", name);
                connections.backends.insert(name, backend);
            }
            Err(e) => {
                tracing::warn!("Skipping backend '{}': {}", name, e);
                connections.failures.insert(name, e);
            }
        }
    }
    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::StaticCredentials;
    use std::sync::Mutex;

    /// Channel answering from a script of (method, result) pairs
    struct Scripted {
        replies: Mutex<Vec<(String, Value)>>,
        seen: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl Scripted {
        fn new(replies: Vec<(&str, Value)>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|(m, v)| (m.to_string(), v))
                        .collect(),
                ),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RpcChannel for Scripted {
        async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
            self.seen
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            let mut replies = self.replies.lock().unwrap();
            let index = replies
                .iter()
                .position(|(m, _)| m == method)
                .ok_or_else(|| HubError::Protocol(format!("unexpected {}", method)))?;
            Ok(replies.remove(index).1)
        }

        async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
            self.seen
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_connect_runs_handshake() {
        let channel = Scripted::new(vec![(
            "initialize",
            json!({"serverInfo": {"name": "eda", "version": "1"}}),
        )]);
        let client = McpClient::connect("eda", channel, SourceTransport::LocalProcess)
            .await
            .unwrap();
        let seen = client.channel.seen.lock().unwrap();
        assert_eq!(seen[0].0, "initialize");
        assert_eq!(seen[1].0, "notifications/initialized");
        assert_eq!(client.transport(), SourceTransport::LocalProcess);
    }

    #[tokio::test]
    async fn test_list_tools_follows_cursor() {
        let channel = Scripted::new(vec![
            ("initialize", json!({})),
            (
                "tools/list",
                json!({"tools": [{"name": "a"}], "nextCursor": "p2"}),
            ),
            ("tools/list", json!({"tools": [{"name": "b"}]})),
        ]);
        let client = McpClient::connect("eda", channel, SourceTransport::Direct)
            .await
            .unwrap();
        let tools = client.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let seen = client.channel.seen.lock().unwrap();
        assert_eq!(seen[3].1, Some(json!({"cursor": "p2"})));
    }

    #[tokio::test]
    async fn test_call_tool_sends_original_name() {
        let channel = Scripted::new(vec![
            ("initialize", json!({})),
            ("tools/call", json!({"content": []})),
        ]);
        let client = McpClient::connect("eda", channel, SourceTransport::Direct)
            .await
            .unwrap();
        client.call_tool("describe", json!({"x": 1})).await.unwrap();
        let seen = client.channel.seen.lock().unwrap();
        assert_eq!(
            seen[2].1,
            Some(json!({"name": "describe", "arguments": {"x": 1}}))
        );
    }

    #[tokio::test]
    async fn test_malformed_listing_is_protocol_error() {
        let channel = Scripted::new(vec![
            ("initialize", json!({})),
            ("prompts/list", json!({"oops": true})),
        ]);
        let client = McpClient::connect("eda", channel, SourceTransport::Direct)
            .await
            .unwrap();
        assert!(matches!(
            client.list_prompts().await,
            Err(HubError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_all_skips_missing_credential() {
        let settings: Settings = serde_json::from_value(json!({
            "mcpServers": {
                "remote": {"url": "http://127.0.0.1:9/mcp", "authTokenEnv": "MCP_HUB_TEST_UNSET_TOKEN"}
            }
        }))
        .unwrap();
        let connections = connect_all(&settings, &StaticCredentials::new()).await;
        assert!(connections.backends.is_empty());
        assert!(matches!(
            connections.failures.get("remote"),
            Some(HubError::Config(_))
        ));
    }
}
