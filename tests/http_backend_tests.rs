// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use mcp_hub::catalog::{CatalogBuilder, ToolDenylist};
use mcp_hub::config::{BackendConfig, HttpBackendConfig};
use mcp_hub::error::HubError;
use mcp_hub::events::SourceTransport;
use mcp_hub::mcp::{
    connect_backend, Backend, BackendSet, HttpChannel, McpClient, StaticCredentials,
};

/// Request as the mock server saw it
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    session: Option<String>,
    body: Value,
}

/// Minimal MCP server answering initialize, tools/list and tools/call
#[derive(Clone, Default)]
struct McpServerMock {
    sse: bool,
    session: Option<&'static str>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl McpServerMock {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl Respond for McpServerMock {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let rpc_method = body["method"].as_str().unwrap_or_default().to_string();
        self.seen.lock().unwrap().push(Seen {
            method: rpc_method.clone(),
            session: request
                .headers
                .get("mcp-session-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: body.clone(),
        });

        let Some(id) = body.get("id").cloned() else {
            return ResponseTemplate::new(202);
        };
        let result = match rpc_method.as_str() {
            "initialize" => json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "warehouse", "version": "1.0"}
            }),
            "tools/list" => json!({"tools": [{
                "name": "query",
                "description": "Run a read-only query",
                "inputSchema": {
                    "type": "object",
                    "properties": {"sql": {"type": "string"}, "api_key": {"type": "string"}},
                    "required": ["sql", "api_key"]
                }
            }]}),
            "tools/call" => json!({"content": [{
                "type": "text",
                "text": format!("rows for {}", body["params"]["arguments"]["sql"].as_str().unwrap_or(""))
            }]}),
            _ => json!(null),
        };
        let reply = if result.is_null() {
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "Method not found"}})
        } else {
            json!({"jsonrpc": "2.0", "id": id, "result": result})
        };

        let mut template = if self.sse {
            ResponseTemplate::new(200).set_body_raw(
                format!(
                    "event: message\ndata: {{\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}}\n\ndata: {}\n\n",
                    reply
                ),
                "text/event-stream",
            )
        } else {
            ResponseTemplate::new(200).set_body_json(reply)
        };
        if let Some(session) = self.session {
            template = template.insert_header("mcp-session-id", session);
        }
        template
    }
}

fn http_config(url: String, extra: Value) -> HttpBackendConfig {
    let mut config = json!({"url": url});
    if let (Some(target), Some(fields)) = (config.as_object_mut(), extra.as_object()) {
        target.extend(fields.clone());
    }
    serde_json::from_value(config).unwrap()
}

async fn client(server: &MockServer) -> McpClient<HttpChannel> {
    let channel = HttpChannel::new(&http_config(server.uri(), json!({})), None).unwrap();
    McpClient::connect("warehouse", channel, SourceTransport::StreamingHttp)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_json_body_handshake_and_listing() {
    let server = MockServer::start().await;
    let mock = McpServerMock::default();
    Mock::given(method("POST"))
        .respond_with(mock.clone())
        .mount(&server)
        .await;

    let client = client(&server).await;
    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "query");
    assert_eq!(client.transport(), SourceTransport::StreamingHttp);

    let methods: Vec<String> = mock.seen().into_iter().map(|s| s.method).collect();
    assert_eq!(
        methods,
        vec!["initialize", "notifications/initialized", "tools/list"]
    );
}

#[tokio::test]
async fn test_sse_body_skips_notifications() {
    let server = MockServer::start().await;
    let mock = McpServerMock {
        sse: true,
        ..Default::default()
    };
    Mock::given(method("POST"))
        .respond_with(mock.clone())
        .mount(&server)
        .await;

    let client = client(&server).await;
    let result = client
        .call_tool("query", json!({"sql": "select 1"}))
        .await
        .unwrap();
    assert_eq!(result["content"][0]["text"], "rows for select 1");
}

#[tokio::test]
async fn test_session_id_sent_after_initialize() {
    let server = MockServer::start().await;
    let mock = McpServerMock {
        session: Some("session-42"),
        ..Default::default()
    };
    Mock::given(method("POST"))
        .respond_with(mock.clone())
        .mount(&server)
        .await;

    let client = client(&server).await;
    client.list_tools().await.unwrap();

    let seen = mock.seen();
    assert_eq!(seen[0].session, None);
    assert!(seen[1..]
        .iter()
        .all(|s| s.session.as_deref() == Some("session-42")));
}

#[tokio::test]
async fn test_error_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let channel = HttpChannel::new(&http_config(server.uri(), json!({})), None).unwrap();
    let err = McpClient::connect("warehouse", channel, SourceTransport::StreamingHttp)
        .await
        .err()
        .unwrap();
    match err {
        HubError::Transport(message) => assert!(message.contains("503")),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_method_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(McpServerMock::default())
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = client.list_resources().await.unwrap_err();
    assert!(matches!(err, HubError::Protocol(_)));
}

#[tokio::test]
async fn test_bearer_credential_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(McpServerMock::default())
        .mount(&server)
        .await;

    let config = BackendConfig::Http(http_config(
        server.uri(),
        json!({"authTokenEnv": "WAREHOUSE_TOKEN_FOR_TESTS"}),
    ));
    let credentials = StaticCredentials::new().with("warehouse", "secret-token");
    let backend = connect_backend("warehouse", &config, &credentials)
        .await
        .unwrap();
    assert_eq!(backend.list_tools().await.unwrap().len(), 1);

    // Without the header no mock matches and the server answers 404
    let anonymous = BackendConfig::Http(http_config(server.uri(), json!({})));
    let Err(err) = connect_backend("warehouse", &anonymous, &StaticCredentials::new()).await
    else {
        panic!("connect without a token should fail");
    };
    assert!(matches!(err, HubError::Transport(_)));
}

#[tokio::test]
async fn test_missing_required_credential_is_config_error() {
    let config = BackendConfig::Http(http_config(
        "http://127.0.0.1:9".to_string(),
        json!({"authTokenEnv": "WAREHOUSE_TOKEN_FOR_TESTS"}),
    ));
    let Err(err) = connect_backend("warehouse", &config, &StaticCredentials::new()).await else {
        panic!("connect without a required credential should fail");
    };
    assert!(matches!(err, HubError::Config(_)));
}

#[tokio::test]
async fn test_catalog_over_http_injects_credential() {
    let server = MockServer::start().await;
    let mock = McpServerMock::default();
    Mock::given(method("POST"))
        .respond_with(mock.clone())
        .mount(&server)
        .await;

    let backend = client(&server).await;
    let mut backends = BackendSet::new();
    backends.insert("warehouse".to_string(), Arc::new(backend) as Arc<dyn Backend>);

    let catalog = CatalogBuilder::new(ToolDenylist::default())
        .with_credential_param("warehouse", "api_key")
        .with_credentials(Arc::new(
            StaticCredentials::new().with("warehouse", "secret-token"),
        ))
        .build(backends)
        .await;

    let definition = catalog.get("warehouse__query").unwrap().definition();
    assert!(!definition.to_string().contains("api_key"));

    let result = catalog
        .dispatch("warehouse__query", json!({"sql": "select cv"}))
        .await;
    assert!(!result.is_error());
    assert_eq!(result.output_text(), "rows for select cv");

    let call = mock
        .seen()
        .into_iter()
        .find(|s| s.method == "tools/call")
        .unwrap();
    assert_eq!(call.body["params"]["name"], "query");
    assert_eq!(call.body["params"]["arguments"]["api_key"], "secret-token");
}
