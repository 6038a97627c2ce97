// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! MCP transport layer, client side
//!
//! Local servers speak newline-delimited JSON-RPC 2.0 over the child's
//! stdin/stdout. Remote servers take JSON-RPC in an HTTP POST and answer with
//! either a JSON body or an SSE stream of `data:` lines.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::config::{HttpBackendConfig, StdioBackendConfig};
use crate::error::{HubError, Result};

/// Header carrying the streamable-HTTP session id
pub const SESSION_HEADER: &str = "mcp-session-id";

/// A request/response channel to one server
#[async_trait]
pub trait RpcChannel: Send + Sync {
    /// Send a request and wait for its result.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// Send a notification; no answer is expected.
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;
}

fn rpc_result(method: &str, response: JsonRpcResponse) -> Result<Value> {
    response
        .into_result()
        .map_err(|e| HubError::Protocol(format!("{} failed: {}", method, e)))
}

struct StdioIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// JSON-RPC over a child process
pub struct StdioChannel {
    io: Mutex<StdioIo>,
    // Held so the child lives (and is killed) with the channel.
    _child: Child,
    next_id: AtomicU64,
    timeout: Duration,
}

impl StdioChannel {
    /// Spawn the configured command.
    pub fn spawn(config: &StdioBackendConfig) -> Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                HubError::Transport(format!("Failed to spawn '{}': {}", config.command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HubError::Transport("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HubError::Transport("Failed to get stdout".to_string()))?;

        Ok(Self {
            io: Mutex::new(StdioIo {
                stdin,
                stdout: BufReader::new(stdout),
            }),
            _child: child,
            next_id: AtomicU64::new(1),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    async fn write_line(io: &mut StdioIo, message: &JsonRpcRequest) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;
        Ok(())
    }

    /// Read lines until the response for `id` shows up. Notifications and
    /// server-initiated requests are skipped.
    async fn read_response(io: &mut StdioIo, id: u64) -> Result<JsonRpcResponse> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = io.stdout.read_line(&mut line).await?;
            if read == 0 {
                return Err(HubError::Transport("Server closed stdout".to_string()));
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<JsonRpcResponse>(trimmed) {
                Ok(response) if response.answers(id) => return Ok(response),
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("Skipping non-JSON-RPC line from server: {}", e);
                    continue;
                }
            }
        }
    }
}

#[async_trait]
impl RpcChannel for StdioChannel {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);

        let mut io = self.io.lock().await;
        let exchange = async {
            Self::write_line(&mut io, &request).await?;
            Self::read_response(&mut io, id).await
        };
        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                HubError::Transport(format!(
                    "{} timed out after {}ms",
                    method,
                    self.timeout.as_millis()
                ))
            })??;

        rpc_result(method, response)
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let mut io = self.io.lock().await;
        Self::write_line(&mut io, &JsonRpcRequest::notification(method, params)).await
    }
}

/// JSON-RPC over HTTP POST
pub struct HttpChannel {
    client: reqwest::Client,
    url: String,
    headers: HashMap<String, String>,
    bearer: Option<String>,
    session_id: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl HttpChannel {
    pub fn new(config: &HttpBackendConfig, bearer: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            headers: config.headers.clone(),
            bearer,
            session_id: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    async fn post(&self, message: &JsonRpcRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream");

        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(session) = self.session_id.lock().await.as_deref() {
            builder = builder.header(SESSION_HEADER, session);
        }

        let response = builder.json(message).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubError::Transport(format!(
                "HTTP {} from {}: {}",
                status, self.url, body
            )));
        }

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.lock().await = Some(session.to_string());
        }

        Ok(response)
    }
}

/// Find the response for `id` in a JSON or SSE body.
pub fn parse_response_body(body: &str, is_event_stream: bool, id: u64) -> Result<JsonRpcResponse> {
    if is_event_stream {
        body.lines()
            .filter_map(|line| line.trim().strip_prefix("data:"))
            .map(str::trim)
            .filter(|data| !data.is_empty() && *data != "[DONE]")
            .filter_map(|data| serde_json::from_str::<JsonRpcResponse>(data).ok())
            .find(|response| response.answers(id))
            .ok_or_else(|| {
                HubError::Protocol(format!("No response for request {} in event stream", id))
            })
    } else {
        let response: JsonRpcResponse = serde_json::from_str(body)?;
        Ok(response)
    }
}

#[async_trait]
impl RpcChannel for HttpChannel {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let response = self.post(&JsonRpcRequest::new(id, method, params)).await?;

        let is_event_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/event-stream"));
        let body = response.text().await?;

        rpc_result(method, parse_response_body(&body, is_event_stream, id)?)
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.post(&JsonRpcRequest::notification(method, params))
            .await
            .map(|_| ())
    }
}
