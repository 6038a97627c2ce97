// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Model Context Protocol (MCP) client support
//!
//! Backends are reached over local process pipes or HTTP. The core only sees
//! the [`Backend`] trait; the clients here are the reference implementations.

pub mod backend;
pub mod client;
pub mod protocol;
pub mod transport;

pub use backend::{Backend, BackendSet, CredentialProvider, EnvCredentials, StaticCredentials};
pub use client::{connect_all, connect_backend, Connections, HttpBackend, McpClient, StdioBackend};
pub use protocol::*;
pub use transport::{HttpChannel, RpcChannel, StdioChannel};
