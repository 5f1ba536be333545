//! Declares which MCP tool servers to reach and how.
//!
//! The registry is pure configuration: it holds connection descriptors and
//! never opens a connection itself. Malformed entries surface as connection
//! failures when the toolset is built.

use serde::{Deserialize, Serialize};

/// How to reach one tool server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum ServerConfig {
    /// A remote server reached over streamable HTTP.
    StreamableHttp { url: String },
    /// A local server spawned as a child process, speaking over stdio.
    Stdio { command: String, args: Vec<String> },
}

impl ServerConfig {
    pub fn streamable_http<S: Into<String>>(url: S) -> Self {
        ServerConfig::StreamableHttp { url: url.into() }
    }

    pub fn stdio<S: Into<String>>(command: S, args: &[&str]) -> Self {
        ServerConfig::Stdio {
            command: command.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

/// An ordered mapping from server name to connection descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerRegistry {
    servers: Vec<(String, ServerConfig)>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server under a unique name, preserving declaration order
    pub fn with_server<S: Into<String>>(mut self, name: S, config: ServerConfig) -> Self {
        self.servers.push((name.into(), config));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServerConfig)> {
        self.servers
            .iter()
            .map(|(name, config)| (name.as_str(), config))
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
