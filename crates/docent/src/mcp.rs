//! Connections to MCP tool servers.
//!
//! The protocol itself (initialize handshake, `tools/list`, `tools/call`,
//! transport framing) is delegated to the official rmcp SDK; this module
//! supplies connection parameters from the registry, aggregates the tools
//! every server exposes into one flat collection, and routes tool calls back
//! to the owning connection.

use std::collections::HashMap;

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, ClientInfo, Implementation, RawContent};
use rmcp::service::RunningService;
use rmcp::transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};
use crate::registry::{ServerConfig, ServerRegistry};

/// A source of callable tools the agent can dispatch to
#[async_trait]
pub trait Toolset: Send + Sync {
    /// All tools this source exposes
    fn tools(&self) -> &[Tool];

    /// Execute one tool call and return its content
    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>>;
}

struct McpServer {
    name: String,
    service: RunningService<RoleClient, ClientInfo>,
}

/// The union of tools exposed by every server in a registry, with each tool
/// routed back to the connection that owns it.
pub struct McpToolset {
    servers: Vec<McpServer>,
    tools: Vec<Tool>,
    routes: HashMap<String, usize>,
}

impl std::fmt::Debug for McpToolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolset")
            .field("servers", &self.servers.len())
            .field("tools", &self.tools.len())
            .field("routes", &self.routes)
            .finish()
    }
}

impl McpToolset {
    /// Connect to every server in the registry and list its tools.
    ///
    /// Any server that cannot be reached, or that fails to list its tools,
    /// fails the whole construction. An empty registry yields an empty
    /// toolset.
    pub async fn connect(registry: &ServerRegistry) -> Result<Self> {
        let mut servers = Vec::new();
        let mut per_server = Vec::new();

        for (name, config) in registry.iter() {
            let service = open_service(config)
                .await
                .with_context(|| format!("failed to connect to tool server '{}'", name))?;

            let listed = service
                .list_all_tools()
                .await
                .with_context(|| format!("failed to list tools from server '{}'", name))?;

            info!(server = name, tools = listed.len(), "connected to tool server");

            let tools: Vec<Tool> = listed.iter().map(tool_from_mcp).collect();
            per_server.push((name.to_string(), tools));
            servers.push(McpServer {
                name: name.to_string(),
                service,
            });
        }

        let (tools, routes) = aggregate(&per_server)?;

        Ok(Self {
            servers,
            tools,
            routes,
        })
    }
}

#[async_trait]
impl Toolset for McpToolset {
    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        let index = *self
            .routes
            .get(&tool_call.name)
            .ok_or_else(|| AgentError::ToolNotFound(tool_call.name.clone()))?;
        let server = &self.servers[index];

        let arguments = match &tool_call.arguments {
            Value::Object(map) => Some(map.clone()),
            Value::Null => None,
            other => {
                return Err(AgentError::InvalidParameters(format!(
                    "tool arguments must be a JSON object, got: {}",
                    other
                )))
            }
        };

        debug!(server = %server.name, tool = %tool_call.name, "dispatching tool call");

        let result = server
            .service
            .call_tool(CallToolRequestParam {
                name: tool_call.name.clone().into(),
                arguments,
            })
            .await
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;

        let content: Vec<Content> = result.content.iter().map(content_from_mcp).collect();

        if result.is_error.unwrap_or(false) {
            let detail = content
                .iter()
                .filter_map(Content::as_text)
                .collect::<Vec<_>>()
                .join("\n");
            return Err(AgentError::ExecutionError(if detail.is_empty() {
                format!("tool '{}' reported an error", tool_call.name)
            } else {
                detail
            }));
        }

        Ok(content)
    }
}

async fn open_service(config: &ServerConfig) -> Result<RunningService<RoleClient, ClientInfo>> {
    match config {
        ServerConfig::StreamableHttp { url } => {
            let transport = StreamableHttpClientTransport::from_uri(url.as_str());
            Ok(client_info().serve(transport).await?)
        }
        ServerConfig::Stdio { command, args } => {
            let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
                for arg in args {
                    cmd.arg(arg);
                }
            }))?;
            Ok(client_info().serve(transport).await?)
        }
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        client_info: Implementation::from_build_env(),
        ..ClientInfo::default()
    }
}

fn tool_from_mcp(tool: &rmcp::model::Tool) -> Tool {
    Tool::new(
        tool.name.to_string(),
        tool.description.as_deref().unwrap_or_default(),
        Value::Object(tool.input_schema.as_ref().clone()),
    )
}

fn content_from_mcp(content: &rmcp::model::Content) -> Content {
    match &content.raw {
        RawContent::Text(text) => Content::text(text.text.clone()),
        RawContent::Image(image) => Content::image(image.data.clone(), image.mime_type.clone()),
        other => Content::text(serde_json::to_string(other).unwrap_or_default()),
    }
}

/// Union the per-server tool lists into one flat collection plus a routing
/// table from tool name to server position. A tool name exposed by two
/// servers is rejected rather than silently shadowed.
fn aggregate(per_server: &[(String, Vec<Tool>)]) -> Result<(Vec<Tool>, HashMap<String, usize>)> {
    let mut tools = Vec::new();
    let mut routes: HashMap<String, usize> = HashMap::new();

    for (index, (server, server_tools)) in per_server.iter().enumerate() {
        for tool in server_tools {
            if let Some(&existing) = routes.get(&tool.name) {
                bail!(
                    "tool '{}' is exposed by both '{}' and '{}'",
                    tool.name,
                    per_server[existing].0,
                    server
                );
            }
            routes.insert(tool.name.clone(), index);
            tools.push(tool.clone());
        }
    }

    Ok((tools, routes))
}
