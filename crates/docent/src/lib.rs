//! An agent that pilots external tool servers through a chat model.
//!
//! The pieces compose in a straight line: a [`registry::ServerRegistry`]
//! names the MCP servers to reach, [`mcp::McpToolset`] connects to them and
//! aggregates their tools, and [`agent::Agent`] binds that toolset to a
//! [`providers::base::Provider`] and a [`memory::MessageStore`] so each
//! invocation continues one conversation thread.

pub mod agent;
pub mod errors;
pub mod mcp;
pub mod memory;
pub mod models;
pub mod providers;
pub mod registry;
