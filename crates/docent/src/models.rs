//! The objects passed around by the agent.
//!
//! Several wire formats meet here: OpenAI messages/tools sent to the LLM,
//! and MCP tool definitions and results coming back from tool servers. Both
//! are converted into these internal structs at the boundary, so the rest of
//! the crate never handles a provider- or protocol-specific shape.

pub mod content;
pub mod message;
pub mod role;
pub mod tool;
