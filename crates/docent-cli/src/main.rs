use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use tracing_subscriber::EnvFilter;

use docent::agent::Agent;
use docent::mcp::{McpToolset, Toolset};
use docent::memory::MessageStore;
use docent::providers::configs::OpenAiProviderConfig;
use docent::providers::openai::OpenAiProvider;
use docent::registry::{ServerConfig, ServerRegistry};

use crate::prompt::cliclack::CliclackPrompt;
use crate::session::Session;

mod prompt;
mod session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model to use
    #[arg(short, long, default_value = "gpt-5-nano")]
    model: String,

    /// OpenAI API key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// OpenAI-compatible API host
    #[arg(long, default_value = "https://api.openai.com")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docent=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .context("API key must be provided via --api-key or OPENAI_API_KEY environment variable")?;

    // The servers the agent can pilot: library documentation over streamable
    // HTTP and the Met Museum collection as a local npx process
    let registry = ServerRegistry::new()
        .with_server(
            "context7",
            ServerConfig::streamable_http("https://mcp.context7.com/mcp"),
        )
        .with_server(
            "met-museum",
            ServerConfig::stdio("npx", &["-y", "metmuseum-mcp"]),
        );

    // Any unreachable server is fatal here, before the menu is ever shown
    let toolset = McpToolset::connect(&registry).await?;
    tracing::info!(tools = toolset.tools().len(), "tool discovery complete");

    let provider = OpenAiProvider::new(OpenAiProviderConfig::new(cli.host, api_key, cli.model))?;
    let agent = Agent::new(Box::new(provider), Box::new(toolset), MessageStore::new());

    let thread_id = uuid::Uuid::new_v4().to_string();
    let mut session = Session::new(agent, Box::new(CliclackPrompt::new()), thread_id);
    session.start().await
}
