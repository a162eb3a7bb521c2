//! Badevand MCP Server
//!
//! A Model Context Protocol (MCP) server for Danish beach water quality.
//! Provides tools for mapping, comparing and ranking beaches from badevand.dk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use badevand_mcp_server::beaches::client;
use badevand_mcp_server::config::{Config, DataSource};
use badevand_mcp_server::mcp::http::{self, HttpState};
use badevand_mcp_server::mcp::server::McpServer;
use badevand_mcp_server::mcp::tools::ToolHandler;
use badevand_mcp_server::mcp::widgets::WidgetRegistry;

/// Badevand MCP Server
#[derive(Parser)]
#[command(name = "badevand-mcp-server")]
#[command(author, version, about = "Badevand MCP Server - Danish beach water quality as MCP tools")]
struct Cli {
    /// Serve beach records from a JSON file instead of the live API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Beach API endpoint
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory containing the built widget HTML
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Stdio,

    /// Serve MCP over HTTP with server-sent events
    Http {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration, command line wins over environment
    let mut config = Config::new().context("failed to read configuration")?;
    if let Some(path) = cli.fixture {
        config.data_source = DataSource::Fixture(path);
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(assets_dir) = cli.assets_dir {
        config.assets_dir = assets_dir;
    }

    let widgets = Arc::new(WidgetRegistry::load(&config.assets_dir).with_context(|| {
        format!(
            "widget assets missing in {}; build the widgets before starting the server",
            config.assets_dir.display()
        )
    })?);
    let source = client::from_config(&config).context("failed to set up beach data source")?;
    let tool_handler = Arc::new(ToolHandler::new(source, widgets.clone()));

    match cli.command.unwrap_or(Commands::Stdio) {
        Commands::Stdio => {
            let mut server = McpServer::new(tool_handler, widgets);
            server.run_stdio().await?;
        }
        Commands::Http { host, port } => {
            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            let state = HttpState::new(tool_handler, widgets);
            http::serve(state, &config.assets_dir, &host, port).await?;
        }
    }

    Ok(())
}
