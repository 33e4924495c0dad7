use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::{transport::io::stdio, ServiceExt};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mcpd::config;
use mcpd::mcp::ToolServer;
use mcpd::registry::{RegistryHandle, ToolRegistry};
use mcpd::server::HttpServer;
use mcpd::watcher;

#[derive(Parser)]
#[command(name = "mcpd")]
#[command(about = "Expose declared external commands as MCP and HTTP tools")]
#[command(version)]
struct Cli {
    /// Path to the tool config file
    #[arg(long, short, default_value = "tools.yaml", global = true)]
    config: PathBuf,

    /// Server name advertised to clients
    #[arg(long, default_value = "mcpd", global = true)]
    name: String,

    /// Reload the config when the file changes
    #[arg(long, global = true)]
    watch: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tools over HTTP instead of stdio
    Http {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; in stdio mode stdout belongs to the MCP transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let loaded = config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let registry = ToolRegistry::build(&loaded.tools).context("Failed to compile tools")?;
    tracing::info!(
        tools = registry.len(),
        config = %cli.config.display(),
        "Loaded tool config"
    );

    let handle = RegistryHandle::new(registry);

    let _watcher = if cli.watch {
        Some(watcher::spawn(cli.config.clone(), handle.clone())?)
    } else {
        None
    };

    match cli.command {
        Some(Commands::Http { bind }) => {
            HttpServer::new(handle, cli.name, bind).serve().await?;
        }
        None => {
            let service = ToolServer::new(handle, cli.name)
                .serve(stdio())
                .await
                .context("Failed to start MCP server")?;
            service.waiting().await?;
        }
    }

    Ok(())
}
