mod auth;
mod config;
mod error;
mod handler;
mod protocol;
mod server;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{AuthKey, ServerConfig};
use server::RpcServer;

#[derive(Parser)]
#[command(name = "agent-rpc-server")]
#[command(about = "JSON-RPC server for the financial research agent")]
struct Cli {
    /// Server host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to bind to
    #[arg(long, default_value = "7878")]
    port: u16,

    /// Directory holding the persisted vector index
    #[arg(long, default_value = "vectorstore")]
    index_dir: PathBuf,

    /// Chat model id
    #[arg(long, default_value = "gpt-4-turbo")]
    model: String,

    /// Cap on model invocations per run
    #[arg(long, default_value = "10")]
    recursion_limit: u32,

    /// Accepted signing keys as <key-id>:<hex-secret> (repeatable)
    #[arg(long = "auth-key")]
    auth_keys: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_auth_key(raw: &str) -> Result<AuthKey> {
    let Some((id, secret_hex)) = raw.split_once(':') else {
        bail!("auth key must be <key-id>:<hex-secret>, got {:?}", raw);
    };
    let secret = hex::decode(secret_hex)
        .map_err(|_| anyhow::anyhow!("auth key secret for {:?} is not valid hex", id))?;
    Ok(AuthKey {
        id: id.to_string(),
        secret,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "agent_rpc_server={},stock_agent={},stock_data_services={}",
                cli.log_level, cli.log_level, cli.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let auth_keys = cli
        .auth_keys
        .iter()
        .map(|raw| parse_auth_key(raw))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Agent JSON-RPC Server Starting");
    tracing::info!("Configuration:");
    tracing::info!("  Host: {}", cli.host);
    tracing::info!("  Port: {}", cli.port);
    tracing::info!("  Index dir: {}", cli.index_dir.display());
    tracing::info!("  Model: {}", cli.model);
    tracing::info!("  Recursion limit: {}", cli.recursion_limit);
    tracing::info!("  Auth keys: {}", auth_keys.len());

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        index_dir: cli.index_dir,
        model: cli.model,
        recursion_limit: cli.recursion_limit,
        auth_keys,
    };

    let server = RpcServer::new(config).await?;
    server.run().await?;

    Ok(())
}
