#![forbid(unsafe_code)]
//! PeerChain node: serves the HTTP API and joins the configured peers

use clap::Parser;
use peerchain::config::Config;
use peerchain::error::ChainError;
use peerchain::node::Node;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address peers use to reach this node, e.g. http://127.0.0.1:5000
    #[arg(long)]
    node_address: Option<String>,
    /// Socket address to listen on (defaults to 0.0.0.0:$PORT when PORT is set)
    #[arg(long)]
    listen: Option<String>,
    /// Seed peer address; may be repeated
    #[arg(long = "peer")]
    peers: Vec<String>,
}

fn build_config(cli: Cli) -> Result<Config, ChainError> {
    let mut config = match (&cli.config, &cli.node_address) {
        (Some(path), _) => Config::load(path)?,
        (None, Some(address)) => Config::new(address.clone()),
        (None, None) => {
            return Err(ChainError::ConfigError(
                "either --config or --node-address is required".to_string(),
            ))
        }
    };

    if let Some(address) = cli.node_address {
        config.node_address = address;
    }
    if let Some(listen) = cli.listen {
        config.listen = listen;
    } else if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port
            .parse()
            .map_err(|e| ChainError::ConfigError(format!("invalid PORT `{}`: {}", port, e)))?;
        config.listen = format!("0.0.0.0:{}", port);
    }
    config.seed_peers.extend(cli.peers);

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = build_config(Cli::parse())?;
    let node = Arc::new(Node::new(config)?);
    node.start().await?;
    Ok(())
}
