//! torctl: command-line client for the Tor control port
//!
//! Authenticates, then sends one signal or runs one GETINFO query per invocation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpStream;
use torctl::config::ControllerConfig;
use torctl::{ControlError, Controller, Signal};
use tracing::error;

#[derive(Parser)]
#[command(name = "torctl")]
#[command(about = "Control a running Tor daemon over its control port")]
#[command(version)]
struct Cli {
    /// Control port address (defaults to TOR_CONTROL_ADDR or 127.0.0.1:9051)
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Control port password (defaults to TOR_CONTROL_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Config file (defaults to ~/.config/torctl/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a signal (e.g. NEWNYM, RELOAD, new-circuit)
    Signal {
        /// Signal keyword or name
        name: Signal,
    },

    /// Query a single GETINFO key
    Info {
        /// Info key, e.g. version or traffic/read
        key: String,
    },

    /// Print the daemon version
    Version,

    /// Print the address the daemon believes it has
    Address,

    /// Print bytes read and written
    Traffic,

    /// Query every known key and print this client's exchange metrics
    Metrics {
        /// Print in Prometheus text format instead of JSON
        #[arg(long)]
        prometheus: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("torctl=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let controller = Controller::connect(&config.address)
        .await
        .map_err(|e| anyhow::anyhow!("Could not connect to {}: {}", config.address, e))?;

    if let Err(e) = controller.authenticate(config.password.as_deref()).await {
        error!("Authentication failed: {}", e);
        return Err(e.into());
    }

    match cli.command {
        Commands::Signal { name } => run_signal(&controller, name).await,
        Commands::Info { key } => run_info(&controller, &key).await,
        Commands::Version => {
            println!("{}", controller.get_version().await?);
            Ok(())
        }
        Commands::Address => {
            println!("{}", controller.get_address().await?);
            Ok(())
        }
        Commands::Traffic => run_traffic(&controller).await,
        Commands::Metrics { prometheus } => run_metrics(&controller, prometheus).await,
    }
}

/// Config file or environment, then command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => ControllerConfig::from_file(path)?,
        None => ControllerConfig::load()?,
    };

    if let Some(addr) = &cli.addr {
        config.address = addr.clone();
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }

    Ok(config)
}

async fn run_signal(controller: &Controller<TcpStream>, signal: Signal) -> anyhow::Result<()> {
    controller.signal(signal).await?;
    println!("Sent {}", signal);
    Ok(())
}

async fn run_info(controller: &Controller<TcpStream>, key: &str) -> anyhow::Result<()> {
    match controller.get_info(key).await {
        Ok(value) => {
            println!("{}", value);
            Ok(())
        }
        Err(ControlError::Protocol { code, message }) => {
            eprintln!("Error: daemon rejected {} ({}): {}", key, code, message);
            Err(anyhow::anyhow!("GETINFO {} failed", key))
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_traffic(controller: &Controller<TcpStream>) -> anyhow::Result<()> {
    let read = controller.get_bytes_read().await?;
    let written = controller.get_bytes_written().await?;

    println!("Bytes read:    {}", read);
    println!("Bytes written: {}", written);
    Ok(())
}

async fn run_metrics(
    controller: &Controller<TcpStream>,
    prometheus: bool,
) -> anyhow::Result<()> {
    for (key, value) in controller.get_known_info().await {
        match value {
            Ok(value) => println!("{} = {}", key, value),
            Err(e) => eprintln!("{} unavailable: {}", key, e),
        }
    }

    let snapshot = controller.metrics().snapshot();
    if prometheus {
        println!("{}", snapshot.to_prometheus());
    } else {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
