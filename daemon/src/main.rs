//! Tally daemon — entry point for running a Tally oracle node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tally_node::{init_logging, LogFormat, NodeConfig, ShutdownController, StorageBackend, TallyNode};
use tally_types::NetworkId;

#[derive(Parser)]
#[command(name = "tally-daemon", about = "Tally oracle node daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Network to join: "live", "test", or "dev".
    #[arg(long, env = "TALLY_NETWORK")]
    network: Option<String>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Keep all state in memory; nothing is written to disk.
    #[arg(long, env = "TALLY_IN_MEMORY")]
    in_memory: bool,

    /// Milliseconds between produced blocks.
    #[arg(long, env = "TALLY_BLOCK_INTERVAL_MS")]
    block_interval_ms: Option<u64>,

    /// Base fee of produced blocks, in gwei.
    #[arg(long, env = "TALLY_BASE_FEE_GWEI")]
    base_fee_gwei: Option<u64>,

    /// Dump Prometheus metrics to the log on shutdown.
    #[arg(long, env = "TALLY_ENABLE_METRICS")]
    metrics: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Inspect configuration.
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node.
    Run,
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the default configuration as TOML.
    Default,
    /// Load and validate the configuration, then print the effective result.
    Check,
}

impl Cli {
    /// File settings (or defaults) with CLI flags and env vars applied on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => NodeConfig::default(),
        };
        if let Some(network) = &self.network {
            config.network = NetworkId::parse_lossy(network);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if self.in_memory {
            config.storage = StorageBackend::Memory;
        }
        if let Some(ms) = self.block_interval_ms {
            config.block_interval_ms = ms;
        }
        if let Some(gwei) = self.base_fee_gwei {
            config.base_fee_gwei = gwei;
        }
        config.enable_metrics |= self.metrics;
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Config { action } => {
            tally_utils::init_tracing("warn");
            let config = match action {
                ConfigAction::Default => NodeConfig::default(),
                ConfigAction::Check => cli.node_config()?,
            };
            print!("{}", config.to_toml_string()?);
        }
        Command::Node {
            action: NodeAction::Run,
        } => {
            let config = cli.node_config()?;
            let format: LogFormat = config.log_format.parse()?;
            init_logging(format, &config.log_level)?;
            run_node(config).await?;
        }
    }

    Ok(())
}

async fn run_node(config: NodeConfig) -> anyhow::Result<()> {
    tracing::info!(
        network = config.network.as_str(),
        storage = ?config.storage,
        data_dir = %config.data_dir.display(),
        block_interval_ms = config.block_interval_ms,
        base_fee_gwei = config.base_fee_gwei,
        "starting Tally node"
    );
    let enable_metrics = config.enable_metrics;
    let node = TallyNode::new(config).context("starting node")?;

    let shutdown = Arc::new(ShutdownController::new());
    let signals = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if let Err(e) = signals.wait_for_signal().await {
            tracing::error!(error = %e, "signal handler failed; shutting down");
            signals.shutdown();
        }
    });

    node.run(&shutdown).await?;
    tracing::info!("node stopped");

    if enable_metrics {
        tracing::info!(metrics = %node.metrics().encode()?, "final metrics");
    }
    tracing::info!("Tally daemon exited cleanly");
    Ok(())
}
