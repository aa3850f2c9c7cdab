//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tally_types::amount::TOKEN_UNIT;
use tally_types::{Address, NetworkId, OracleParams, Wei};

use crate::NodeError;

/// Where the node keeps its state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory only; state is lost on exit.
    Memory,
    /// LMDB environment under `data_dir`.
    Lmdb,
}

/// A pre-funded account created at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    /// Whole tokens; TOML integers cannot hold wei amounts.
    pub balance_tokens: u64,
}

impl GenesisAccount {
    pub fn balance(&self) -> Wei {
        Wei::new(u128::from(self.balance_tokens) * TOKEN_UNIT)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    /// Committee members eligible from round 0.
    #[serde(default)]
    pub voters: Vec<Address>,
}

/// Configuration for a Tally node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub enable_metrics: bool,

    /// Interval between produced blocks.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,

    /// Base fee of every produced block, in gwei.
    #[serde(default = "default_base_fee_gwei")]
    pub base_fee_gwei: u64,

    /// Address credited with tips of non-refunded transactions.
    #[serde(default = "default_proposer")]
    pub proposer: Address,

    #[serde(default = "default_mempool_capacity")]
    pub mempool_capacity: usize,

    /// Pending transactions allowed per sender.
    #[serde(default = "default_mempool_per_sender")]
    pub mempool_per_sender: usize,

    /// Upper bound on transactions per block.
    #[serde(default = "default_max_block_txs")]
    pub max_block_txs: usize,

    #[serde(default)]
    pub genesis: GenesisConfig,

    #[serde(default)]
    pub oracle: OracleParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tally_data")
}

fn default_storage() -> StorageBackend {
    StorageBackend::Lmdb
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_block_interval_ms() -> u64 {
    1_000
}

fn default_base_fee_gwei() -> u64 {
    10
}

fn default_proposer() -> Address {
    Address::repeat(0x0b)
}

fn default_mempool_capacity() -> usize {
    10_000
}

fn default_mempool_per_sender() -> usize {
    64
}

fn default_max_block_txs() -> usize {
    1_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// In-memory configuration for tests and local experiments.
    pub fn ephemeral() -> Self {
        Self {
            storage: StorageBackend::Memory,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        self.oracle
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))?;
        if self.block_interval_ms == 0 {
            return Err(NodeError::Config("block_interval_ms must be > 0".into()));
        }
        if self.max_block_txs == 0 {
            return Err(NodeError::Config("max_block_txs must be > 0".into()));
        }
        if self.mempool_per_sender == 0 || self.mempool_per_sender > self.mempool_capacity {
            return Err(NodeError::Config(
                "mempool_per_sender must be in 1..=mempool_capacity".into(),
            ));
        }
        Ok(())
    }

    pub fn base_fee(&self) -> Wei {
        Wei::from_gwei(self.base_fee_gwei)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            storage: default_storage(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            block_interval_ms: default_block_interval_ms(),
            base_fee_gwei: default_base_fee_gwei(),
            proposer: default_proposer(),
            mempool_capacity: default_mempool_capacity(),
            mempool_per_sender: default_mempool_per_sender(),
            max_block_txs: default_max_block_txs(),
            genesis: GenesisConfig::default(),
            oracle: OracleParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().expect("serialize");
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.block_interval_ms, config.block_interval_ms);
        assert_eq!(parsed.proposer, config.proposer);
        assert_eq!(parsed.oracle, config.oracle);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.network, NetworkId::Dev);
        assert_eq!(config.storage, StorageBackend::Lmdb);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.oracle.vote_period, 10);
    }

    #[test]
    fn genesis_and_oracle_sections() {
        let toml = r#"
            storage = "memory"
            base_fee_gwei = 25

            [oracle]
            vote_period = 5

            [genesis]
            voters = ["0x1111111111111111111111111111111111111111"]

            [[genesis.accounts]]
            address = "0x1111111111111111111111111111111111111111"
            balance_tokens = 100
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.base_fee(), Wei::from_gwei(25));
        assert_eq!(config.oracle.vote_period, 5);
        assert_eq!(config.oracle.epoch_period, 120);
        assert_eq!(config.genesis.voters, vec![Address::repeat(0x11)]);
        assert_eq!(
            config.genesis.accounts[0].balance(),
            Wei::new(100 * TOKEN_UNIT)
        );
    }

    #[test]
    fn invalid_oracle_params_rejected() {
        let err = NodeConfig::from_toml_str("[oracle]\nvote_period = 0\n").unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file(Path::new("/nonexistent/tally.toml"));
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
