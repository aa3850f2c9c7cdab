//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which Tally network a node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Live,
    /// The public test network.
    Test,
    /// Local development network.
    Dev,
}

impl NetworkId {
    /// Chain identifier mixed into transaction hashes.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Live => 65_000_000,
            Self::Test => 65_010_003,
            Self::Dev => 65_111_111,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
            Self::Dev => "dev",
        }
    }

    /// Parse a network name, falling back to `Dev` for anything unknown.
    pub fn parse_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "live" => Self::Live,
            "test" => Self::Test,
            _ => Self::Dev,
        }
    }
}
