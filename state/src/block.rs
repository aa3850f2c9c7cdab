use serde::{Deserialize, Serialize};
use tally_types::{Address, Wei};

/// Block-level context every transaction in the block executes against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEnv {
    pub chain_id: u64,
    pub number: u64,
    pub base_fee_per_gas: Wei,
    /// Receives the tip of non-refunded transactions.
    pub proposer: Address,
}
