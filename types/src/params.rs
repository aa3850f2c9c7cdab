//! Oracle protocol parameters.
//!
//! Every field is set at genesis and read by the round clock, the vote
//! ledger and the state transition. Gas costs are charged per execution
//! step of a vote call.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TallyError;

/// Parameters of the oracle vote protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleParams {
    // ── Rounds ───────────────────────────────────────────────────────────
    /// Length of an oracle round in blocks.
    pub vote_period: u64,

    /// Length of a committee epoch in blocks.
    pub epoch_period: u64,

    /// How many superseded rounds of vote records to keep before pruning.
    /// `0` prunes every round older than the current one.
    pub vote_history_rounds: u64,

    // ── Addresses ────────────────────────────────────────────────────────
    /// Address votes must be sent to.
    pub oracle_address: Address,

    /// Treasury that receives base fees of non-refunded transactions.
    pub treasury_address: Address,

    // ── Gas schedule ─────────────────────────────────────────────────────
    /// Base cost of any transaction.
    pub tx_base_gas: u64,

    /// Calldata cost per zero byte.
    pub calldata_zero_byte_gas: u64,

    /// Calldata cost per non-zero byte.
    pub calldata_nonzero_byte_gas: u64,

    /// Reading the voter's committee membership.
    pub eligibility_read_gas: u64,

    /// Reading the (round, voter) vote flag.
    pub ledger_read_gas: u64,

    /// Writing the (round, voter) vote flag.
    pub ledger_write_gas: u64,

    /// Storing one price report of an admitted vote.
    pub report_gas: u64,
}

impl OracleParams {
    /// Defaults for a local development network: short rounds and epochs.
    pub fn dev_defaults() -> Self {
        Self {
            vote_period: 10,
            epoch_period: 120,
            vote_history_rounds: 0,
            oracle_address: Address::repeat(0x47),
            treasury_address: Address::repeat(0xbd),
            tx_base_gas: 21_000,
            calldata_zero_byte_gas: 4,
            calldata_nonzero_byte_gas: 16,
            eligibility_read_gas: 2_100,
            ledger_read_gas: 2_100,
            ledger_write_gas: 22_100,
            report_gas: 5_000,
        }
    }

    /// Check the invariants the round clock and fee code rely on.
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.vote_period == 0 {
            return Err(TallyError::InvalidParams("vote_period must be > 0".into()));
        }
        if self.epoch_period == 0 {
            return Err(TallyError::InvalidParams("epoch_period must be > 0".into()));
        }
        if self.epoch_period < self.vote_period {
            return Err(TallyError::InvalidParams(format!(
                "epoch_period {} shorter than vote_period {}",
                self.epoch_period, self.vote_period
            )));
        }
        if self.oracle_address == self.treasury_address {
            return Err(TallyError::InvalidParams(
                "oracle and treasury addresses must differ".into(),
            ));
        }
        Ok(())
    }
}

impl Default for OracleParams {
    fn default() -> Self {
        Self::dev_defaults()
    }
}
