//! Transactions accepted by the state transition.

use serde::{Deserialize, Serialize};
use tally_oracle::VoteCall;
use tally_types::{Address, TxHash, Wei};

use crate::error::StateError;

/// What a transaction does once its gas is bought.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxAction {
    /// Plain value transfer.
    Transfer { to: Address, value: Wei },
    /// A call to the oracle's vote entry point.
    Vote(VoteCall),
}

/// A dynamic-fee transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub chain_id: u64,
    pub from: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: Wei,
    pub max_priority_fee_per_gas: Wei,
    pub action: TxAction,
}

impl Transaction {
    /// A vote with no gas or fee caps set; see [`Transaction::with_gas`].
    pub fn vote(chain_id: u64, from: Address, nonce: u64, call: VoteCall) -> Self {
        Self {
            chain_id,
            from,
            nonce,
            gas_limit: 0,
            max_fee_per_gas: Wei::ZERO,
            max_priority_fee_per_gas: Wei::ZERO,
            action: TxAction::Vote(call),
        }
    }

    pub fn transfer(chain_id: u64, from: Address, nonce: u64, to: Address, value: Wei) -> Self {
        Self {
            action: TxAction::Transfer { to, value },
            ..Self::vote(chain_id, from, nonce, VoteCall::empty())
        }
    }

    pub fn with_gas(mut self, gas_limit: u64, max_fee: Wei, max_priority_fee: Wei) -> Self {
        self.gas_limit = gas_limit;
        self.max_fee_per_gas = max_fee;
        self.max_priority_fee_per_gas = max_priority_fee;
        self
    }

    /// Value moved by the transaction. Votes carry none.
    pub fn value(&self) -> Wei {
        match &self.action {
            TxAction::Transfer { value, .. } => *value,
            TxAction::Vote(_) => Wei::ZERO,
        }
    }

    pub fn is_vote(&self) -> bool {
        matches!(self.action, TxAction::Vote(_))
    }

    /// Input data the intrinsic gas is charged on.
    pub fn calldata(&self) -> Result<Vec<u8>, StateError> {
        bincode::serialize(&self.action).map_err(|e| StateError::Encoding(e.to_string()))
    }

    pub fn hash(&self) -> Result<TxHash, StateError> {
        let bytes = bincode::serialize(self).map_err(|e| StateError::Encoding(e.to_string()))?;
        Ok(TxHash::digest(&bytes))
    }
}
