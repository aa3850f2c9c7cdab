//! Account storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{Address, Wei};

/// Per-account state touched by the state transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    pub balance: Wei,
    /// Number of transactions sent from this account.
    pub nonce: u64,
}

impl AccountInfo {
    /// A never-seen account: zero balance, zero nonce.
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            balance: Wei::ZERO,
            nonce: 0,
        }
    }
}

/// Trait for account storage operations.
pub trait AccountStore {
    fn get_account(&self, address: &Address) -> Result<Option<AccountInfo>, StoreError>;
    fn put_account(&self, info: &AccountInfo) -> Result<(), StoreError>;
    fn account_count(&self) -> Result<u64, StoreError>;

    /// Balance of an account, zero if it does not exist.
    fn balance(&self, address: &Address) -> Result<Wei, StoreError> {
        Ok(self
            .get_account(address)?
            .map(|a| a.balance)
            .unwrap_or(Wei::ZERO))
    }
}
