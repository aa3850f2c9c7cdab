//! Atomic change sets produced by block execution.

use crate::{AccountInfo, AccountStore, MetaStore, StoreError, VoteRecord, VoteStore};

/// Every write produced by executing one block.
///
/// Accounts are final values, not deltas. Votes are new records only; an
/// existing key in `votes` is a conflict. Meta entries overwrite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub accounts: Vec<AccountInfo>,
    pub votes: Vec<VoteRecord>,
    pub meta: Vec<(String, Vec<u8>)>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.votes.is_empty() && self.meta.is_empty()
    }
}

/// A complete state backend that can apply a [`ChangeSet`] atomically.
pub trait StateStore: AccountStore + VoteStore + MetaStore + Send + Sync {
    /// Apply all changes or none. A vote that already exists aborts the
    /// whole set with [`StoreError::Duplicate`].
    fn apply_changes(&self, changes: &ChangeSet) -> Result<(), StoreError>;
}
