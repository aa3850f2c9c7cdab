//! The environment as a whole [`StateStore`].
//!
//! Single-record reads and writes delegate to the per-database stores;
//! [`StateStore::apply_changes`] goes through one [`WriteBatch`](crate::WriteBatch).

use tally_store::{
    AccountInfo, AccountStore, ChangeSet, MetaStore, StateStore, StoreError, VoteRecord, VoteStore,
};
use tally_types::{Address, Round};

use crate::environment::LmdbEnvironment;

impl AccountStore for LmdbEnvironment {
    fn get_account(&self, address: &Address) -> Result<Option<AccountInfo>, StoreError> {
        self.account_store().get_account(address)
    }

    fn put_account(&self, info: &AccountInfo) -> Result<(), StoreError> {
        self.account_store().put_account(info)
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        self.account_store().account_count()
    }
}

impl VoteStore for LmdbEnvironment {
    fn has_vote(&self, round: Round, voter: &Address) -> Result<bool, StoreError> {
        self.vote_store().has_vote(round, voter)
    }

    fn get_vote(&self, round: Round, voter: &Address) -> Result<Option<VoteRecord>, StoreError> {
        self.vote_store().get_vote(round, voter)
    }

    fn insert_vote(&self, record: &VoteRecord) -> Result<(), StoreError> {
        self.vote_store().insert_vote(record)
    }

    fn votes_in_round(&self, round: Round) -> Result<Vec<VoteRecord>, StoreError> {
        self.vote_store().votes_in_round(round)
    }

    fn prune_before(&self, round: Round) -> Result<u64, StoreError> {
        self.vote_store().prune_before(round)
    }
}

impl MetaStore for LmdbEnvironment {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta_store().put_meta(key, value)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.meta_store().get_meta(key)
    }
}

impl StateStore for LmdbEnvironment {
    fn apply_changes(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        for record in &changes.votes {
            batch.insert_vote(record)?;
        }
        for account in &changes.accounts {
            batch.put_account(account)?;
        }
        for (key, value) in &changes.meta {
            batch.put_meta(key, value)?;
        }
        batch.commit()?;
        tracing::trace!(
            accounts = changes.accounts.len(),
            votes = changes.votes.len(),
            "change set committed"
        );
        Ok(())
    }
}
