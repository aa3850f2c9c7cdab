//! Nullable store — thread-safe in-memory state for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use tally_store::{
    vote_key, AccountInfo, AccountStore, ChangeSet, MetaStore, StateStore, StoreError, VoteRecord,
    VoteStore, VOTE_KEY_LEN,
};
use tally_types::{Address, Round, Wei};

#[derive(Default)]
struct Inner {
    accounts: HashMap<Address, AccountInfo>,
    votes: BTreeMap<[u8; VOTE_KEY_LEN], VoteRecord>,
    meta: HashMap<String, Vec<u8>>,
    /// Number of successful `apply_changes` calls.
    commits: u64,
    /// When set, the next `apply_changes` fails without writing anything.
    fail_next_commit: bool,
}

/// An in-memory [`StateStore`].
///
/// All maps sit behind one mutex, so a change set is applied atomically with
/// respect to every reader.
pub struct NullStore {
    inner: Mutex<Inner>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a store with pre-funded accounts.
    pub fn with_balances(balances: impl IntoIterator<Item = (Address, Wei)>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for (address, balance) in balances {
                inner.accounts.insert(
                    address,
                    AccountInfo {
                        address,
                        balance,
                        nonce: 0,
                    },
                );
            }
        }
        store
    }

    /// Make the next `apply_changes` fail with a backend error.
    pub fn fail_next_commit(&self) {
        self.lock().fail_next_commit = true;
    }

    /// Number of change sets applied so far.
    pub fn commit_count(&self) -> u64 {
        self.lock().commits
    }

    pub fn vote_count(&self) -> usize {
        self.lock().votes.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for NullStore {
    fn get_account(&self, address: &Address) -> Result<Option<AccountInfo>, StoreError> {
        Ok(self.lock().accounts.get(address).cloned())
    }

    fn put_account(&self, info: &AccountInfo) -> Result<(), StoreError> {
        self.lock().accounts.insert(info.address, info.clone());
        Ok(())
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock().accounts.len() as u64)
    }
}

impl VoteStore for NullStore {
    fn has_vote(&self, round: Round, voter: &Address) -> Result<bool, StoreError> {
        Ok(self.lock().votes.contains_key(&vote_key(round, voter)))
    }

    fn get_vote(&self, round: Round, voter: &Address) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self.lock().votes.get(&vote_key(round, voter)).cloned())
    }

    fn insert_vote(&self, record: &VoteRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let key = record.key();
        if inner.votes.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "{} in {}",
                record.voter, record.round
            )));
        }
        inner.votes.insert(key, record.clone());
        Ok(())
    }

    fn votes_in_round(&self, round: Round) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self
            .lock()
            .votes
            .values()
            .filter(|r| r.round == round)
            .cloned()
            .collect())
    }

    fn prune_before(&self, round: Round) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let before = inner.votes.len();
        inner.votes.retain(|_, r| r.round >= round);
        Ok((before - inner.votes.len()) as u64)
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.lock().meta.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().meta.get(key).cloned())
    }
}

impl StateStore for NullStore {
    fn apply_changes(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_next_commit {
            inner.fail_next_commit = false;
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        for record in &changes.votes {
            if inner.votes.contains_key(&record.key()) {
                return Err(StoreError::Duplicate(format!(
                    "{} in {}",
                    record.voter, record.round
                )));
            }
        }
        for record in &changes.votes {
            inner.votes.insert(record.key(), record.clone());
        }
        for account in &changes.accounts {
            inner.accounts.insert(account.address, account.clone());
        }
        for (key, value) in &changes.meta {
            inner.meta.insert(key.clone(), value.clone());
        }
        inner.commits += 1;
        Ok(())
    }
}
