//! State batch — a journaled overlay over a [`StateStore`].
//!
//! Reads fall through to the store; writes stay in the overlay. Every write
//! is journaled so execution can be rolled back to a [`Checkpoint`]. The
//! overlay reaches the store only through [`StateBatch::commit`], which
//! applies it as one [`ChangeSet`]. If the batch is dropped without
//! committing, everything is discarded.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use tally_store::{
    vote_key, AccountInfo, ChangeSet, StateStore, StoreError, VoteRecord, VoteStore, VOTE_KEY_LEN,
};
use tally_types::{Address, Round, Wei};

use crate::error::StateError;

enum JournalEntry {
    Account {
        address: Address,
        previous: Option<AccountInfo>,
    },
    Vote {
        key: [u8; VOTE_KEY_LEN],
    },
}

/// Journal position returned by [`StateBatch::checkpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Default)]
struct Overlay {
    accounts: HashMap<Address, AccountInfo>,
    votes: BTreeMap<[u8; VOTE_KEY_LEN], VoteRecord>,
    meta: BTreeMap<String, Vec<u8>>,
    journal: Vec<JournalEntry>,
}

pub struct StateBatch<'a> {
    store: &'a dyn StateStore,
    overlay: RefCell<Overlay>,
}

impl<'a> StateBatch<'a> {
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self {
            store,
            overlay: RefCell::new(Overlay::default()),
        }
    }

    // ── Accounts ────────────────────────────────────────────────────────

    /// Current view of an account; never-seen accounts are empty.
    pub fn account(&self, address: &Address) -> Result<AccountInfo, StoreError> {
        if let Some(info) = self.overlay.borrow().accounts.get(address) {
            return Ok(info.clone());
        }
        Ok(self
            .store
            .get_account(address)?
            .unwrap_or_else(|| AccountInfo::empty(*address)))
    }

    pub fn balance(&self, address: &Address) -> Result<Wei, StoreError> {
        Ok(self.account(address)?.balance)
    }

    fn put_account(&self, info: AccountInfo) {
        let mut overlay = self.overlay.borrow_mut();
        let previous = overlay.accounts.insert(info.address, info.clone());
        overlay.journal.push(JournalEntry::Account {
            address: info.address,
            previous,
        });
    }

    pub fn credit(&self, address: &Address, amount: Wei) -> Result<(), StateError> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut info = self.account(address)?;
        info.balance = info
            .balance
            .checked_add(amount)
            .ok_or(StateError::Overflow("balance credit"))?;
        self.put_account(info);
        Ok(())
    }

    pub fn debit(&self, address: &Address, amount: Wei) -> Result<(), StateError> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut info = self.account(address)?;
        info.balance = info
            .balance
            .checked_sub(amount)
            .ok_or(StateError::InsufficientFunds {
                address: *address,
                needed: amount,
                available: info.balance,
            })?;
        self.put_account(info);
        Ok(())
    }

    pub fn increment_nonce(&self, address: &Address) -> Result<(), StateError> {
        let mut info = self.account(address)?;
        info.nonce = info
            .nonce
            .checked_add(1)
            .ok_or(StateError::Overflow("nonce"))?;
        self.put_account(info);
        Ok(())
    }

    // ── Journal ─────────────────────────────────────────────────────────

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.overlay.borrow().journal.len())
    }

    /// Undo every write made after `checkpoint`.
    pub fn revert_to(&self, checkpoint: Checkpoint) {
        let mut overlay = self.overlay.borrow_mut();
        while overlay.journal.len() > checkpoint.0 {
            match overlay.journal.pop() {
                Some(JournalEntry::Account { address, previous }) => match previous {
                    Some(info) => {
                        overlay.accounts.insert(address, info);
                    }
                    None => {
                        overlay.accounts.remove(&address);
                    }
                },
                Some(JournalEntry::Vote { key }) => {
                    overlay.votes.remove(&key);
                }
                None => break,
            }
        }
    }

    // ── Meta ────────────────────────────────────────────────────────────

    /// Stage a metadata write. Block-level bookkeeping; not journaled.
    pub fn put_meta(&self, key: &str, value: Vec<u8>) {
        self.overlay.borrow_mut().meta.insert(key.to_string(), value);
    }

    // ── Commit ──────────────────────────────────────────────────────────

    /// The pending writes, in deterministic order.
    pub fn changes(&self) -> ChangeSet {
        let overlay = self.overlay.borrow();
        let mut accounts: Vec<AccountInfo> = overlay.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.address.cmp(&b.address));
        ChangeSet {
            accounts,
            votes: overlay.votes.values().cloned().collect(),
            meta: overlay
                .meta
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Write every pending change to the store in one atomic step.
    pub fn commit(self) -> Result<ChangeSet, StoreError> {
        let changes = self.changes();
        self.store.apply_changes(&changes)?;
        Ok(changes)
    }
}

impl VoteStore for StateBatch<'_> {
    fn has_vote(&self, round: Round, voter: &Address) -> Result<bool, StoreError> {
        if self
            .overlay
            .borrow()
            .votes
            .contains_key(&vote_key(round, voter))
        {
            return Ok(true);
        }
        self.store.has_vote(round, voter)
    }

    fn get_vote(&self, round: Round, voter: &Address) -> Result<Option<VoteRecord>, StoreError> {
        if let Some(record) = self.overlay.borrow().votes.get(&vote_key(round, voter)) {
            return Ok(Some(record.clone()));
        }
        self.store.get_vote(round, voter)
    }

    fn insert_vote(&self, record: &VoteRecord) -> Result<(), StoreError> {
        let key = record.key();
        if self.has_vote(record.round, &record.voter)? {
            return Err(StoreError::Duplicate(format!(
                "{} in {}",
                record.voter, record.round
            )));
        }
        let mut overlay = self.overlay.borrow_mut();
        overlay.votes.insert(key, record.clone());
        overlay.journal.push(JournalEntry::Vote { key });
        Ok(())
    }

    fn votes_in_round(&self, round: Round) -> Result<Vec<VoteRecord>, StoreError> {
        let mut records = self.store.votes_in_round(round)?;
        records.extend(
            self.overlay
                .borrow()
                .votes
                .values()
                .filter(|r| r.round == round)
                .cloned(),
        );
        records.sort_by(|a, b| a.voter.cmp(&b.voter));
        Ok(records)
    }

    fn prune_before(&self, _round: Round) -> Result<u64, StoreError> {
        Err(StoreError::Backend(
            "pruning is not available inside a state batch".into(),
        ))
    }
}
