//! Write batching — groups store operations into a single LMDB write
//! transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.insert_vote(&record)?;
//! batch.put_account(&sender)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use tally_store::{AccountInfo, StoreError, VoteRecord};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let txn = env.env().write_txn()?;
        Ok(Self { txn, env })
    }

    // ── Account operations ──────────────────────────────────────────────

    pub fn put_account(&mut self, info: &AccountInfo) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info).map_err(LmdbError::from)?;
        self.env
            .accounts_db
            .put(&mut self.txn, info.address.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Vote operations ─────────────────────────────────────────────────

    /// Insert a vote record. Fails with [`StoreError::Duplicate`] if the
    /// (round, voter) key is already present, including earlier in this batch.
    pub fn insert_vote(&mut self, record: &VoteRecord) -> Result<(), StoreError> {
        let key = record.key();
        if self
            .env
            .votes_db
            .get(&self.txn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "{} in {}",
                record.voter, record.round
            )));
        }
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .votes_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Meta operations ─────────────────────────────────────────────────

    pub fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
