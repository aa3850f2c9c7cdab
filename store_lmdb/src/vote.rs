//! LMDB implementation of VoteStore.
//!
//! Key: `round (8 bytes BE) ++ voter (20 bytes)`. Big-endian rounds keep
//! records ordered by round, so a round is a prefix scan and pruning is a
//! single range delete.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tally_store::{vote_key, StoreError, VoteRecord, VoteStore};
use tally_types::{Address, Round};

use crate::LmdbError;

pub struct LmdbVoteStore {
    pub(crate) env: Arc<Env>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
}

impl VoteStore for LmdbVoteStore {
    fn has_vote(&self, round: Round, voter: &Address) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .votes_db
            .get(&rtxn, &vote_key(round, voter))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn get_vote(&self, round: Round, voter: &Address) -> Result<Option<VoteRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .votes_db
            .get(&rtxn, &vote_key(round, voter))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let record: VoteRecord = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn insert_vote(&self, record: &VoteRecord) -> Result<(), StoreError> {
        let key = record.key();
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .votes_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "{} in {}",
                record.voter, record.round
            )));
        }
        self.votes_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn votes_in_round(&self, round: Round) -> Result<Vec<VoteRecord>, StoreError> {
        let prefix = round.to_be_bytes();
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .votes_db
            .prefix_iter(&rtxn, &prefix[..])
            .map_err(LmdbError::from)?;
        let mut records = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let record: VoteRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            records.push(record);
        }
        Ok(records)
    }

    fn prune_before(&self, round: Round) -> Result<u64, StoreError> {
        let cutoff = round.to_be_bytes();
        let bounds = (Bound::Unbounded, Bound::Excluded(&cutoff[..]));
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let removed = self
            .votes_db
            .delete_range(&mut wtxn, &bounds)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(removed as u64)
    }
}
