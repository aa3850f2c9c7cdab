//! Vote storage trait.
//!
//! Layout: one entry per (round, voter), keyed by `round (u64 BE) || voter`
//! so that a round's records are contiguous and older rounds sort first.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{Address, Round, TxHash};

/// Length of a vote key: 8 bytes of round followed by the 20-byte voter.
pub const VOTE_KEY_LEN: usize = 8 + Address::LEN;

/// Storage key of the vote flag for `(round, voter)`.
pub fn vote_key(round: Round, voter: &Address) -> [u8; VOTE_KEY_LEN] {
    let mut key = [0u8; VOTE_KEY_LEN];
    key[..8].copy_from_slice(&round.to_be_bytes());
    key[8..].copy_from_slice(voter.as_bytes());
    key
}

/// An admitted vote. Its presence is the "already voted this round" flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub round: Round,
    pub voter: Address,
    /// Transaction that cast the vote.
    pub tx_hash: TxHash,
    /// Encoded vote payload (commitment, reports, salt).
    pub payload: Vec<u8>,
}

impl VoteRecord {
    pub fn key(&self) -> [u8; VOTE_KEY_LEN] {
        vote_key(self.round, &self.voter)
    }
}

/// Trait for the per-round vote flags.
pub trait VoteStore {
    fn has_vote(&self, round: Round, voter: &Address) -> Result<bool, StoreError>;

    fn get_vote(&self, round: Round, voter: &Address) -> Result<Option<VoteRecord>, StoreError>;

    /// Insert a record, failing with [`StoreError::Duplicate`] if one already
    /// exists for the same key. The existence check and the write happen
    /// under one lock or one write transaction.
    fn insert_vote(&self, record: &VoteRecord) -> Result<(), StoreError>;

    /// All records of one round, ordered by voter.
    fn votes_in_round(&self, round: Round) -> Result<Vec<VoteRecord>, StoreError>;

    /// Delete every record of rounds strictly before `round`. Returns the
    /// number of records removed.
    fn prune_before(&self, round: Round) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_orders_by_round_then_voter() {
        let a = vote_key(Round::new(1), &Address::repeat(9));
        let b = vote_key(Round::new(2), &Address::repeat(1));
        let c = vote_key(Round::new(2), &Address::repeat(2));
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn record_key_matches_free_function() {
        let record = VoteRecord {
            round: Round::new(4),
            voter: Address::repeat(3),
            tx_hash: TxHash::ZERO,
            payload: Vec::new(),
        };
        assert_eq!(record.key(), vote_key(Round::new(4), &Address::repeat(3)));
    }
}
