//! Vote ledger — per-round, per-voter "already voted" flags.
//!
//! The ledger is the only writer of [`VoteRecord`]s. Marking is a single
//! check-and-insert on the underlying store, so two attempts for the same
//! (round, voter) can never both succeed. Records of superseded rounds are
//! pruned by the node after the round advances; they are never consulted
//! for admission because votes only ever target the current round.

use tally_store::{StoreError, VoteRecord, VoteStore};
use tally_types::{Address, Round, TxHash};

use crate::error::OracleError;

pub struct VoteLedger<'a> {
    store: &'a dyn VoteStore,
}

impl<'a> VoteLedger<'a> {
    pub fn new(store: &'a dyn VoteStore) -> Self {
        Self { store }
    }

    /// Whether `voter` already has an admitted vote in `round`. Read-only.
    pub fn has_voted(&self, round: Round, voter: &Address) -> Result<bool, OracleError> {
        Ok(self.store.has_vote(round, voter)?)
    }

    /// Record an admitted vote.
    ///
    /// Fails with [`OracleError::AlreadyVoted`] if the flag is already set.
    pub fn mark_voted(
        &self,
        round: Round,
        voter: &Address,
        tx_hash: TxHash,
        payload: Vec<u8>,
    ) -> Result<VoteRecord, OracleError> {
        let record = VoteRecord {
            round,
            voter: *voter,
            tx_hash,
            payload,
        };
        match self.store.insert_vote(&record) {
            Ok(()) => Ok(record),
            Err(StoreError::Duplicate(_)) => Err(OracleError::AlreadyVoted {
                voter: *voter,
                round,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// The admitted vote of `voter` in `round`, if any.
    pub fn record(&self, round: Round, voter: &Address) -> Result<Option<VoteRecord>, OracleError> {
        Ok(self.store.get_vote(round, voter)?)
    }

    /// Every admitted vote of `round`.
    pub fn round_votes(&self, round: Round) -> Result<Vec<VoteRecord>, OracleError> {
        Ok(self.store.votes_in_round(round)?)
    }

    /// First round whose records survive pruning at `current`.
    pub fn prune_cutoff(current: Round, keep: u64) -> Round {
        Round::new(current.as_u64().saturating_sub(keep))
    }

    /// Drop records of rounds older than `current − keep`.
    pub fn prune(&self, current: Round, keep: u64) -> Result<u64, OracleError> {
        let cutoff = Self::prune_cutoff(current, keep);
        let removed = self.store.prune_before(cutoff)?;
        if removed > 0 {
            tracing::debug!(removed, cutoff = cutoff.as_u64(), "pruned superseded vote records");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_nullables::NullStore;

    fn voter(b: u8) -> Address {
        Address::repeat(b)
    }

    #[test]
    fn mark_then_has_voted() {
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        let r = Round::new(1);
        assert!(!ledger.has_voted(r, &voter(1)).unwrap());
        ledger.mark_voted(r, &voter(1), TxHash::ZERO, vec![]).unwrap();
        assert!(ledger.has_voted(r, &voter(1)).unwrap());
        assert!(!ledger.has_voted(r, &voter(2)).unwrap());
    }

    #[test]
    fn second_mark_fails_with_already_voted() {
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        let r = Round::new(3);
        ledger.mark_voted(r, &voter(1), TxHash::ZERO, vec![1]).unwrap();
        let err = ledger
            .mark_voted(r, &voter(1), TxHash::new([1; 32]), vec![2])
            .unwrap_err();
        assert!(matches!(err, OracleError::AlreadyVoted { .. }));
        // first record is untouched
        let rec = ledger.record(r, &voter(1)).unwrap().unwrap();
        assert_eq!(rec.payload, vec![1]);
        assert_eq!(rec.tx_hash, TxHash::ZERO);
    }

    #[test]
    fn flags_are_round_scoped() {
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        ledger.mark_voted(Round::new(1), &voter(1), TxHash::ZERO, vec![]).unwrap();
        assert!(!ledger.has_voted(Round::new(2), &voter(1)).unwrap());
        ledger.mark_voted(Round::new(2), &voter(1), TxHash::ZERO, vec![]).unwrap();
    }

    #[test]
    fn prune_keeps_recent_rounds() {
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        for r in 0..5 {
            ledger.mark_voted(Round::new(r), &voter(1), TxHash::ZERO, vec![]).unwrap();
        }
        assert_eq!(ledger.prune(Round::new(4), 1).unwrap(), 3);
        assert!(!ledger.has_voted(Round::new(2), &voter(1)).unwrap());
        assert!(ledger.has_voted(Round::new(3), &voter(1)).unwrap());
        assert!(ledger.has_voted(Round::new(4), &voter(1)).unwrap());
    }

    #[test]
    fn queries_do_not_mutate() {
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        for _ in 0..3 {
            assert!(!ledger.has_voted(Round::new(1), &voter(1)).unwrap());
        }
        assert!(ledger.round_votes(Round::new(1)).unwrap().is_empty());
    }
}
