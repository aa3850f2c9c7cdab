//! Oracle voter eligibility.
//!
//! Committee selection and bonding happen elsewhere; the oracle only needs
//! to know whether an address may vote in a given round. A voter that joins
//! the committee becomes eligible from the round after it was registered,
//! so that it never votes in a round it only saw the tail of.

use std::collections::HashMap;
use std::sync::RwLock;

use tally_types::{Address, Round};

/// Answers "may `voter` vote in `round`?".
pub trait VoterEligibility: Send + Sync {
    fn is_eligible(&self, round: Round, voter: &Address) -> bool;
}

/// In-memory committee view: voter → first round it may vote in.
#[derive(Default)]
pub struct VoterSet {
    voters: RwLock<HashMap<Address, Round>>,
}

impl VoterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set where every voter is eligible from genesis.
    pub fn from_genesis(voters: impl IntoIterator<Item = Address>) -> Self {
        let set = Self::new();
        for voter in voters {
            set.register(voter, Round::GENESIS);
        }
        set
    }

    /// Make `voter` eligible from `from_round` onwards.
    pub fn register(&self, voter: Address, from_round: Round) {
        self.voters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(voter, from_round);
    }

    /// Register a voter that joined during `current`; it may vote from the
    /// next round.
    pub fn register_next_round(&self, voter: Address, current: Round) {
        self.register(voter, current.next());
    }

    /// Remove a voter. Returns whether it was present.
    pub fn remove(&self, voter: &Address) -> bool {
        self.voters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(voter)
            .is_some()
    }

    /// First round `voter` may vote in, if registered.
    pub fn eligible_from(&self, voter: &Address) -> Option<Round> {
        self.voters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(voter)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.voters.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VoterEligibility for VoterSet {
    fn is_eligible(&self, round: Round, voter: &Address) -> bool {
        self.eligible_from(voter).is_some_and(|from| round >= from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_voter_is_ineligible() {
        let set = VoterSet::new();
        assert!(!set.is_eligible(Round::new(0), &Address::repeat(1)));
    }

    #[test]
    fn genesis_voters_eligible_immediately() {
        let set = VoterSet::from_genesis([Address::repeat(1), Address::repeat(2)]);
        assert_eq!(set.len(), 2);
        assert!(set.is_eligible(Round::GENESIS, &Address::repeat(2)));
    }

    #[test]
    fn new_voter_waits_one_round() {
        let set = VoterSet::new();
        let voter = Address::repeat(8);
        set.register_next_round(voter, Round::new(4));
        assert!(!set.is_eligible(Round::new(4), &voter));
        assert!(set.is_eligible(Round::new(5), &voter));
        assert!(set.is_eligible(Round::new(9), &voter));
    }

    #[test]
    fn removed_voter_loses_eligibility() {
        let set = VoterSet::from_genesis([Address::repeat(3)]);
        assert!(set.remove(&Address::repeat(3)));
        assert!(!set.remove(&Address::repeat(3)));
        assert!(!set.is_eligible(Round::new(1), &Address::repeat(3)));
        assert!(set.is_empty());
    }
}
