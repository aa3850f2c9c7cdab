//! Vote admission engine.
//!
//! Given a vote from `voter` and the round view taken for the enclosing
//! transaction, decide whether the vote is the voter's first in the round.
//!
//! Order of checks:
//! 1. A vote pinned to another round fails with `RoundMismatch`.
//! 2. A voter outside the committee fails with `Ineligible`.
//! 3. A voter with a flag already set is rejected (`already voted`).
//! 4. Otherwise the flag is set and the vote is accepted.
//!
//! A verdict is provisional until the enclosing transaction and block are
//! committed, so the outcome counters are fed from [`VoteOutcome`]s via
//! [`AdmissionEngine::record`] rather than from `admit`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tally_types::{Address, TxHash};
use tally_utils::StatsCounter;

use crate::eligibility::VoterEligibility;
use crate::error::OracleError;
use crate::round_clock::RoundView;
use crate::vote::VoteCall;
use crate::vote_ledger::VoteLedger;

/// Why a vote was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyVoted,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyVoted => "already voted",
        }
    }
}

/// Outcome of admitting an eligible, well-formed vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionVerdict {
    Accept,
    Reject(RejectReason),
}

impl AdmissionVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Final result of a vote transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    Accepted,
    Rejected,
    Ineligible,
    RoundMismatch,
    /// Ran out of gas; any admission was rolled back.
    OutOfGas,
}

impl VoteOutcome {
    /// Classify an admission result. Storage and payload errors have no
    /// vote outcome.
    pub fn from_admission(outcome: &Result<AdmissionVerdict, OracleError>) -> Option<Self> {
        match outcome {
            Ok(AdmissionVerdict::Accept) => Some(Self::Accepted),
            Ok(AdmissionVerdict::Reject(RejectReason::AlreadyVoted)) => Some(Self::Rejected),
            Err(OracleError::Ineligible { .. }) => Some(Self::Ineligible),
            Err(OracleError::RoundMismatch { .. }) => Some(Self::RoundMismatch),
            Err(_) => None,
        }
    }

    pub fn stat_name(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Ineligible => "ineligible",
            Self::RoundMismatch => "round_mismatch",
            Self::OutOfGas => "out_of_gas",
        }
    }
}

const STAT_NAMES: &[&str] = &["accepted", "rejected", "ineligible", "round_mismatch", "out_of_gas"];

pub struct AdmissionEngine {
    eligibility: Arc<dyn VoterEligibility>,
    stats: StatsCounter,
}

impl AdmissionEngine {
    pub fn new(eligibility: Arc<dyn VoterEligibility>) -> Self {
        Self {
            eligibility,
            stats: StatsCounter::new(STAT_NAMES),
        }
    }

    /// Admit or reject one vote.
    ///
    /// `view` must be the single round view taken for the enclosing
    /// transaction. On `Accept` the ledger flag is already set; callers that
    /// later abort the transaction must discard the ledger writes with it.
    pub fn admit(
        &self,
        ledger: &VoteLedger<'_>,
        view: &RoundView,
        voter: &Address,
        call: &VoteCall,
        tx_hash: TxHash,
    ) -> Result<AdmissionVerdict, OracleError> {
        let round = view.round;

        if let Some(pinned) = call.round {
            if pinned != round {
                tracing::debug!(%voter, expected = round.as_u64(), got = pinned.as_u64(), "vote for wrong round");
                return Err(OracleError::RoundMismatch {
                    expected: round,
                    got: pinned,
                });
            }
        }

        if !self.eligibility.is_eligible(round, voter) {
            tracing::debug!(%voter, round = round.as_u64(), "vote from ineligible sender");
            return Err(OracleError::Ineligible {
                voter: *voter,
                round,
            });
        }

        if ledger.has_voted(round, voter)? {
            return Ok(self.reject(voter, view));
        }

        match ledger.mark_voted(round, voter, tx_hash, call.encode_payload()?) {
            Ok(_) => {
                tracing::debug!(%voter, round = round.as_u64(), %tx_hash, "vote admitted");
                Ok(AdmissionVerdict::Accept)
            }
            // lost a race with a concurrent writer of the same key
            Err(OracleError::AlreadyVoted { .. }) => Ok(self.reject(voter, view)),
            Err(e) => Err(e),
        }
    }

    fn reject(&self, voter: &Address, view: &RoundView) -> AdmissionVerdict {
        tracing::debug!(%voter, round = view.round.as_u64(), "duplicate vote rejected");
        AdmissionVerdict::Reject(RejectReason::AlreadyVoted)
    }

    /// Count a vote whose transaction has been committed.
    pub fn record(&self, outcome: VoteOutcome) {
        self.stats.increment(outcome.stat_name());
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::VoterSet;
    use tally_nullables::NullStore;
    use tally_types::Round;

    fn view(round: u64) -> RoundView {
        RoundView {
            round: Round::new(round),
            ..RoundView::genesis()
        }
    }

    fn engine_with(voters: &[Address]) -> AdmissionEngine {
        AdmissionEngine::new(Arc::new(VoterSet::from_genesis(voters.iter().copied())))
    }

    #[test]
    fn first_vote_accepted_second_rejected() {
        let v = Address::repeat(1);
        let engine = engine_with(&[v]);
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        let call = VoteCall::empty();

        let first = engine.admit(&ledger, &view(2), &v, &call, TxHash::ZERO).unwrap();
        assert_eq!(first, AdmissionVerdict::Accept);

        let second = engine.admit(&ledger, &view(2), &v, &call, TxHash::ZERO).unwrap();
        assert_eq!(second, AdmissionVerdict::Reject(RejectReason::AlreadyVoted));
        assert_eq!(RejectReason::AlreadyVoted.as_str(), "already voted");

        // nothing is counted until the outcome is committed
        assert_eq!(engine.stats().get("accepted"), 0);
        assert_eq!(engine.stats().get("rejected"), 0);
    }

    #[test]
    fn recorded_outcomes_are_counted() {
        let engine = engine_with(&[]);
        engine.record(VoteOutcome::Accepted);
        engine.record(VoteOutcome::Rejected);
        engine.record(VoteOutcome::OutOfGas);
        assert_eq!(engine.stats().get("accepted"), 1);
        assert_eq!(engine.stats().get("rejected"), 1);
        assert_eq!(engine.stats().get("out_of_gas"), 1);
        assert_eq!(engine.stats().get("ineligible"), 0);
    }

    #[test]
    fn outcome_classifies_admission_results() {
        let v = Address::repeat(1);
        assert_eq!(
            VoteOutcome::from_admission(&Ok(AdmissionVerdict::Accept)),
            Some(VoteOutcome::Accepted)
        );
        assert_eq!(
            VoteOutcome::from_admission(&Ok(AdmissionVerdict::Reject(RejectReason::AlreadyVoted))),
            Some(VoteOutcome::Rejected)
        );
        assert_eq!(
            VoteOutcome::from_admission(&Err(OracleError::Ineligible {
                voter: v,
                round: Round::new(0),
            })),
            Some(VoteOutcome::Ineligible)
        );
        assert_eq!(VoteOutcome::from_admission(&Err(OracleError::ClockClosed)), None);
    }

    #[test]
    fn new_round_accepts_again() {
        let v = Address::repeat(1);
        let engine = engine_with(&[v]);
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        let call = VoteCall::empty();

        assert!(engine.admit(&ledger, &view(2), &v, &call, TxHash::ZERO).unwrap().is_accept());
        assert!(engine.admit(&ledger, &view(3), &v, &call, TxHash::ZERO).unwrap().is_accept());
    }

    #[test]
    fn ineligible_voter_is_an_error_not_a_reject() {
        let engine = engine_with(&[]);
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        let v = Address::repeat(9);
        let err = engine
            .admit(&ledger, &view(0), &v, &VoteCall::empty(), TxHash::ZERO)
            .unwrap_err();
        assert!(matches!(err, OracleError::Ineligible { .. }));
        assert!(!ledger.has_voted(Round::new(0), &v).unwrap());
    }

    #[test]
    fn pinned_round_must_match_view() {
        let v = Address::repeat(1);
        let engine = engine_with(&[v]);
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        let call = VoteCall::empty().for_round(Round::new(1));

        let err = engine.admit(&ledger, &view(2), &v, &call, TxHash::ZERO).unwrap_err();
        assert!(matches!(
            err,
            OracleError::RoundMismatch { expected, got } if expected == Round::new(2) && got == Round::new(1)
        ));
        assert!(!ledger.has_voted(Round::new(2), &v).unwrap());
        assert!(!ledger.has_voted(Round::new(1), &v).unwrap());

        let ok = VoteCall::empty().for_round(Round::new(2));
        assert!(engine.admit(&ledger, &view(2), &v, &ok, TxHash::ZERO).unwrap().is_accept());
    }

    #[test]
    fn payload_content_does_not_affect_admission() {
        let v = Address::repeat(1);
        let engine = engine_with(&[v]);
        let store = NullStore::new();
        let ledger = VoteLedger::new(&store);
        let full = VoteCall {
            round: None,
            commit: [7; 32],
            reports: vec![100, 200],
            salt: 42,
        };
        assert!(engine.admit(&ledger, &view(1), &v, &full, TxHash::ZERO).unwrap().is_accept());
        let verdict = engine
            .admit(&ledger, &view(1), &v, &VoteCall::empty(), TxHash::ZERO)
            .unwrap();
        assert!(!verdict.is_accept());
    }
}
