//! Oracle vote admission.
//!
//! Registered oracle voters submit one vote per round. This crate decides
//! whether a submitted vote is admitted:
//! - The round clock owns the current round and epoch, with a single writer
//!   (the block finalization path) and any number of readers.
//! - The vote ledger records, per (round, voter), that a vote was admitted.
//! - The admission engine checks eligibility and the ledger and returns an
//!   accept/reject verdict.
//!
//! ## Module overview
//!
//! - [`round_clock`] — Round/epoch counters advanced on block finalization.
//! - [`vote_ledger`] — Per-round vote flags over a [`tally_store::VoteStore`].
//! - [`eligibility`] — Committee membership as seen by the oracle.
//! - [`vote`] — The vote call payload.
//! - [`admission`] — The admission engine and its verdicts.
//! - [`error`] — Oracle error types.

pub mod admission;
pub mod eligibility;
pub mod error;
pub mod round_clock;
pub mod vote;
pub mod vote_ledger;

pub use admission::{AdmissionEngine, AdmissionVerdict, RejectReason, VoteOutcome};
pub use eligibility::{VoterEligibility, VoterSet};
pub use error::OracleError;
pub use round_clock::{ClockEvent, RoundAdvancer, RoundClock, RoundReader, RoundSchedule, RoundView};
pub use vote::VoteCall;
pub use vote_ledger::VoteLedger;
