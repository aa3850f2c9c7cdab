//! The vote call submitted to the oracle.

use serde::{Deserialize, Serialize};
use tally_types::Round;

use crate::error::OracleError;

/// Arguments of an oracle vote.
///
/// The round is normally implied by chain state; a caller may pin it, in
/// which case a vote landing in a different round is refused instead of
/// being counted in the wrong round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCall {
    pub round: Option<Round>,
    /// Commitment to the reports of the next round.
    pub commit: [u8; 32],
    /// Reveal of the reports committed to in the previous round.
    pub reports: Vec<u128>,
    /// Salt used for the previous commitment.
    pub salt: u64,
}

impl VoteCall {
    /// A vote with no content: zero commitment, no reports, zero salt.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pin the vote to `round`.
    pub fn for_round(mut self, round: Round) -> Self {
        self.round = Some(round);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commit == [0u8; 32] && self.reports.is_empty() && self.salt == 0
    }

    /// Encoding stored alongside the vote flag.
    pub fn encode_payload(&self) -> Result<Vec<u8>, OracleError> {
        bincode::serialize(&(&self.commit, &self.reports, self.salt))
            .map_err(|e| OracleError::Payload(e.to_string()))
    }
}
