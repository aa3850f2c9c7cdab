use tally_store::StoreError;
use tally_types::{Address, Round};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{voter} is not an eligible voter in {round}")]
    Ineligible { voter: Address, round: Round },

    #[error("{voter} already voted in {round}")]
    AlreadyVoted { voter: Address, round: Round },

    #[error("vote targets {got} but the current round is {expected}")]
    RoundMismatch { expected: Round, got: Round },

    #[error("invalid round schedule: {0}")]
    InvalidSchedule(String),

    #[error("vote payload encoding failed: {0}")]
    Payload(String),

    #[error("round clock has been dropped")]
    ClockClosed,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl OracleError {
    /// Short reason recorded in a failed transaction's receipt.
    pub fn revert_reason(&self) -> &'static str {
        match self {
            Self::Ineligible { .. } => "not an eligible voter",
            Self::AlreadyVoted { .. } => "already voted",
            Self::RoundMismatch { .. } => "round mismatch",
            Self::InvalidSchedule(_) => "invalid schedule",
            Self::Payload(_) => "malformed vote",
            Self::ClockClosed => "round clock closed",
            Self::Store(_) => "storage failure",
        }
    }
}
