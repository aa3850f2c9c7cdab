use tally_fees::FeeError;
use tally_store::StoreError;
use tally_types::{Address, Wei};
use thiserror::Error;

/// Why a transaction could not be applied at all.
///
/// These are pre-execution failures: the transaction is left out of the
/// block and no state changes. Failures during execution (a rejected vote,
/// running out of gas) are not errors; they produce a failed [`Receipt`].
///
/// [`Receipt`]: crate::Receipt
#[derive(Debug, Error)]
pub enum StateError {
    #[error("nonce mismatch for {address}: expected {expected}, got {got}")]
    NonceMismatch { address: Address, expected: u64, got: u64 },

    #[error("insufficient funds for {address}: need {needed}, have {available}")]
    InsufficientFunds {
        address: Address,
        needed: Wei,
        available: Wei,
    },

    #[error("gas limit {limit} below intrinsic gas {required}")]
    IntrinsicGas { limit: u64, required: u64 },

    #[error("transaction for chain {got} submitted to chain {expected}")]
    WrongChain { expected: u64, got: u64 },

    #[error("fee error: {0}")]
    Fee(#[from] FeeError),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl StateError {
    /// Whether the error concerns the node rather than the transaction.
    /// A fatal error aborts the whole block.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
