//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for the Tally protocol.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid protocol parameters: {0}")]
    InvalidParams(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}
