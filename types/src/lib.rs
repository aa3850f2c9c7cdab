//! Fundamental types for the Tally oracle vote protocol.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, amounts, rounds and epochs, hashes, protocol parameters, and the
//! shared error type.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod network;
pub mod params;
pub mod round;

pub use address::Address;
pub use amount::Wei;
pub use error::TallyError;
pub use hash::TxHash;
pub use network::NetworkId;
pub use params::OracleParams;
pub use round::{Epoch, Round};
