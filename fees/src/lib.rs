//! Transaction fees and the oracle vote refund.
//!
//! A transaction pays `gas_used × (base fee + tip)`. Normally the base part
//! goes to the protocol treasury and the tip to the block proposer. A vote
//! admitted by the oracle is refunded in full instead: the sender gets the
//! whole amount back and neither treasury nor proposer receive anything.

pub mod breakdown;
pub mod error;
pub mod refund;

pub use breakdown::{effective_tip, FeeBreakdown};
pub use error::FeeError;
pub use refund::{FeeRefundCoordinator, FeeSettlement, RefundDecision};
