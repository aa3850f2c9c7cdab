//! State transition for oracle votes and plain transfers.
//!
//! Applying a transaction happens inside a [`StateBatch`]: gas is bought up
//! front, the action executes behind a checkpoint, unused gas is returned,
//! and the fee is settled by the refund coordinator. Nothing reaches the
//! store until the batch is committed, and a failed action reverts to its
//! checkpoint, so a rejected vote never leaves a vote flag behind.
//!
//! ## Module overview
//!
//! - [`batch`] — Journaled overlay over a [`tally_store::StateStore`].
//! - [`transaction`] — Transactions and their actions.
//! - [`gas`] — Intrinsic gas and the execution gas meter.
//! - [`block`] — Per-block environment (number, base fee, proposer).
//! - [`receipt`] — Per-transaction outcome.
//! - [`transition`] — The state transition itself.
//! - [`error`] — Reasons a transaction is invalid.

pub mod batch;
pub mod block;
pub mod error;
pub mod gas;
pub mod receipt;
pub mod transaction;
pub mod transition;

pub use batch::{Checkpoint, StateBatch};
pub use block::BlockEnv;
pub use error::StateError;
pub use gas::{intrinsic_gas, GasMeter, OutOfGas};
pub use receipt::{Receipt, ReceiptStatus};
pub use transaction::{Transaction, TxAction};
pub use transition::StateTransition;
