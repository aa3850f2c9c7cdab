//! LMDB storage backend for the Tally oracle node.
//!
//! Implements the storage traits from `tally-store` using the `heed` LMDB
//! bindings. Accounts, vote records and metadata each live in their own
//! database inside a single environment, so a whole [`tally_store::ChangeSet`]
//! is applied in one write transaction.

pub mod account;
pub mod environment;
pub mod error;
pub mod meta;
pub mod migration;
pub mod state;
pub mod vote;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
