//! Abstract storage traits for the Tally protocol.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod account;
pub mod changes;
pub mod error;
pub mod meta;
pub mod vote;

pub use account::{AccountInfo, AccountStore};
pub use changes::{ChangeSet, StateStore};
pub use error::StoreError;
pub use meta::MetaStore;
pub use vote::{vote_key, VoteRecord, VoteStore, VOTE_KEY_LEN};
