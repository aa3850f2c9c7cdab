//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies are abstracted behind traits; this crate provides
//! test-friendly implementations that never touch the filesystem and can
//! be inspected and steered programmatically.
//!
//! Usage: swap the LMDB backend for [`NullStore`] in tests.

pub mod store;

pub use store::NullStore;
