//! Tally node — drives the oracle vote protocol block by block.
//!
//! The node is the coordinator that:
//! - Queues submitted transactions in a bounded mempool
//! - Applies each block's transactions through the state transition
//! - Commits state and the chain head atomically, then finalizes the block
//!   on the round clock
//! - Prunes vote records of superseded rounds
//! - Publishes events and Prometheus metrics
//!
//! ## Module overview
//!
//! - [`node`] — `TallyNode`: store selection, genesis, block production loop.
//! - [`block_processor`] — Applies and commits one block.
//! - [`genesis`] — Chain head persistence and genesis initialisation.
//! - [`mempool`] — Pending transactions.
//! - [`node_event`] — Event bus for observers.
//! - [`config`] — TOML configuration.
//! - [`logging`], [`tracing_spans`], [`metrics`] — Observability.
//! - [`shutdown`] — Signal-driven shutdown.

pub mod block_processor;
pub mod config;
pub mod error;
pub mod genesis;
pub mod logging;
pub mod mempool;
pub mod metrics;
pub mod node;
pub mod node_event;
pub mod shutdown;
pub mod tracing_spans;

pub use block_processor::{Block, BlockOutcome, BlockProcessor, DroppedTx};
pub use config::{GenesisAccount, GenesisConfig, NodeConfig, StorageBackend};
pub use error::NodeError;
pub use genesis::{apply_genesis, load_head, ChainHead};
pub use logging::{init_logging, LogFormat};
pub use mempool::Mempool;
pub use metrics::NodeMetrics;
pub use node::TallyNode;
pub use node_event::{EventBus, NodeEvent};
pub use shutdown::ShutdownController;
