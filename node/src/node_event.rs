//! Events emitted during block processing for subscribers.

use tally_types::{Address, Epoch, Round, TxHash};

/// Node-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// A block was committed.
    BlockCommitted {
        number: u64,
        included: usize,
        dropped: usize,
    },
    /// A vote was admitted and its fee refunded.
    VoteAdmitted {
        voter: Address,
        round: Round,
        tx_hash: TxHash,
    },
    /// A vote was included but failed.
    VoteFailed {
        voter: Address,
        round: Round,
        tx_hash: TxHash,
        reason: String,
    },
    /// A transaction was dropped before execution.
    TxDropped { tx_hash: TxHash, reason: String },
    RoundAdvanced { from: Round, to: Round, at_block: u64 },
    EpochAdvanced { from: Epoch, to: Epoch, at_block: u64 },
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast to
/// avoid stalling block processing.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&NodeEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&NodeEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &NodeEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
