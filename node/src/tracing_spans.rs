//! Span constructors for common node operations, so traces share names and
//! field sets.

use tracing::{debug_span, info_span, Span};

/// Span covering the processing of one block.
pub fn block_span(number: u64, txs: usize) -> Span {
    info_span!("block", number, txs)
}

/// Span covering the application of a single transaction.
pub fn tx_span(index: usize) -> Span {
    debug_span!("tx", index)
}
