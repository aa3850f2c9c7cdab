//! Prometheus metrics for the Tally node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`NodeMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks committed by the block processor.
    pub blocks_processed: IntCounter,
    /// Transactions included in a block, successful or failed.
    pub txs_included: IntCounter,
    /// Transactions dropped as invalid before execution.
    pub txs_invalid: IntCounter,
    pub votes_accepted: IntCounter,
    /// Votes that failed: duplicate, ineligible, wrong round, out of gas.
    pub votes_rejected: IntCounter,
    /// Transactions whose fee was refunded in full.
    pub fees_refunded: IntCounter,
    /// Superseded vote records removed by pruning.
    pub votes_pruned: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub current_round: IntGauge,
    pub current_epoch: IntGauge,
    pub last_block: IntGauge,
    pub mempool_size: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent processing one block, in milliseconds.
    pub block_process_time_ms: Histogram,
}

impl NodeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let blocks_processed = register_int_counter_with_registry!(
            Opts::new("tally_blocks_processed_total", "Blocks committed by this node"),
            registry
        )
        .expect("failed to register blocks_processed counter");

        let txs_included = register_int_counter_with_registry!(
            Opts::new("tally_txs_included_total", "Transactions included in blocks"),
            registry
        )
        .expect("failed to register txs_included counter");

        let txs_invalid = register_int_counter_with_registry!(
            Opts::new("tally_txs_invalid_total", "Transactions dropped as invalid"),
            registry
        )
        .expect("failed to register txs_invalid counter");

        let votes_accepted = register_int_counter_with_registry!(
            Opts::new("tally_votes_accepted_total", "Oracle votes admitted"),
            registry
        )
        .expect("failed to register votes_accepted counter");

        let votes_rejected = register_int_counter_with_registry!(
            Opts::new("tally_votes_rejected_total", "Oracle votes that failed"),
            registry
        )
        .expect("failed to register votes_rejected counter");

        let fees_refunded = register_int_counter_with_registry!(
            Opts::new("tally_fees_refunded_total", "Transactions refunded in full"),
            registry
        )
        .expect("failed to register fees_refunded counter");

        let votes_pruned = register_int_counter_with_registry!(
            Opts::new("tally_votes_pruned_total", "Superseded vote records pruned"),
            registry
        )
        .expect("failed to register votes_pruned counter");

        let current_round = register_int_gauge_with_registry!(
            Opts::new("tally_current_round", "Current oracle round"),
            registry
        )
        .expect("failed to register current_round gauge");

        let current_epoch = register_int_gauge_with_registry!(
            Opts::new("tally_current_epoch", "Current committee epoch"),
            registry
        )
        .expect("failed to register current_epoch gauge");

        let last_block = register_int_gauge_with_registry!(
            Opts::new("tally_last_block", "Number of the last committed block"),
            registry
        )
        .expect("failed to register last_block gauge");

        let mempool_size = register_int_gauge_with_registry!(
            Opts::new("tally_mempool_size", "Transactions waiting for inclusion"),
            registry
        )
        .expect("failed to register mempool_size gauge");

        // 0.1 ms → ~1.6 s
        let block_process_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "tally_block_process_time_ms",
                "Block processing time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15).expect("valid buckets")),
            registry
        )
        .expect("failed to register block_process_time_ms histogram");

        Self {
            registry,
            blocks_processed,
            txs_included,
            txs_invalid,
            votes_accepted,
            votes_rejected,
            fees_refunded,
            votes_pruned,
            current_round,
            current_epoch,
            last_block,
            mempool_size,
            block_process_time_ms,
        }
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Encoding(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
