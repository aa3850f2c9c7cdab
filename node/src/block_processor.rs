//! Block processor.
//!
//! Applies the transactions of one block, in order, to a single
//! [`StateBatch`], then commits the batch together with the chain head in
//! one change set. Only after the commit succeeds is the round clock told
//! that the block is final, so a failed commit never moves the round.
//!
//! Invalid transactions (bad nonce, unaffordable, wrong chain) are dropped
//! and logged; they leave no trace in state. Failed votes are included with
//! a failed receipt and pay their fee.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tally_oracle::{ClockEvent, RoundAdvancer, RoundClock, RoundReader, RoundSchedule, RoundView, VoteLedger};
use tally_state::{BlockEnv, Receipt, StateBatch, StateTransition, Transaction};
use tally_store::{ChangeSet, StateStore};
use tally_types::{Address, Round, TxHash, Wei};

use crate::genesis::ChainHead;
use crate::metrics::NodeMetrics;
use crate::node_event::{EventBus, NodeEvent};
use crate::tracing_spans::{block_span, tx_span};
use crate::NodeError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub base_fee_per_gas: Wei,
    pub proposer: Address,
    pub transactions: Vec<Transaction>,
}

/// A transaction left out of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedTx {
    /// `None` if the transaction could not even be hashed.
    pub tx_hash: Option<TxHash>,
    pub from: Address,
    pub reason: String,
}

/// What a committed block did.
#[derive(Clone, Debug)]
pub struct BlockOutcome {
    pub number: u64,
    /// Round view after the block was finalized.
    pub view: RoundView,
    pub receipts: Vec<Receipt>,
    pub dropped: Vec<DroppedTx>,
    pub clock_events: Vec<ClockEvent>,
    /// Vote records removed by pruning after a round change.
    pub pruned: u64,
}

impl BlockOutcome {
    pub fn receipt(&self, tx_hash: &TxHash) -> Option<&Receipt> {
        self.receipts.iter().find(|r| &r.tx_hash == tx_hash)
    }
}

pub struct BlockProcessor {
    store: Arc<dyn StateStore>,
    transition: StateTransition,
    clock: RoundAdvancer,
    chain_id: u64,
    last_block: u64,
    events: EventBus,
    metrics: Arc<NodeMetrics>,
}

impl BlockProcessor {
    /// Resume processing from `head` (genesis or the persisted head).
    pub fn new(
        store: Arc<dyn StateStore>,
        transition: StateTransition,
        chain_id: u64,
        head: ChainHead,
        metrics: Arc<NodeMetrics>,
    ) -> Result<Self, NodeError> {
        let schedule = RoundSchedule::from_params(transition.params())?;
        let (clock, _) = RoundClock::new(schedule, head.view);
        metrics.last_block.set(head.last_block as i64);
        metrics.current_round.set(head.view.round.as_u64() as i64);
        metrics.current_epoch.set(head.view.epoch.as_u64() as i64);
        Ok(Self {
            store,
            transition,
            clock,
            chain_id,
            last_block: head.last_block,
            events: EventBus::new(),
            metrics,
        })
    }

    pub fn last_block(&self) -> u64 {
        self.last_block
    }

    pub fn view(&self) -> RoundView {
        self.clock.view()
    }

    pub fn round_reader(&self) -> RoundReader {
        self.clock.reader()
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&NodeEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    /// Apply and commit `block`, which must directly follow the last one.
    pub fn process_block(&mut self, block: &Block) -> Result<BlockOutcome, NodeError> {
        let expected = self.last_block + 1;
        if block.number != expected {
            return Err(NodeError::InvalidBlock(format!(
                "expected block {expected}, got {}",
                block.number
            )));
        }

        let span = block_span(block.number, block.transactions.len());
        let _enter = span.enter();
        let started = Instant::now();

        let env = BlockEnv {
            chain_id: self.chain_id,
            number: block.number,
            base_fee_per_gas: block.base_fee_per_gas,
            proposer: block.proposer,
        };
        // the clock only moves between blocks, so every tx sees this view
        let view = self.clock.view();

        let batch = StateBatch::new(self.store.as_ref());
        let mut receipts = Vec::with_capacity(block.transactions.len());
        let mut dropped = Vec::new();
        for (index, tx) in block.transactions.iter().enumerate() {
            let _tx = tx_span(index).entered();
            match self.transition.apply(&batch, &env, &view, tx) {
                Ok(receipt) => receipts.push(receipt),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(from = %tx.from, nonce = tx.nonce, error = %e, "transaction dropped");
                    dropped.push(DroppedTx {
                        tx_hash: tx.hash().ok(),
                        from: tx.from,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let (next_view, clock_events) = self.clock.schedule().advance(view, block.number);
        let head = ChainHead {
            last_block: block.number,
            view: next_view,
        };
        for (key, value) in head.meta_entries()? {
            batch.put_meta(&key, value);
        }
        batch.commit()?;

        self.last_block = block.number;
        self.clock.on_block_finalized(block.number);
        let pruned = self.prune_after(&clock_events);

        let outcome = BlockOutcome {
            number: block.number,
            view: next_view,
            receipts,
            dropped,
            clock_events,
            pruned,
        };
        self.record(&outcome, started);
        tracing::info!(
            included = outcome.receipts.len(),
            dropped = outcome.dropped.len(),
            round = next_view.round.as_u64(),
            "block committed"
        );
        Ok(outcome)
    }

    /// Start a new round now instead of at the next scheduled boundary.
    ///
    /// The new view is persisted before it is published.
    pub fn advance_round(&mut self) -> Result<ClockEvent, NodeError> {
        let current = self.clock.view();
        let head = ChainHead {
            last_block: self.last_block,
            view: RoundView {
                round: current.round.next(),
                round_start_block: self.last_block.max(current.round_start_block),
                ..current
            },
        };
        self.store.apply_changes(&ChangeSet {
            meta: head.meta_entries()?,
            ..ChangeSet::default()
        })?;

        let event = self.clock.advance_round(self.last_block);
        let pruned = self.prune_after(&[event]);
        self.metrics.current_round.set(head.view.round.as_u64() as i64);
        self.emit_clock_event(&event);
        if pruned > 0 {
            tracing::debug!(pruned, "vote records pruned after forced round change");
        }
        Ok(event)
    }

    /// Drop vote records of rounds no longer needed once the round moved.
    ///
    /// Runs after the commit; a failure only delays pruning to the next
    /// round change.
    fn prune_after(&self, events: &[ClockEvent]) -> u64 {
        let Some(to) = events.iter().find_map(|event| match event {
            ClockEvent::RoundAdvanced { to, .. } => Some(*to),
            ClockEvent::EpochAdvanced { .. } => None,
        }) else {
            return 0;
        };
        let cutoff: Round =
            VoteLedger::prune_cutoff(to, self.transition.params().vote_history_rounds);
        match self.store.prune_before(cutoff) {
            Ok(removed) => {
                self.metrics.votes_pruned.inc_by(removed);
                removed
            }
            Err(e) => {
                tracing::warn!(cutoff = cutoff.as_u64(), error = %e, "vote pruning failed");
                0
            }
        }
    }

    fn record(&self, outcome: &BlockOutcome, started: Instant) {
        let m = &self.metrics;
        m.blocks_processed.inc();
        m.txs_included.inc_by(outcome.receipts.len() as u64);
        m.txs_invalid.inc_by(outcome.dropped.len() as u64);
        m.last_block.set(outcome.number as i64);
        m.current_round.set(outcome.view.round.as_u64() as i64);
        m.current_epoch.set(outcome.view.epoch.as_u64() as i64);
        m.block_process_time_ms
            .observe(started.elapsed().as_secs_f64() * 1_000.0);

        for receipt in outcome.receipts.iter().filter(|r| r.is_vote) {
            if let Some(vote_outcome) = receipt.vote_outcome {
                self.transition.admission().record(vote_outcome);
            }
            if receipt.succeeded() {
                m.votes_accepted.inc();
                self.events.emit(&NodeEvent::VoteAdmitted {
                    voter: receipt.from,
                    round: receipt.round,
                    tx_hash: receipt.tx_hash,
                });
            } else {
                m.votes_rejected.inc();
                self.events.emit(&NodeEvent::VoteFailed {
                    voter: receipt.from,
                    round: receipt.round,
                    tx_hash: receipt.tx_hash,
                    reason: receipt.revert_reason.clone().unwrap_or_default(),
                });
            }
            if receipt.settlement.is_refund() {
                m.fees_refunded.inc();
            }
        }
        for tx in &outcome.dropped {
            if let Some(tx_hash) = tx.tx_hash {
                self.events.emit(&NodeEvent::TxDropped {
                    tx_hash,
                    reason: tx.reason.clone(),
                });
            }
        }
        for event in &outcome.clock_events {
            self.emit_clock_event(event);
        }
        self.events.emit(&NodeEvent::BlockCommitted {
            number: outcome.number,
            included: outcome.receipts.len(),
            dropped: outcome.dropped.len(),
        });
    }

    fn emit_clock_event(&self, event: &ClockEvent) {
        let event = match *event {
            ClockEvent::RoundAdvanced { from, to, at_block } => {
                NodeEvent::RoundAdvanced { from, to, at_block }
            }
            ClockEvent::EpochAdvanced { from, to, at_block } => {
                NodeEvent::EpochAdvanced { from, to, at_block }
            }
        };
        self.events.emit(&event);
    }
}
