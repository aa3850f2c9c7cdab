//! The Tally node: stores, committee, round clock and block production.
//!
//! `TallyNode` owns one [`BlockProcessor`] and a [`Mempool`]. Transactions
//! enter through [`TallyNode::submit`]; [`TallyNode::produce_block`] drains
//! the mempool into the next block. [`TallyNode::run`] produces blocks on a
//! fixed interval until shutdown.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tally_nullables::NullStore;
use tally_oracle::{AdmissionEngine, ClockEvent, RoundReader, RoundView, VoterSet};
use tally_state::{StateTransition, Transaction};
use tally_store::{AccountStore, StateStore, VoteStore};
use tally_store_lmdb::LmdbEnvironment;
use tally_types::{Address, Round, TxHash, Wei};
use tally_utils::format_duration;

use crate::block_processor::{Block, BlockOutcome, BlockProcessor};
use crate::config::{NodeConfig, StorageBackend};
use crate::genesis::{apply_genesis, load_head};
use crate::mempool::Mempool;
use crate::metrics::NodeMetrics;
use crate::node_event::NodeEvent;
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// Failed blocks in a row after which [`TallyNode::run`] gives up.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

pub struct TallyNode {
    config: NodeConfig,
    chain_id: u64,
    store: Arc<dyn StateStore>,
    voters: Arc<VoterSet>,
    admission: Arc<AdmissionEngine>,
    processor: Mutex<BlockProcessor>,
    mempool: Mutex<Mempool>,
    reader: RoundReader,
    metrics: Arc<NodeMetrics>,
}

impl TallyNode {
    /// Open the configured store and build the node on top of it.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let store: Arc<dyn StateStore> = match config.storage {
            StorageBackend::Memory => Arc::new(NullStore::new()),
            StorageBackend::Lmdb => Arc::new(LmdbEnvironment::open(
                &config.data_dir,
                config.map_size_bytes(),
            )?),
        };
        Self::with_store(config, store)
    }

    /// Build a node over an existing store, applying genesis if the store
    /// has never seen it.
    pub fn with_store(config: NodeConfig, store: Arc<dyn StateStore>) -> Result<Self, NodeError> {
        config.validate()?;
        let head = match load_head(store.as_ref())? {
            Some(head) => {
                tracing::info!(
                    last_block = head.last_block,
                    round = head.view.round.as_u64(),
                    "resuming from persisted head"
                );
                head
            }
            None => apply_genesis(store.as_ref(), &config.genesis)?,
        };

        let voters = Arc::new(VoterSet::from_genesis(config.genesis.voters.iter().copied()));
        let admission = Arc::new(AdmissionEngine::new(voters.clone()));
        let transition = StateTransition::new(config.oracle.clone(), Arc::clone(&admission));
        let metrics = Arc::new(NodeMetrics::new());
        let chain_id = config.network.chain_id();
        let processor =
            BlockProcessor::new(Arc::clone(&store), transition, chain_id, head, Arc::clone(&metrics))?;
        let reader = processor.round_reader();
        let mempool = Mempool::new(config.mempool_capacity, config.mempool_per_sender);

        tracing::info!(
            network = ?config.network,
            chain_id,
            storage = ?config.storage,
            voters = voters.len(),
            "node initialised"
        );
        Ok(Self {
            config,
            chain_id,
            store,
            voters,
            admission,
            processor: Mutex::new(processor),
            mempool: Mutex::new(mempool),
            reader,
            metrics,
        })
    }

    // ── Transactions and blocks ─────────────────────────────────────────

    /// Queue a transaction for the next block.
    pub fn submit(&self, tx: Transaction) -> Result<TxHash, NodeError> {
        if tx.chain_id != self.chain_id {
            return Err(NodeError::InvalidTransaction(format!(
                "chain id {} does not match {}",
                tx.chain_id, self.chain_id
            )));
        }
        let mut mempool = self.mempool();
        let hash = mempool.insert(tx)?;
        self.metrics.mempool_size.set(mempool.len() as i64);
        tracing::debug!(tx = %hash, pending = mempool.len(), "transaction queued");
        Ok(hash)
    }

    /// Drain the mempool into the next block and commit it.
    ///
    /// If the block cannot be committed its transactions are lost; senders
    /// resubmit.
    pub fn produce_block(&self) -> Result<BlockOutcome, NodeError> {
        let mut processor = self.processor();
        let transactions = {
            let mut mempool = self.mempool();
            let txs = mempool.drain(self.config.max_block_txs);
            self.metrics.mempool_size.set(mempool.len() as i64);
            txs
        };
        let block = Block {
            number: processor.last_block() + 1,
            base_fee_per_gas: self.config.base_fee(),
            proposer: self.config.proposer,
            transactions,
        };
        processor.process_block(&block)
    }

    /// Apply an externally built block.
    pub fn import_block(&self, block: &Block) -> Result<BlockOutcome, NodeError> {
        self.processor().process_block(block)
    }

    /// Start the next round immediately.
    pub fn advance_round(&self) -> Result<ClockEvent, NodeError> {
        self.processor().advance_round()
    }

    /// Produce a block every `block_interval_ms` until `shutdown` fires.
    ///
    /// A block that fails to commit is logged and skipped; storage errors
    /// that persist stop the loop.
    pub async fn run(&self, shutdown: &ShutdownController) -> Result<(), NodeError> {
        let mut shutdown_rx = shutdown.subscribe();
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.block_interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately
        interval.tick().await;

        let started = Instant::now();
        let mut consecutive_failures = 0u32;
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!(
                        last_block = self.last_block(),
                        uptime = %format_duration(started.elapsed()),
                        "block production stopped"
                    );
                    return Ok(());
                }
                _ = interval.tick() => {
                    match self.produce_block() {
                        Ok(_) => consecutive_failures = 0,
                        Err(e) => {
                            consecutive_failures += 1;
                            tracing::error!(error = %e, consecutive_failures, "block production failed");
                            if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                                return Err(e);
                            }
                        }
                    }
                }
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn balance(&self, address: &Address) -> Result<Wei, NodeError> {
        Ok(self.store.balance(address)?)
    }

    pub fn nonce(&self, address: &Address) -> Result<u64, NodeError> {
        Ok(self
            .store
            .get_account(address)?
            .map(|info| info.nonce)
            .unwrap_or(0))
    }

    pub fn current_round(&self) -> Round {
        self.reader.current_round()
    }

    pub fn current_view(&self) -> RoundView {
        self.reader.view()
    }

    pub fn round_reader(&self) -> RoundReader {
        self.reader.clone()
    }

    /// Whether `voter` has an admitted vote in `round`. Read-only.
    pub fn has_voted(&self, round: Round, voter: &Address) -> Result<bool, NodeError> {
        Ok(self.store.has_vote(round, voter)?)
    }

    pub fn last_block(&self) -> u64 {
        self.processor().last_block()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool().len()
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    /// Admission counters by outcome.
    pub fn admission_stats(&self) -> std::collections::BTreeMap<&'static str, u64> {
        self.admission.stats().snapshot()
    }

    // ── Committee ───────────────────────────────────────────────────────

    /// Add a voter to the committee; it may vote from the next round.
    pub fn register_voter(&self, voter: Address) {
        let current = self.current_round();
        self.voters.register_next_round(voter, current);
        tracing::info!(%voter, from_round = current.next().as_u64(), "voter registered");
    }

    pub fn remove_voter(&self, voter: &Address) -> bool {
        let removed = self.voters.remove(voter);
        if removed {
            tracing::info!(%voter, "voter removed");
        }
        removed
    }

    pub fn subscribe(&self, listener: Box<dyn Fn(&NodeEvent) + Send + Sync>) {
        self.processor().subscribe(listener);
    }

    fn processor(&self) -> MutexGuard<'_, BlockProcessor> {
        self.processor.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn mempool(&self) -> MutexGuard<'_, Mempool> {
        self.mempool.lock().unwrap_or_else(|e| e.into_inner())
    }
}
