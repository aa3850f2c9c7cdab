//! Integration tests exercising the full node pipeline:
//! submit → mempool → block → state transition → commit → round clock.
//!
//! These tests drive `TallyNode` the way the daemon does, over the
//! in-memory store and over LMDB.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tally_fees::RefundDecision;
use tally_node::{
    GenesisAccount, GenesisConfig, NodeConfig, NodeError, NodeEvent, ShutdownController,
    StorageBackend, TallyNode,
};
use tally_oracle::VoteCall;
use tally_state::{intrinsic_gas, ReceiptStatus, Transaction};
use tally_types::amount::TOKEN_UNIT;
use tally_types::{Address, Epoch, OracleParams, Round, Wei};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const VOTE_PERIOD: u64 = 5;

fn voter() -> Address {
    Address::repeat(0x11)
}

fn newcomer() -> Address {
    Address::repeat(0x12)
}

fn proposer() -> Address {
    Address::repeat(0x22)
}

fn params() -> OracleParams {
    OracleParams {
        vote_period: VOTE_PERIOD,
        epoch_period: 120,
        ..OracleParams::dev_defaults()
    }
}

fn config() -> NodeConfig {
    let treasury = params().treasury_address;
    NodeConfig {
        storage: StorageBackend::Memory,
        base_fee_gwei: 25,
        proposer: proposer(),
        block_interval_ms: 10,
        genesis: GenesisConfig {
            accounts: vec![
                GenesisAccount {
                    address: voter(),
                    balance_tokens: 100,
                },
                GenesisAccount {
                    address: newcomer(),
                    balance_tokens: 100,
                },
                GenesisAccount {
                    address: proposer(),
                    balance_tokens: 5,
                },
                GenesisAccount {
                    address: treasury,
                    balance_tokens: 7,
                },
            ],
            voters: vec![voter()],
        },
        oracle: params(),
        ..NodeConfig::ephemeral()
    }
}

fn vote(node: &TallyNode, from: Address) -> Transaction {
    let nonce = node.nonce(&from).unwrap();
    Transaction::vote(node.chain_id(), from, nonce, VoteCall::empty()).with_gas(
        200_000,
        Wei::from_gwei(40),
        Wei::from_gwei(3),
    )
}

fn produce_until_round(node: &TallyNode, round: u64) {
    while node.current_round() < Round::new(round) {
        node.produce_block().unwrap();
    }
}

// ---------------------------------------------------------------------------
// Vote fee scenarios
// ---------------------------------------------------------------------------

#[test]
fn new_voter_first_vote_after_joining_is_free() {
    let node = TallyNode::new(config()).unwrap();
    node.register_voter(newcomer());

    // not yet eligible in the round it joined
    let tx = vote(&node, newcomer());
    let hash = node.submit(tx).unwrap();
    let outcome = node.produce_block().unwrap();
    let receipt = outcome.receipt(&hash).unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Failed);
    assert_eq!(receipt.revert_reason.as_deref(), Some("not an eligible voter"));

    produce_until_round(&node, 1);

    let treasury = params().treasury_address;
    let sender_before = node.balance(&newcomer()).unwrap();
    let proposer_before = node.balance(&proposer()).unwrap();
    let treasury_before = node.balance(&treasury).unwrap();

    let hash = node.submit(vote(&node, newcomer())).unwrap();
    let outcome = node.produce_block().unwrap();
    let receipt = outcome.receipt(&hash).unwrap();

    assert!(receipt.succeeded());
    assert_eq!(receipt.refund, RefundDecision::RefundFull);
    assert_eq!(node.balance(&newcomer()).unwrap(), sender_before);
    assert_eq!(node.balance(&proposer()).unwrap(), proposer_before);
    assert_eq!(node.balance(&treasury).unwrap(), treasury_before);
    assert!(node.has_voted(Round::new(1), &newcomer()).unwrap());
}

#[test]
fn second_vote_in_round_pays_base_fee_and_tip() {
    let node = TallyNode::new(config()).unwrap();
    let treasury = params().treasury_address;

    node.submit(vote(&node, voter())).unwrap();
    node.produce_block().unwrap();

    let view_before = node.current_view();
    let sender_before = node.balance(&voter()).unwrap();
    let proposer_before = node.balance(&proposer()).unwrap();
    let treasury_before = node.balance(&treasury).unwrap();

    let tx = vote(&node, voter());
    let expected_gas = intrinsic_gas(&params(), &tx.calldata().unwrap())
        + params().eligibility_read_gas
        + params().ledger_read_gas;
    let hash = node.submit(tx).unwrap();
    let outcome = node.produce_block().unwrap();
    let receipt = outcome.receipt(&hash).unwrap();

    assert_eq!(receipt.status, ReceiptStatus::Failed);
    assert_eq!(receipt.revert_reason.as_deref(), Some("already voted"));
    assert_eq!(receipt.gas_used, expected_gas);

    let base_cost = Wei::from_gwei(25).checked_mul_gas(expected_gas).unwrap();
    let tip_cost = Wei::from_gwei(3).checked_mul_gas(expected_gas).unwrap();
    assert_eq!(receipt.fee.base_cost, base_cost);
    assert_eq!(receipt.fee.tip_cost, tip_cost);
    assert_eq!(
        node.balance(&voter()).unwrap(),
        sender_before.saturating_sub(base_cost + tip_cost)
    );
    assert_eq!(node.balance(&proposer()).unwrap(), proposer_before + tip_cost);
    assert_eq!(node.balance(&treasury).unwrap(), treasury_before + base_cost);

    let view_after = node.current_view();
    assert_eq!(view_after.round, view_before.round);
    assert_eq!(view_after.epoch, view_before.epoch);
    assert_eq!(view_after.epoch, Epoch::GENESIS);
}

#[test]
fn voter_can_vote_again_after_round_boundary() {
    let node = TallyNode::new(config()).unwrap();

    let hash = node.submit(vote(&node, voter())).unwrap();
    assert!(node.produce_block().unwrap().receipt(&hash).unwrap().succeeded());

    produce_until_round(&node, 1);
    assert_eq!(node.last_block(), VOTE_PERIOD);

    let before = node.balance(&voter()).unwrap();
    let hash = node.submit(vote(&node, voter())).unwrap();
    let outcome = node.produce_block().unwrap();
    assert!(outcome.receipt(&hash).unwrap().succeeded());
    assert_eq!(node.balance(&voter()).unwrap(), before);
}

#[test]
fn superseded_round_votes_are_pruned() {
    let node = TallyNode::new(config()).unwrap();
    node.submit(vote(&node, voter())).unwrap();
    node.produce_block().unwrap();
    assert!(node.has_voted(Round::GENESIS, &voter()).unwrap());

    produce_until_round(&node, 1);
    assert!(!node.has_voted(Round::GENESIS, &voter()).unwrap());
    assert_eq!(node.metrics().votes_pruned.get(), 1);
}

#[test]
fn queries_do_not_change_state() {
    let node = TallyNode::new(config()).unwrap();
    node.submit(vote(&node, voter())).unwrap();
    node.produce_block().unwrap();

    let view = node.current_view();
    let balance = node.balance(&voter()).unwrap();
    for _ in 0..3 {
        assert!(node.has_voted(view.round, &voter()).unwrap());
        assert_eq!(node.current_round(), view.round);
    }
    assert_eq!(node.current_view(), view);
    assert_eq!(node.balance(&voter()).unwrap(), balance);
    assert_eq!(node.last_block(), 1);
}

#[test]
fn forced_round_change_reopens_voting() {
    let node = TallyNode::new(config()).unwrap();
    node.submit(vote(&node, voter())).unwrap();
    node.produce_block().unwrap();

    node.advance_round().unwrap();
    assert_eq!(node.current_round(), Round::new(1));

    let hash = node.submit(vote(&node, voter())).unwrap();
    assert!(node.produce_block().unwrap().receipt(&hash).unwrap().succeeded());
}

// ---------------------------------------------------------------------------
// Submission and block production
// ---------------------------------------------------------------------------

#[test]
fn wrong_chain_rejected_at_submission() {
    let node = TallyNode::new(config()).unwrap();
    let tx = Transaction::vote(node.chain_id() + 1, voter(), 0, VoteCall::empty());
    assert!(matches!(
        node.submit(tx),
        Err(NodeError::InvalidTransaction(_))
    ));
    assert_eq!(node.mempool_len(), 0);
}

#[test]
fn bad_nonce_is_dropped_and_reported() {
    let node = TallyNode::new(config()).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    node.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));

    let tx = Transaction::vote(node.chain_id(), voter(), 9, VoteCall::empty()).with_gas(
        200_000,
        Wei::from_gwei(40),
        Wei::from_gwei(3),
    );
    let hash = node.submit(tx).unwrap();
    let outcome = node.produce_block().unwrap();

    assert!(outcome.receipts.is_empty());
    assert_eq!(outcome.dropped[0].tx_hash, Some(hash));
    assert_eq!(node.nonce(&voter()).unwrap(), 0);
    assert_eq!(node.balance(&voter()).unwrap(), Wei::new(100 * TOKEN_UNIT));
    assert!(events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, NodeEvent::TxDropped { tx_hash, .. } if *tx_hash == hash)));
}

#[test]
fn block_respects_max_block_txs() {
    let node = TallyNode::new(NodeConfig {
        max_block_txs: 2,
        ..config()
    })
    .unwrap();
    for nonce in 0..3 {
        let tx = Transaction::transfer(node.chain_id(), voter(), nonce, proposer(), Wei::new(1))
            .with_gas(100_000, Wei::from_gwei(40), Wei::from_gwei(3));
        node.submit(tx).unwrap();
    }
    assert_eq!(node.produce_block().unwrap().receipts.len(), 2);
    assert_eq!(node.mempool_len(), 1);
    assert_eq!(node.produce_block().unwrap().receipts.len(), 1);
    assert_eq!(node.nonce(&voter()).unwrap(), 3);
}

#[test]
fn admission_stats_track_outcomes() {
    let node = TallyNode::new(config()).unwrap();
    node.submit(vote(&node, voter())).unwrap();
    node.produce_block().unwrap();
    node.submit(vote(&node, voter())).unwrap();
    node.produce_block().unwrap();

    let stats = node.admission_stats();
    assert_eq!(stats["accepted"], 1);
    assert_eq!(stats["rejected"], 1);
    assert_eq!(stats["ineligible"], 0);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn lmdb_node_resumes_where_it_stopped() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lmdb_config = || NodeConfig {
        storage: StorageBackend::Lmdb,
        data_dir: dir.path().to_path_buf(),
        map_size_mb: 64,
        ..config()
    };

    let paid_balance = {
        let node = TallyNode::new(lmdb_config()).unwrap();
        node.submit(vote(&node, voter())).unwrap();
        node.produce_block().unwrap();
        produce_until_round(&node, 1);
        node.submit(vote(&node, voter())).unwrap();
        node.produce_block().unwrap();
        node.submit(vote(&node, voter())).unwrap();
        let outcome = node.produce_block().unwrap();
        assert!(!outcome.receipts[0].succeeded());
        node.balance(&voter()).unwrap()
    };

    let node = TallyNode::new(lmdb_config()).unwrap();
    assert_eq!(node.last_block(), VOTE_PERIOD + 2);
    assert_eq!(node.current_round(), Round::new(1));
    assert_eq!(node.balance(&voter()).unwrap(), paid_balance);
    assert_eq!(node.nonce(&voter()).unwrap(), 3);
    assert!(node.has_voted(Round::new(1), &voter()).unwrap());

    // genesis is not applied twice
    assert!(paid_balance < Wei::new(100 * TOKEN_UNIT));

    // the restored ledger still rejects a repeat vote in round 1
    let hash = node.submit(vote(&node, voter())).unwrap();
    let outcome = node.produce_block().unwrap();
    assert_eq!(
        outcome.receipt(&hash).unwrap().revert_reason.as_deref(),
        Some("already voted")
    );
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_produces_blocks_until_shutdown() {
    let node = Arc::new(TallyNode::new(config()).unwrap());
    let shutdown = Arc::new(ShutdownController::new());
    let mut reader = node.round_reader();
    node.submit(vote(&node, voter())).unwrap();

    let runner = {
        let node = Arc::clone(&node);
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { node.run(&shutdown).await })
    };

    let view = tokio::time::timeout(Duration::from_secs(5), reader.changed())
        .await
        .expect("round should advance while running")
        .unwrap();
    assert!(view.round >= Round::new(1));

    shutdown.shutdown();
    runner.await.unwrap().unwrap();

    let stopped_at = node.last_block();
    assert!(stopped_at >= VOTE_PERIOD);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(node.last_block(), stopped_at);
    assert_eq!(node.metrics().votes_accepted.get(), 1);
}
