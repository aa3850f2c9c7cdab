//! Bounded mempool — transactions waiting for the next block.
//!
//! FIFO across senders, so a sender's transactions keep their submission
//! order and therefore their nonce order. A global cap and a per-sender cap
//! keep one account from filling the pool.

use std::collections::{HashMap, VecDeque};

use tally_state::Transaction;
use tally_types::{Address, TxHash};

use crate::NodeError;

pub struct Mempool {
    queue: VecDeque<(TxHash, Transaction)>,
    per_sender: HashMap<Address, usize>,
    capacity: usize,
    max_per_sender: usize,
}

impl Mempool {
    pub fn new(capacity: usize, max_per_sender: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            per_sender: HashMap::new(),
            capacity,
            max_per_sender,
        }
    }

    pub fn insert(&mut self, tx: Transaction) -> Result<TxHash, NodeError> {
        let hash = tx.hash()?;
        if self.queue.len() >= self.capacity {
            return Err(NodeError::MempoolFull(format!(
                "{} transactions pending",
                self.queue.len()
            )));
        }
        let count = self.per_sender.entry(tx.from).or_insert(0);
        if *count >= self.max_per_sender {
            return Err(NodeError::MempoolFull(format!(
                "{} has {} transactions pending",
                tx.from, count
            )));
        }
        *count += 1;
        self.queue.push_back((hash, tx));
        Ok(hash)
    }

    /// Take up to `max` transactions in submission order.
    pub fn drain(&mut self, max: usize) -> Vec<Transaction> {
        let n = max.min(self.queue.len());
        let mut out = Vec::with_capacity(n);
        for (_, tx) in self.queue.drain(..n) {
            if let Some(count) = self.per_sender.get_mut(&tx.from) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.per_sender.remove(&tx.from);
                }
            }
            out.push(tx);
        }
        out
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.queue.iter().any(|(h, _)| h == hash)
    }

    pub fn pending_for(&self, sender: &Address) -> usize {
        self.per_sender.get(sender).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_oracle::VoteCall;

    fn tx(sender: u8, nonce: u64) -> Transaction {
        Transaction::vote(1, Address::repeat(sender), nonce, VoteCall::empty())
    }

    #[test]
    fn drain_preserves_submission_order() {
        let mut pool = Mempool::new(10, 10);
        pool.insert(tx(1, 0)).unwrap();
        pool.insert(tx(2, 0)).unwrap();
        pool.insert(tx(1, 1)).unwrap();

        let drained = pool.drain(2);
        assert_eq!(drained[0], tx(1, 0));
        assert_eq!(drained[1], tx(2, 0));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.pending_for(&Address::repeat(1)), 1);
        assert_eq!(pool.pending_for(&Address::repeat(2)), 0);
    }

    #[test]
    fn global_cap_enforced() {
        let mut pool = Mempool::new(2, 2);
        pool.insert(tx(1, 0)).unwrap();
        pool.insert(tx(2, 0)).unwrap();
        assert!(matches!(pool.insert(tx(3, 0)), Err(NodeError::MempoolFull(_))));
    }

    #[test]
    fn per_sender_cap_enforced() {
        let mut pool = Mempool::new(10, 2);
        pool.insert(tx(1, 0)).unwrap();
        pool.insert(tx(1, 1)).unwrap();
        assert!(pool.insert(tx(1, 2)).is_err());
        pool.insert(tx(2, 0)).unwrap();
        pool.drain(1);
        pool.insert(tx(1, 2)).unwrap();
    }

    #[test]
    fn contains_by_hash() {
        let mut pool = Mempool::new(10, 10);
        let hash = pool.insert(tx(1, 0)).unwrap();
        assert!(pool.contains(&hash));
        pool.drain(10);
        assert!(!pool.contains(&hash));
        assert!(pool.is_empty());
    }
}
