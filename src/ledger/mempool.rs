// Mempool

use crate::core::{Hash256, Transaction};
use std::collections::BTreeMap;

/// Transactions seen but not yet confirmed in a block, keyed by id
///
/// A BTreeMap keeps iteration order stable across nodes and runs, so block
/// assembly selects in a reproducible order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mempool {
    entries: BTreeMap<Hash256, Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &Hash256) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert if absent; returns false when the id was already present
    pub fn insert(&mut self, tx: Transaction) -> bool {
        if self.entries.contains_key(&tx.id) {
            return false;
        }
        self.entries.insert(tx.id, tx);
        true
    }

    /// Drop a confirmed transaction
    pub fn remove(&mut self, id: &Hash256) -> Option<Transaction> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending transactions in id order
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Address, TxOutput};

    fn tx(note: &str) -> Transaction {
        Transaction::coinbase(note, vec![TxOutput::new(Address::from("00aa"), 1)])
    }

    #[test]
    fn test_insert_and_contains() {
        let mut pool = Mempool::new();
        let tx = tx("a");
        assert!(pool.insert(tx.clone()));
        assert!(pool.contains(&tx.id));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_is_a_noop() {
        let mut pool = Mempool::new();
        let tx = tx("a");
        assert!(pool.insert(tx.clone()));
        assert!(!pool.insert(tx.clone()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_confirmed() {
        let mut pool = Mempool::new();
        let tx = tx("a");
        pool.insert(tx.clone());
        assert!(pool.remove(&tx.id).is_some());
        assert!(pool.is_empty());
        assert!(pool.remove(&tx.id).is_none());
    }

    #[test]
    fn test_iteration_is_id_ordered() {
        let mut pool = Mempool::new();
        for note in ["a", "b", "c", "d"] {
            pool.insert(tx(note));
        }
        let ids: Vec<Hash256> = pool.transactions().map(|tx| tx.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
