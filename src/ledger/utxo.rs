// UTXO set

use crate::core::{Address, Outpoint, Transaction, TxOutput};
use std::collections::HashMap;

/// Unspent outputs, keyed by the outpoint that created them
///
/// Every entry is value not yet consumed by any transaction accepted into
/// this node's chain. Entries appear only through `apply` and disappear
/// only when a later applied transaction spends them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSet {
    entries: HashMap<Outpoint, TxOutput>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an unspent output
    pub fn get(&self, outpoint: &Outpoint) -> Option<&TxOutput> {
        self.entries.get(outpoint)
    }

    pub fn contains(&self, outpoint: &Outpoint) -> bool {
        self.entries.contains_key(outpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a validated transaction: spend its inputs, insert its outputs
    ///
    /// The caller must have validated the transaction against this set
    /// first; apply does not re-check and a missing input outpoint is a
    /// broken caller contract.
    pub fn apply(&mut self, tx: &Transaction) {
        if !tx.is_coinbase() {
            for input in &tx.inputs {
                let spent = self.entries.remove(&input.outpoint);
                debug_assert!(spent.is_some(), "applied transaction spends a missing outpoint");
            }
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            self.entries
                .insert(Outpoint::new(tx.id, index as u32), output.clone());
        }
    }

    /// Sum of amounts currently owned by an address, saturating at u64::MAX
    pub fn balance(&self, address: &Address) -> u64 {
        self.entries
            .values()
            .filter(|output| output.owner_address == *address)
            .fold(0u64, |sum, output| sum.saturating_add(output.amount))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Outpoint, &TxOutput)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TxInput;

    fn addr(tag: &str) -> Address {
        Address::from(tag)
    }

    fn coinbase(note: &str, owner: &Address, amount: u64) -> Transaction {
        Transaction::coinbase(note, vec![TxOutput::new(owner.clone(), amount)])
    }

    #[test]
    fn test_apply_coinbase_inserts_outputs() {
        let mut set = UtxoSet::new();
        let tx = coinbase("a", &addr("00aa"), 100);
        set.apply(&tx);

        assert_eq!(set.len(), 1);
        let outpoint = Outpoint::new(tx.id, 0);
        assert_eq!(set.get(&outpoint).unwrap().amount, 100);
    }

    #[test]
    fn test_apply_spend_removes_inputs_and_inserts_outputs() {
        let mut set = UtxoSet::new();
        let funding = coinbase("a", &addr("00aa"), 100);
        set.apply(&funding);

        let spent = Outpoint::new(funding.id, 0);
        let spend = Transaction::seal(
            vec![TxInput::spend(spent)],
            vec![
                TxOutput::new(addr("00bb"), 60),
                TxOutput::new(addr("00aa"), 35),
            ],
        );
        set.apply(&spend);

        assert!(!set.contains(&spent));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(&Outpoint::new(spend.id, 0)).unwrap().amount, 60);
        assert_eq!(set.get(&Outpoint::new(spend.id, 1)).unwrap().amount, 35);
    }

    #[test]
    fn test_balance_sums_owned_outputs() {
        let mut set = UtxoSet::new();
        let owner = addr("00aa");
        set.apply(&coinbase("a", &owner, 100));
        set.apply(&coinbase("b", &owner, 50));
        set.apply(&coinbase("c", &addr("00bb"), 7));

        assert_eq!(set.balance(&owner), 150);
        assert_eq!(set.balance(&addr("00bb")), 7);
        assert_eq!(set.balance(&addr("00cc")), 0);
    }

    #[test]
    fn test_balance_saturates_past_u64() {
        let mut set = UtxoSet::new();
        let owner = addr("00aa");
        set.apply(&coinbase("a", &owner, u64::MAX));
        set.apply(&coinbase("b", &owner, 2));

        assert_eq!(set.balance(&owner), u64::MAX);
    }

    #[test]
    fn test_multi_output_transaction_keys_by_index() {
        let mut set = UtxoSet::new();
        let owner = addr("00aa");
        let tx = Transaction::coinbase(
            "multi",
            vec![
                TxOutput::new(owner.clone(), 1),
                TxOutput::new(owner.clone(), 2),
                TxOutput::new(owner.clone(), 3),
            ],
        );
        set.apply(&tx);

        assert_eq!(set.len(), 3);
        for vout in 0..3u32 {
            assert!(set.contains(&Outpoint::new(tx.id, vout)));
        }
        assert!(!set.contains(&Outpoint::new(tx.id, 3)));
    }
}
