// Block data structures

use crate::core::codec;
use crate::core::{ChainParams, Hash256, Transaction, TxOutput};
use serde::{Deserialize, Serialize};

/// Block header
///
/// `hash` is fixed by the proof-of-work search (or computed directly for
/// genesis) and is excluded from its own preimage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Position in the chain, genesis is 0
    pub height: u64,
    /// Hash of the previous block's header
    pub previous_hash: Hash256,
    /// Unix seconds at assembly; carried in the preimage, never validated
    pub timestamp: u64,
    /// Proof-of-work counter
    pub nonce: u64,
    /// Hash of the other four fields in canonical form
    pub hash: Hash256,
}

/// Hashing view of a header: everything but the hash itself
#[derive(Serialize)]
struct RawHeader<'a> {
    height: u64,
    previous_hash: &'a Hash256,
    timestamp: u64,
    nonce: u64,
}

impl<'a> From<&'a BlockHeader> for RawHeader<'a> {
    fn from(header: &'a BlockHeader) -> Self {
        Self {
            height: header.height,
            previous_hash: &header.previous_hash,
            timestamp: header.timestamp,
            nonce: header.nonce,
        }
    }
}

impl BlockHeader {
    /// Header of a candidate block, hash not yet searched
    pub fn candidate(height: u64, previous_hash: Hash256, timestamp: u64) -> Self {
        Self {
            height,
            previous_hash,
            timestamp,
            nonce: 0,
            hash: Hash256::zero(),
        }
    }

    /// Recompute the hash from the other fields
    pub fn compute_hash(&self) -> Hash256 {
        codec::canonical_hash(&RawHeader::from(self))
    }
}

/// Block - header plus ordered transactions, coinbase first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Build the genesis block for the given parameters
    ///
    /// Genesis is not mined: its fields are fixed and its hash is computed
    /// directly, so every node constructing it from equal params gets the
    /// byte-identical block.
    pub fn genesis(params: &ChainParams) -> Self {
        let outputs = params
            .genesis_allocations
            .iter()
            .map(|(address, amount)| TxOutput::new(address.clone(), *amount))
            .collect();
        let coinbase = Transaction::coinbase("Genesis", outputs);

        let mut header = BlockHeader::candidate(0, Hash256::zero(), 0);
        header.hash = header.compute_hash();

        Self {
            header,
            transactions: vec![coinbase],
        }
    }

    /// Get the block hash
    pub fn hash(&self) -> Hash256 {
        self.header.hash
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.header.height == 0 && self.header.previous_hash == Hash256::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    fn test_params() -> ChainParams {
        ChainParams::new(1, 50).with_allocation(Address::from("00aa"), 100)
    }

    #[test]
    fn test_header_hash_covers_all_fields() {
        let base = BlockHeader::candidate(1, Hash256::new([9u8; 32]), 1_700_000_000);
        let hash = base.compute_hash();

        let mut nonce_changed = base.clone();
        nonce_changed.nonce = 1;
        assert_ne!(nonce_changed.compute_hash(), hash);

        let mut time_changed = base.clone();
        time_changed.timestamp += 1;
        assert_ne!(time_changed.compute_hash(), hash);

        let mut link_changed = base.clone();
        link_changed.previous_hash = Hash256::zero();
        assert_ne!(link_changed.compute_hash(), hash);
    }

    #[test]
    fn test_header_hash_excludes_stored_hash() {
        let mut header = BlockHeader::candidate(1, Hash256::new([9u8; 32]), 1_700_000_000);
        let hash = header.compute_hash();
        header.hash = hash;
        assert_eq!(header.compute_hash(), hash);
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis(&test_params());
        assert!(genesis.is_genesis());
        assert_eq!(genesis.header.height, 0);
        assert_eq!(genesis.header.previous_hash, Hash256::zero());
        assert_eq!(genesis.header.timestamp, 0);
        assert_eq!(genesis.header.nonce, 0);
        assert_eq!(genesis.transactions.len(), 1);
        assert!(genesis.transactions[0].is_coinbase());
        assert_eq!(genesis.transactions[0].total_output_value(), Some(100));
        assert_eq!(genesis.header.hash, genesis.header.compute_hash());
    }

    #[test]
    fn test_genesis_is_deterministic() {
        let params = test_params();
        assert_eq!(Block::genesis(&params), Block::genesis(&params));
    }

    #[test]
    fn test_genesis_differs_per_allocation() {
        let a = Block::genesis(&test_params());
        let b = Block::genesis(
            &ChainParams::new(1, 50).with_allocation(Address::from("00bb"), 100),
        );
        // Same header fields, different coinbase
        assert_eq!(a.header, b.header);
        assert_ne!(a.transactions[0].id, b.transactions[0].id);
    }
}
