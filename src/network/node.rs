// A ledger node: keystore, mempool, chain, and the rules that connect them

use std::sync::atomic::AtomicBool;

use crate::consensus::{assembler, pow, validation, BlockError};
use crate::core::{Address, Block, ChainParams, Hash256, Outpoint, Transaction};
use crate::ledger::{Chain, Mempool, UtxoSet};
use crate::wallet::{Keystore, TransactionBuilder, WalletError};

/// One participant in the network.
///
/// A node owns its complete view of the ledger. It never trusts a peer's
/// state: announced transactions and blocks are validated against its own
/// UTXO set and chain before anything is admitted.
pub struct Node {
    pub id: String,
    keystore: Keystore,
    params: ChainParams,
    chain: Chain,
    utxo_set: UtxoSet,
    mempool: Mempool,
}

impl Node {
    /// Create a node with a fresh keystore holding one address
    pub fn new(id: &str, params: ChainParams, genesis: Block) -> Self {
        Self::with_keystore(id, Keystore::new(), params, genesis)
    }

    /// Create a node around an existing keystore.
    ///
    /// Every node starts from the same genesis block, so all chains and
    /// UTXO sets begin identical. A keystore without addresses gets one.
    pub fn with_keystore(
        id: &str,
        mut keystore: Keystore,
        params: ChainParams,
        genesis: Block,
    ) -> Self {
        if keystore.default_address().is_none() {
            keystore.new_address();
        }

        let mut utxo_set = UtxoSet::new();
        for tx in &genesis.transactions {
            utxo_set.apply(tx);
        }

        Self {
            id: id.to_string(),
            keystore,
            params,
            chain: Chain::new(genesis),
            utxo_set,
            mempool: Mempool::new(),
        }
    }

    /// The node's default address, where rewards and change land
    pub fn address(&self) -> Address {
        self.keystore
            .default_address()
            .cloned()
            .expect("node keystore always holds at least one address")
    }

    /// Generate a fresh address in the node's keystore
    pub fn new_address(&mut self) -> Address {
        self.keystore.new_address()
    }

    /// Admit an announced transaction to the mempool.
    ///
    /// Already-known ids are dropped quietly. Coinbase-shaped announcements
    /// and anything invalid against the current UTXO set are rejected, so a
    /// transaction arriving after the block that confirmed it simply
    /// bounces. Returns whether the transaction entered the mempool.
    pub fn receive_transaction(&mut self, tx: Transaction) -> bool {
        if self.mempool.contains(&tx.id) {
            log::debug!("[{}] already holds transaction {}", self.id, tx.id);
            return false;
        }

        if tx.is_coinbase() {
            log::warn!("[{}] rejecting announced coinbase {}", self.id, tx.id);
            return false;
        }

        match validation::validate_transaction(&tx, &self.utxo_set) {
            Ok(fee) => {
                log::info!("[{}] accepted transaction {} (fee {})", self.id, tx.id, fee);
                self.mempool.insert(tx);
                true
            }
            Err(reason) => {
                log::warn!("[{}] rejected transaction {}: {}", self.id, tx.id, reason);
                false
            }
        }
    }

    /// Install an announced block if it extends the current tip.
    ///
    /// Validation yields the post-apply UTXO set, which is installed in the
    /// same step as the block so the two never disagree. Transactions the
    /// block confirmed leave the mempool.
    pub fn receive_block(&mut self, block: Block) -> Result<(), BlockError> {
        let post_apply = validation::validate_block(
            &block,
            self.chain.tip_header(),
            &self.utxo_set,
            self.params.difficulty,
        )?;

        for tx in &block.transactions {
            self.mempool.remove(&tx.id);
        }
        self.utxo_set = post_apply;
        log::info!(
            "[{}] chain extended to height {} by block {}",
            self.id,
            block.header.height,
            block.hash()
        );
        self.chain.push(block);
        Ok(())
    }

    /// Assemble a candidate block, or None while the mempool is empty
    pub fn build_candidate(&self) -> Option<Block> {
        if self.mempool.is_empty() {
            return None;
        }
        Some(assembler::build_candidate(
            &self.mempool,
            &self.utxo_set,
            &self.address(),
            &self.params,
            self.chain.tip_header(),
        ))
    }

    /// Mine one block from the current mempool and install it locally.
    ///
    /// Returns None when the mempool is empty, the search was aborted, or
    /// the tip moved during the search so the result no longer extends it.
    /// The caller broadcasts the returned block.
    pub fn mine_block(&mut self, abort: &AtomicBool) -> Option<Block> {
        let candidate = self.build_candidate()?;
        let Block {
            header,
            transactions,
        } = candidate;

        let header = pow::mine(header, self.params.difficulty, abort)?;
        let block = Block::new(header, transactions);

        match self.receive_block(block.clone()) {
            Ok(()) => Some(block),
            Err(reason) => {
                log::warn!("[{}] discarding mined block: {}", self.id, reason);
                None
            }
        }
    }

    /// Build, sign, and locally admit a payment from the default address.
    ///
    /// The caller broadcasts the returned transaction; this node's mempool
    /// already holds it.
    pub fn send(&mut self, to: &Address, amount: u64, fee: u64) -> Result<Transaction, WalletError> {
        let from = self.address();
        let tx = TransactionBuilder::new(&self.keystore, &self.utxo_set)
            .build(&from, to, amount, fee)?;
        self.receive_transaction(tx.clone());
        Ok(tx)
    }

    /// Consensus parameters this node runs under
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Confirmed balance of the default address
    pub fn balance(&self) -> u64 {
        self.utxo_set.balance(&self.address())
    }

    /// Confirmed balance of any address
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.utxo_set.balance(address)
    }

    /// Height of the chain tip
    pub fn chain_height(&self) -> u64 {
        self.chain.height()
    }

    /// Number of blocks, genesis included
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Hash of the chain tip
    pub fn tip_hash(&self) -> Hash256 {
        self.chain.tip_hash()
    }

    /// Number of pending transactions
    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    /// Number of unspent outputs
    pub fn utxo_len(&self) -> usize {
        self.utxo_set.len()
    }

    /// Whether the UTXO set holds the outpoint
    pub fn has_utxo(&self, outpoint: &Outpoint) -> bool {
        self.utxo_set.contains(outpoint)
    }

    /// Log a one-line summary of the node's view
    pub fn log_state(&self) {
        log::info!(
            "[{}] height {} tip {} mempool {} utxo {} balance {}",
            self.id,
            self.chain_height(),
            self.tip_hash(),
            self.mempool_len(),
            self.utxo_len(),
            self.balance()
        );
    }
}
