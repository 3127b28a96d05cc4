// Multi-node UTXO ledger with proof-of-work consensus

pub mod consensus;
pub mod core;
pub mod crypto;
pub mod ledger;
pub mod network;
pub mod wallet;

mod cli;

// Re-exports for convenience
pub use cli::{Cli, Commands, run};
pub use consensus::{BlockError, TxError};
pub use self::core::{
    Address, Block, BlockHeader, ChainParams, Hash256, Outpoint, Transaction, TxInput, TxOutput,
};
pub use ledger::{Chain, Mempool, UtxoSet};
pub use network::{Message, Network, Node, NodeHandle, StateReport};
pub use wallet::{Keystore, TransactionBuilder, WalletError};
