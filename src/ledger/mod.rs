// Per-node ledger state: unspent outputs, chain, and mempool

mod chain;
mod mempool;
mod utxo;

pub use chain::Chain;
pub use mempool::Mempool;
pub use utxo::UtxoSet;
