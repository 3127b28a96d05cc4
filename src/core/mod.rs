// Core ledger data structures

mod types;
mod transaction;
mod block;
mod hash;
pub mod codec;

pub use types::*;
pub use transaction::*;
pub use block::*;
pub use hash::*;
