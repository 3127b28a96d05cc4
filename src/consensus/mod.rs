// Consensus rules: proof of work, validation, candidate assembly

pub mod assembler;
pub mod pow;
pub mod validation;

pub use validation::{BlockError, TxError};
