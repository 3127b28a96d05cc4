// Transaction and block validation

use std::collections::HashSet;

use thiserror::Error;

use crate::consensus::pow;
use crate::core::{Block, BlockHeader, Outpoint, Transaction};
use crate::crypto;
use crate::ledger::UtxoSet;

/// Reasons a transaction is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// Stored id does not match the canonical hash of the body
    #[error("transaction id does not match its contents")]
    IdMismatch,
    /// Input references an outpoint that is unknown or already spent
    #[error("input {index} spends unknown or spent outpoint {outpoint}")]
    UnknownOrSpentOutpoint { index: usize, outpoint: Outpoint },
    /// Input public key does not hash to the address owning the outpoint
    #[error("input {index} public key does not match the owning address")]
    KeyAddressMismatch { index: usize },
    /// Input proof is missing or its signature does not verify
    #[error("input {index} has a missing or invalid signature")]
    InvalidSignature { index: usize },
    /// Outputs claim more value than the inputs provide
    #[error("inputs provide {total_in} but outputs claim {total_out}")]
    InsufficientInput { total_in: u64, total_out: u64 },
    /// Input or output amounts sum past the u64 range
    #[error("amount sum leaves the u64 range")]
    ValueOverflow,
}

/// Reasons a block is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    /// Stored hash does not match the header fields
    #[error("block hash does not match its header")]
    HashMismatch,
    /// Block hash does not carry enough leading zero digits
    #[error("block hash does not meet difficulty {difficulty}")]
    InsufficientWork { difficulty: usize },
    /// Block does not extend the current tip
    #[error("block does not extend the current tip")]
    NotContiguous,
    /// First transaction is not a coinbase
    #[error("first transaction is not a coinbase")]
    MissingCoinbase,
    /// Coinbase transaction past the first position
    #[error("coinbase transaction at position {index}")]
    MisplacedCoinbase { index: usize },
    /// A transaction in the block failed validation
    #[error("transaction {index} rejected: {source}")]
    InvalidTransaction { index: usize, source: TxError },
}

/// Check a transaction against the supplied UTXO set and return its fee.
///
/// Every input must resolve to an unspent output, carry a public key that
/// hashes to the owning address, and sign the transaction's proof-free
/// digest. An outpoint may fund at most one input, and amount sums must
/// stay within the u64 range. The fee is whatever input value the outputs
/// leave unclaimed. Coinbase transactions skip the input checks and pass
/// with a zero fee; block validation constrains where they may appear.
pub fn validate_transaction(tx: &Transaction, utxo_set: &UtxoSet) -> Result<u64, TxError> {
    if tx.id != tx.compute_id() {
        return Err(TxError::IdMismatch);
    }

    if tx.is_coinbase() {
        return Ok(0);
    }

    // Every input signs the same proof-free digest
    let digest = tx.signing_digest();
    let mut total_in = 0u64;
    let mut spent = HashSet::with_capacity(tx.inputs.len());

    for (index, input) in tx.inputs.iter().enumerate() {
        // A repeated outpoint is already spent by this transaction itself
        if !spent.insert(input.outpoint) {
            return Err(TxError::UnknownOrSpentOutpoint {
                index,
                outpoint: input.outpoint,
            });
        }

        let Some(funding) = utxo_set.get(&input.outpoint) else {
            return Err(TxError::UnknownOrSpentOutpoint {
                index,
                outpoint: input.outpoint,
            });
        };

        let Some(proof) = input.proof.as_ref() else {
            return Err(TxError::InvalidSignature { index });
        };

        let Ok(key_bytes) = hex::decode(&proof.public_key) else {
            return Err(TxError::KeyAddressMismatch { index });
        };
        if crypto::derive_address(&key_bytes) != funding.owner_address {
            return Err(TxError::KeyAddressMismatch { index });
        }

        if !crypto::verify(&proof.public_key, &proof.signature, &digest) {
            return Err(TxError::InvalidSignature { index });
        }

        total_in = total_in
            .checked_add(funding.amount)
            .ok_or(TxError::ValueOverflow)?;
    }

    let total_out = tx.total_output_value().ok_or(TxError::ValueOverflow)?;
    if total_out > total_in {
        return Err(TxError::InsufficientInput { total_in, total_out });
    }

    Ok(total_in - total_out)
}

/// Check a block against the current tip and UTXO set.
///
/// Header checks come first: the stored hash must match the header fields,
/// meet the difficulty, and extend the tip by exactly one height. The
/// transaction list must lead with a coinbase and contain no other.
/// Transactions are then validated in order against a working copy of the
/// set, each applied before the next, so a spend of an earlier output in
/// the same block resolves while an intra-block double spend fails.
///
/// Returns the post-apply set for the caller to install alongside the block.
pub fn validate_block(
    block: &Block,
    tip: &BlockHeader,
    utxo_set: &UtxoSet,
    difficulty: usize,
) -> Result<UtxoSet, BlockError> {
    if block.header.hash != block.header.compute_hash() {
        return Err(BlockError::HashMismatch);
    }

    if !pow::meets_difficulty(&block.header.hash, difficulty) {
        return Err(BlockError::InsufficientWork { difficulty });
    }

    if block.header.previous_hash != tip.hash || block.header.height != tip.height + 1 {
        return Err(BlockError::NotContiguous);
    }

    if !block.transactions.first().is_some_and(|tx| tx.is_coinbase()) {
        return Err(BlockError::MissingCoinbase);
    }

    let mut working = utxo_set.clone();
    for (index, tx) in block.transactions.iter().enumerate() {
        if index > 0 && tx.is_coinbase() {
            return Err(BlockError::MisplacedCoinbase { index });
        }
        validate_transaction(tx, &working)
            .map_err(|source| BlockError::InvalidTransaction { index, source })?;
        working.apply(tx);
    }

    Ok(working)
}
