// Transaction data structures

use crate::core::codec;
use crate::core::{Address, Hash256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the output being spent: the creating transaction's id plus
/// the output's position in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Outpoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl Outpoint {
    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// Sentinel outpoint carried by coinbase inputs: zero txid, max index
    pub fn coinbase() -> Self {
        Self {
            txid: Hash256::zero(),
            vout: u32::MAX,
        }
    }

    /// Check for the coinbase sentinel
    pub fn is_coinbase(&self) -> bool {
        self.txid == Hash256::zero() && self.vout == u32::MAX
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Signature plus the public key it verifies under, both hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockingProof {
    pub public_key: String,
    pub signature: String,
}

/// Transaction input
///
/// An ordinary input references an outpoint and, once signed, carries an
/// unlocking proof. A coinbase input uses the sentinel outpoint, no proof,
/// and a free-form note that keeps each block's coinbase id distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub outpoint: Outpoint,
    pub proof: Option<UnlockingProof>,
    pub note: Option<String>,
}

impl TxInput {
    /// Create an unsigned spending input
    pub fn spend(outpoint: Outpoint) -> Self {
        Self {
            outpoint,
            proof: None,
            note: None,
        }
    }

    /// Create a coinbase input
    pub fn coinbase(note: &str) -> Self {
        Self {
            outpoint: Outpoint::coinbase(),
            proof: None,
            note: Some(note.to_string()),
        }
    }

    /// Check if this is a coinbase input
    pub fn is_coinbase(&self) -> bool {
        self.outpoint.is_coinbase()
    }

    /// Copy with the unlocking proof cleared, the form signatures commit to
    pub fn without_proof(&self) -> Self {
        Self {
            proof: None,
            ..self.clone()
        }
    }
}

/// One spendable output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub owner_address: Address,
    pub amount: u64,
}

impl TxOutput {
    pub fn new(owner_address: Address, amount: u64) -> Self {
        Self {
            owner_address,
            amount,
        }
    }
}

/// A transaction draft: inputs chosen, nothing unlocked yet
///
/// Signing works over this proof-free shape, so every input's signature
/// commits to the complete input and output set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftTransaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl DraftTransaction {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self { inputs, outputs }
    }

    /// The digest every input of this draft signs
    pub fn signing_digest(&self) -> [u8; 32] {
        codec::signing_digest(self)
    }
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Fixed at seal time; always the canonical hash of inputs and outputs
    pub id: Hash256,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

/// Hashing view: a transaction without its id field
#[derive(Serialize)]
struct IdView<'a> {
    inputs: &'a [TxInput],
    outputs: &'a [TxOutput],
}

/// Signing view: proofs cleared from every input
#[derive(Serialize)]
struct SigningView {
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Fix the id over finished inputs and outputs
    pub fn seal(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let mut tx = Self {
            id: Hash256::zero(),
            inputs,
            outputs,
        };
        tx.id = tx.compute_id();
        tx
    }

    /// Create a coinbase transaction
    pub fn coinbase(note: &str, outputs: Vec<TxOutput>) -> Self {
        Self::seal(vec![TxInput::coinbase(note)], outputs)
    }

    /// Check if this is a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Recompute the id from the canonical encoding, id field excluded
    pub fn compute_id(&self) -> Hash256 {
        codec::canonical_hash(&IdView {
            inputs: &self.inputs,
            outputs: &self.outputs,
        })
    }

    /// The digest the inputs' signatures were made over: the canonical
    /// encoding of this transaction with every proof cleared
    pub fn signing_digest(&self) -> [u8; 32] {
        codec::signing_digest(&SigningView {
            inputs: self.inputs.iter().map(TxInput::without_proof).collect(),
            outputs: self.outputs.clone(),
        })
    }

    /// Sum of all output amounts, `None` when the sum leaves the u64 range
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |sum, out| sum.checked_add(out.amount))
    }
}
