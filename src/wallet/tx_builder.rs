// Transaction builder

use thiserror::Error;

use crate::core::{
    Address, DraftTransaction, Outpoint, Transaction, TxInput, TxOutput, UnlockingProof,
};
use crate::crypto;
use crate::ledger::UtxoSet;
use crate::wallet::Keystore;

/// Reasons a payment cannot be built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Outputs owned by the sender do not cover amount plus fee
    #[error("insufficient funds: {available} available, {required} required")]
    InsufficientFunds { available: u64, required: u64 },
    /// No key pair for the address
    #[error("no key for address {0}")]
    UnknownKey(Address),
    /// Input references an outpoint the UTXO set does not hold
    #[error("unknown outpoint {0}")]
    UnknownOutpoint(Outpoint),
}

/// Builds signed payments from a keystore against a UTXO snapshot
pub struct TransactionBuilder<'a> {
    keystore: &'a Keystore,
    utxo_set: &'a UtxoSet,
}

impl<'a> TransactionBuilder<'a> {
    /// Create a new transaction builder
    pub fn new(keystore: &'a Keystore, utxo_set: &'a UtxoSet) -> Self {
        Self { keystore, utxo_set }
    }

    /// Build and sign a payment of `amount` to `to`, funded by outputs owned
    /// by `from` with change returned there
    pub fn build(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
        fee: u64,
    ) -> Result<Transaction, WalletError> {
        let draft = self.draft(from, to, amount, fee)?;
        self.sign(draft)
    }

    /// Select outputs owned by `from` until they cover amount plus fee, then
    /// lay out the payment and any change
    pub fn draft(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
        fee: u64,
    ) -> Result<DraftTransaction, WalletError> {
        if self.keystore.get(from).is_none() {
            return Err(WalletError::UnknownKey(from.clone()));
        }

        // An amount plus fee past u64::MAX can never be covered
        let Some(required) = amount.checked_add(fee) else {
            return Err(WalletError::InsufficientFunds {
                available: self.utxo_set.balance(from),
                required: u64::MAX,
            });
        };
        let mut inputs = Vec::new();
        let mut total = 0u64;

        for (outpoint, output) in self.utxo_set.iter() {
            if output.owner_address != *from {
                continue;
            }
            // Selected inputs must stay summable within u64
            let Some(sum) = total.checked_add(output.amount) else {
                continue;
            };
            inputs.push(TxInput::spend(*outpoint));
            total = sum;
            if total >= required {
                break;
            }
        }

        if total < required {
            return Err(WalletError::InsufficientFunds {
                available: total,
                required,
            });
        }

        let mut outputs = vec![TxOutput::new(to.clone(), amount)];
        let change = total - required;
        if change > 0 {
            outputs.push(TxOutput::new(from.clone(), change));
        }

        Ok(DraftTransaction::new(inputs, outputs))
    }

    /// Sign every input of a draft and seal the transaction.
    ///
    /// All inputs commit to the same proof-free digest, so the digest is
    /// fixed before any proof is attached.
    pub fn sign(&self, draft: DraftTransaction) -> Result<Transaction, WalletError> {
        let digest = draft.signing_digest();
        let mut inputs = draft.inputs;

        for input in &mut inputs {
            let funding = self
                .utxo_set
                .get(&input.outpoint)
                .ok_or(WalletError::UnknownOutpoint(input.outpoint))?;
            let keypair = self
                .keystore
                .get(&funding.owner_address)
                .ok_or_else(|| WalletError::UnknownKey(funding.owner_address.clone()))?;

            input.proof = Some(UnlockingProof {
                public_key: keypair.public_key_hex(),
                signature: crypto::sign(&keypair.secret_key, &digest),
            });
        }

        Ok(Transaction::seal(inputs, draft.outputs))
    }

    /// Spendable balance of an address in the snapshot
    pub fn balance(&self, address: &Address) -> u64 {
        self.utxo_set.balance(address)
    }
}
