// Candidate block assembly

use std::time::{SystemTime, UNIX_EPOCH};

use crate::consensus::validation;
use crate::core::{Address, Block, BlockHeader, ChainParams, Transaction, TxOutput};
use crate::ledger::{Mempool, UtxoSet};

/// Assemble an unmined candidate block on top of the given tip.
///
/// Mempool transactions are considered in id order and validated against a
/// running copy of the UTXO set, each selected one applied before the next,
/// so conflicting spends resolve to a single winner and the rest stay
/// behind. Collected fees join the block reward in a fresh coinbase at
/// position zero; a transaction whose fee would push the coinbase amount
/// past the u64 range stays behind too. The returned header still carries
/// a zero nonce and hash; the proof-of-work search fills those in.
pub fn build_candidate(
    mempool: &Mempool,
    utxo_set: &UtxoSet,
    miner_address: &Address,
    params: &ChainParams,
    tip: &BlockHeader,
) -> Block {
    let mut working = utxo_set.clone();
    let mut selected = Vec::new();
    let mut coinbase_value = params.block_reward;

    for tx in mempool.transactions() {
        if tx.is_coinbase() {
            log::warn!("skipping coinbase-shaped mempool transaction {}", tx.id);
            continue;
        }
        match validation::validate_transaction(tx, &working) {
            Ok(fee) => {
                let Some(rewarded) = coinbase_value.checked_add(fee) else {
                    log::debug!(
                        "leaving transaction {} out of candidate: fee overflows the coinbase",
                        tx.id
                    );
                    continue;
                };
                coinbase_value = rewarded;
                working.apply(tx);
                selected.push(tx.clone());
            }
            Err(reason) => {
                log::debug!("leaving transaction {} out of candidate: {}", tx.id, reason);
            }
        }
    }

    let height = tip.height + 1;
    let coinbase = Transaction::coinbase(
        &format!("mined at height {}", height),
        vec![TxOutput::new(miner_address.clone(), coinbase_value)],
    );

    let mut transactions = vec![coinbase];
    transactions.append(&mut selected);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock set before the unix epoch")
        .as_secs();

    Block::new(
        BlockHeader::candidate(height, tip.hash, timestamp),
        transactions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DraftTransaction, Outpoint, TxInput, UnlockingProof};
    use crate::crypto;
    use rand::rngs::OsRng;
    use secp256k1::{Secp256k1, SecretKey};

    struct Funder {
        secret_key: SecretKey,
        public_key_hex: String,
        address: Address,
    }

    fn funder() -> Funder {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::new(&mut OsRng);
        let key_bytes = secret_key.public_key(&secp).serialize();
        Funder {
            secret_key,
            public_key_hex: hex::encode(key_bytes),
            address: crypto::derive_address(&key_bytes),
        }
    }

    fn funded_set(funder: &Funder, amount: u64) -> (UtxoSet, Outpoint) {
        let coinbase = Transaction::coinbase(
            "funding",
            vec![TxOutput::new(funder.address.clone(), amount)],
        );
        let mut set = UtxoSet::new();
        set.apply(&coinbase);
        (set, Outpoint::new(coinbase.id, 0))
    }

    fn signed_spend(funder: &Funder, outpoint: Outpoint, outputs: Vec<TxOutput>) -> Transaction {
        let draft = DraftTransaction::new(vec![TxInput::spend(outpoint)], outputs);
        let digest = draft.signing_digest();
        let mut inputs = draft.inputs;
        inputs[0].proof = Some(UnlockingProof {
            public_key: funder.public_key_hex.clone(),
            signature: crypto::sign(&funder.secret_key, &digest),
        });
        Transaction::seal(inputs, draft.outputs)
    }

    #[test]
    fn test_empty_mempool_yields_coinbase_only_candidate() {
        let miner = funder();
        let params = ChainParams::new(1, 50);
        let genesis = Block::genesis(&params);

        let candidate = build_candidate(
            &Mempool::new(),
            &UtxoSet::new(),
            &miner.address,
            &params,
            &genesis.header,
        );

        assert_eq!(candidate.header.height, 1);
        assert_eq!(candidate.header.previous_hash, genesis.header.hash);
        assert_eq!(candidate.header.nonce, 0);
        assert_eq!(candidate.transactions.len(), 1);
        assert!(candidate.transactions[0].is_coinbase());
        assert_eq!(candidate.transactions[0].total_output_value(), Some(50));
    }

    #[test]
    fn test_fees_flow_into_coinbase() {
        let alice = funder();
        let miner = funder();
        let params = ChainParams::new(1, 50);
        let genesis = Block::genesis(&params);
        let (set, outpoint) = funded_set(&alice, 100);

        let mut mempool = Mempool::new();
        // Outputs claim 95 of the 100 input, leaving a 5 fee
        mempool.insert(signed_spend(
            &alice,
            outpoint,
            vec![TxOutput::new(alice.address.clone(), 95)],
        ));

        let candidate = build_candidate(&mempool, &set, &miner.address, &params, &genesis.header);

        assert_eq!(candidate.transactions.len(), 2);
        assert_eq!(candidate.transactions[0].total_output_value(), Some(55));
        assert_eq!(
            candidate.transactions[0].outputs[0].owner_address,
            miner.address
        );
    }

    #[test]
    fn test_fee_overflowing_coinbase_stays_behind() {
        let alice = funder();
        let miner = funder();
        let params = ChainParams::new(1, u64::MAX);
        let genesis = Block::genesis(&params);
        let (set, outpoint) = funded_set(&alice, 100);

        let mut mempool = Mempool::new();
        // A 5 fee on top of the u64::MAX reward has no representable coinbase
        mempool.insert(signed_spend(
            &alice,
            outpoint,
            vec![TxOutput::new(alice.address.clone(), 95)],
        ));

        let candidate = build_candidate(&mempool, &set, &miner.address, &params, &genesis.header);

        assert_eq!(candidate.transactions.len(), 1);
        assert!(candidate.transactions[0].is_coinbase());
        assert_eq!(
            candidate.transactions[0].total_output_value(),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_conflicting_spends_resolve_to_one_winner() {
        let alice = funder();
        let miner = funder();
        let params = ChainParams::new(1, 50);
        let genesis = Block::genesis(&params);
        let (set, outpoint) = funded_set(&alice, 100);

        let mut mempool = Mempool::new();
        mempool.insert(signed_spend(
            &alice,
            outpoint,
            vec![TxOutput::new(alice.address.clone(), 100)],
        ));
        mempool.insert(signed_spend(
            &alice,
            outpoint,
            vec![TxOutput::new(miner.address.clone(), 100)],
        ));

        let candidate = build_candidate(&mempool, &set, &miner.address, &params, &genesis.header);

        // Coinbase plus exactly one of the two conflicting spends
        assert_eq!(candidate.transactions.len(), 2);
        assert!(!candidate.transactions[1].is_coinbase());
        assert_eq!(candidate.transactions[1].inputs[0].outpoint, outpoint);
    }

    #[test]
    fn test_coinbase_shaped_entry_is_skipped() {
        let miner = funder();
        let params = ChainParams::new(1, 50);
        let genesis = Block::genesis(&params);

        let mut mempool = Mempool::new();
        mempool.insert(Transaction::coinbase(
            "free money",
            vec![TxOutput::new(miner.address.clone(), 1_000_000)],
        ));

        let candidate = build_candidate(
            &mempool,
            &UtxoSet::new(),
            &miner.address,
            &params,
            &genesis.header,
        );

        assert_eq!(candidate.transactions.len(), 1);
        assert_eq!(candidate.transactions[0].total_output_value(), Some(50));
    }

    #[test]
    fn test_invalid_entries_stay_behind() {
        let alice = funder();
        let miner = funder();
        let params = ChainParams::new(1, 50);
        let genesis = Block::genesis(&params);
        let (set, outpoint) = funded_set(&alice, 100);

        let mut mempool = Mempool::new();
        mempool.insert(signed_spend(
            &alice,
            outpoint,
            vec![TxOutput::new(alice.address.clone(), 100)],
        ));
        // Unknown outpoint, never selectable
        mempool.insert(signed_spend(
            &alice,
            Outpoint::new(crate::core::Hash256::new([9u8; 32]), 0),
            vec![TxOutput::new(alice.address.clone(), 10)],
        ));

        let candidate = build_candidate(&mempool, &set, &miner.address, &params, &genesis.header);

        assert_eq!(candidate.transactions.len(), 2);
        assert_eq!(mempool.len(), 2);
    }
}
