// Key management

use std::collections::HashMap;

use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::core::Address;
use crate::crypto;

/// Key pair with its derived address
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl KeyPair {
    /// Generate a new key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = secret_key.public_key(&secp);
        let address = crypto::derive_address(&public_key.serialize());

        Self {
            secret_key,
            public_key,
            address,
        }
    }

    /// Compressed public key as hex, the form carried in unlocking proofs
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }
}

/// Keystore - manages a node's key pairs
pub struct Keystore {
    keys: HashMap<Address, KeyPair>,
    default_address: Option<Address>,
}

impl Keystore {
    /// Create an empty keystore
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            default_address: None,
        }
    }

    /// Generate a new address
    pub fn new_address(&mut self) -> Address {
        let keypair = KeyPair::generate();
        let address = keypair.address.clone();

        // First address becomes the default
        if self.default_address.is_none() {
            self.default_address = Some(address.clone());
        }

        self.keys.insert(address.clone(), keypair);
        address
    }

    /// Get the key pair for an address
    pub fn get(&self, address: &Address) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    /// The address payments and mining rewards default to
    pub fn default_address(&self) -> Option<&Address> {
        self.default_address.as_ref()
    }

    /// All addresses in the keystore
    pub fn addresses(&self) -> Vec<Address> {
        self.keys.keys().cloned().collect()
    }

    /// Count addresses
    pub fn count(&self) -> usize {
        self.keys.len()
    }
}

impl Default for Keystore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate();

        // Compressed pubkey, 33 bytes hex encoded
        assert_eq!(kp.public_key_hex().len(), 66);
        assert_eq!(kp.address, crypto::derive_address(&kp.public_key.serialize()));
    }

    #[test]
    fn test_keypairs_are_distinct() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_keystore_defaults_to_first_address() {
        let mut ks = Keystore::new();

        assert_eq!(ks.count(), 0);
        assert!(ks.default_address().is_none());

        let addr1 = ks.new_address();
        assert_eq!(ks.count(), 1);
        assert_eq!(ks.default_address(), Some(&addr1));

        let addr2 = ks.new_address();
        assert_eq!(ks.count(), 2);
        assert_eq!(ks.default_address(), Some(&addr1));

        assert!(ks.get(&addr1).is_some());
        assert!(ks.get(&addr2).is_some());
        assert_eq!(ks.addresses().len(), 2);
    }
}
