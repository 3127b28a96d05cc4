// Basic types shared across the ledger

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// 256-bit hash (32 bytes)
/// Used for block hashes and transaction ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

/// Failure parsing a hash from its hex form
///
/// `hex::FromHexError` carries no `Eq`, so neither does this enum
#[derive(Debug, Error, PartialEq)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid hash length: expected 32 bytes, got {0}")]
    Length(usize),
}

impl Hash256 {
    /// Create a new Hash256 from a byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a Hash256 from a slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, HashParseError> {
        if slice.len() != 32 {
            return Err(HashParseError::Length(slice.len()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get the hash as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Zero hash: the genesis block's `previous_hash` and the txid slot of
    /// coinbase inputs
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Lowercase hex, most significant byte first
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from 64 hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self, HashParseError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_slice(&bytes)
    }

    /// Number of leading zero hex digits, the proof-of-work measure
    pub fn leading_zero_digits(&self) -> usize {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
                continue;
            }
            if byte >> 4 == 0 {
                count += 1;
            }
            break;
        }
        count
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Hashes travel as hex strings in the canonical encoding, so the serde
// forms must match to_hex/from_hex exactly.
impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hex-encoded `version || hash160 || checksum` address owning an output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Consensus parameters every node on a network must agree on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    /// Leading zero hex digits required of a block hash
    pub difficulty: usize,
    /// Subsidy paid by each block's coinbase, before fees
    pub block_reward: u64,
    /// Outputs granted by the genesis coinbase
    pub genesis_allocations: Vec<(Address, u64)>,
}

impl ChainParams {
    pub fn new(difficulty: usize, block_reward: u64) -> Self {
        Self {
            difficulty,
            block_reward,
            genesis_allocations: Vec::new(),
        }
    }

    /// Add a genesis grant
    pub fn with_allocation(mut self, address: Address, amount: u64) -> Self {
        self.genesis_allocations.push((address, amount));
        self
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::new(3, 50)
    }
}
