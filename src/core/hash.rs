// Hash primitives

use crate::core::Hash256;
use sha2::{Sha256, Digest};

/// SHA256 double hash
/// hash256 = SHA256(SHA256(data))
pub fn hash256(data: &[u8]) -> Hash256 {
    let first_hash = Sha256::digest(data);
    let second_hash = Sha256::digest(&first_hash);
    Hash256::from_slice(&second_hash).expect("SHA256 always returns 32 bytes")
}

/// Single SHA256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// RIPEMD160(SHA256(data)) - used for address derivation
pub fn hash160(data: &[u8]) -> [u8; 20] {
    use ripemd::{Ripemd160, Digest as RipemdDigest};
    let sha = Sha256::digest(data);
    let ripemd = Ripemd160::digest(&sha);
    let mut result = [0u8; 20];
    result.copy_from_slice(&ripemd);
    result
}
