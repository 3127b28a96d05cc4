// Canonical encoding
//
// Every hash and every signature in the system is computed over bytes this
// module produces. Object keys are sorted and output is compact, so the
// same logical value always encodes to the same bytes no matter how it was
// built. Call sites must not serialize for hashing on their own.

use crate::core::{Hash256, hash256, sha256};
use serde::Serialize;

/// Canonical byte form: compact JSON with lexicographically ordered keys
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    // Round-tripping through Value sorts map keys; compact output carries
    // no insignificant whitespace.
    let tree = serde_json::to_value(value).expect("ledger types serialize to JSON");
    serde_json::to_vec(&tree).expect("JSON tree always encodes")
}

/// Double SHA-256 over the canonical form
/// Transaction ids and block hashes both use this.
pub fn canonical_hash<T: Serialize>(value: &T) -> Hash256 {
    hash256(&canonical_bytes(value))
}

/// Single SHA-256 over the canonical form, the digest signatures commit to
pub fn signing_digest<T: Serialize>(value: &T) -> [u8; 32] {
    sha256(&canonical_bytes(value))
}
