// Crypto adapter
//
// The only place signing, verification, and address derivation happen.
// Validators and wallets call through here rather than touching secp256k1
// or the digest stack directly, so the signer and verifier can never
// disagree about formats.

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use crate::core::{Address, hash160, hash256};

/// Version byte prepended to the public key hash
pub const ADDRESS_VERSION: u8 = 0x00;

/// Derive the address owned by a public key
///
/// `hex(version || ripemd160(sha256(key)) || checksum)` where the checksum
/// is the first four bytes of a double SHA-256 over the versioned hash.
/// Pure: any holder of the key can recompute the address.
pub fn derive_address(public_key_bytes: &[u8]) -> Address {
    let key_hash = hash160(public_key_bytes);

    let mut payload = Vec::with_capacity(25);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(&key_hash);

    let checksum = hash256(&payload);
    payload.extend_from_slice(&checksum.as_bytes()[..4]);

    Address(hex::encode(payload))
}

/// Sign a 32-byte digest, returning the DER signature as hex
pub fn sign(secret_key: &SecretKey, digest: &[u8; 32]) -> String {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest);
    let signature = secp.sign_ecdsa(&message, secret_key);
    hex::encode(signature.serialize_der())
}

/// Verify a hex DER signature by a hex compressed public key over a digest
///
/// Fails closed: malformed hex, bad curve points, and undecodable
/// signatures all return false rather than erroring out of a validator.
pub fn verify(public_key_hex: &str, signature_hex: &str, digest: &[u8; 32]) -> bool {
    let Ok(key_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_slice(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_der(&sig_bytes) else {
        return false;
    };

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest);
    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}
