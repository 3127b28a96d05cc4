// Proof of work over canonical header hashes
//
// Difficulty counts leading zero hex digits of the block hash, so each
// extra unit multiplies the expected search by sixteen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::core::{BlockHeader, Hash256};

/// Check whether a hash carries enough leading zero digits
pub fn meets_difficulty(hash: &Hash256, difficulty: usize) -> bool {
    hash.leading_zero_digits() >= difficulty
}

/// Search nonces until the header hash meets the difficulty.
///
/// Walks nonces from zero, recomputing the canonical hash each step, and
/// returns the header with hash and nonce filled in. The `abort` flag is
/// polled every attempt; once raised the search stops and returns None so
/// the caller can rebase onto a newer tip.
pub fn mine(mut header: BlockHeader, difficulty: usize, abort: &AtomicBool) -> Option<BlockHeader> {
    let start = Instant::now();
    let mut attempts = 0u64;
    let mut nonce = 0u64;

    loop {
        if abort.load(Ordering::Relaxed) {
            log::debug!(
                "mining height {} aborted after {} attempts",
                header.height,
                attempts
            );
            return None;
        }

        header.nonce = nonce;
        let hash = header.compute_hash();
        attempts += 1;

        if meets_difficulty(&hash, difficulty) {
            header.hash = hash;
            let elapsed = start.elapsed();
            log::info!(
                "mined height {} in {} attempts ({:.1} KH/s): {}",
                header.height,
                attempts,
                attempts as f64 / elapsed.as_secs_f64() / 1000.0,
                header.hash
            );
            return Some(header);
        }

        // Progress indicator every 100k attempts
        if attempts % 100_000 == 0 {
            log::debug!(
                "mining height {}: {} attempts ({:.1} KH/s)",
                header.height,
                attempts,
                attempts as f64 / start.elapsed().as_secs_f64() / 1000.0
            );
        }

        nonce = nonce.wrapping_add(1);
    }
}

/// Verify that a sealed header carries its own hash and meets the difficulty
pub fn verify(header: &BlockHeader, difficulty: usize) -> bool {
    header.hash == header.compute_hash() && meets_difficulty(&header.hash, difficulty)
}
