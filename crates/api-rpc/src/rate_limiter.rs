//! Rate Limiter (Token Bucket Algorithm)
//!
//! Caps how fast the mutating queue methods can be driven. Operator
//! surfaces click in short bursts; the bucket absorbs those while a
//! runaway script hits the ceiling. Atomic CAS keeps the hot path
//! lock-free.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Token bucket over a single packed atomic word.
///
/// Upper 32 bits hold the token count, lower 32 bits the last-refill
/// timestamp in milliseconds since construction. One CAS updates both,
/// so concurrent callers never double-spend a token.
pub struct RateLimiter {
    bucket: Arc<Bucket>,
    max_tokens: u32,
    refill_rate: u32, // tokens per second
}

struct Bucket {
    packed: AtomicU64,
    epoch: Instant,
}

fn pack(tokens: u32, elapsed_ms: u32) -> u64 {
    ((tokens as u64) << 32) | (elapsed_ms as u64)
}

fn unpack(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, (packed & 0xFFFF_FFFF) as u32)
}

impl RateLimiter {
    /// Create a limiter holding `max_tokens` burst capacity, refilled at
    /// `refill_rate` tokens per second.
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            bucket: Arc::new(Bucket {
                packed: AtomicU64::new(pack(max_tokens, 0)),
                epoch: Instant::now(),
            }),
            max_tokens,
            refill_rate,
        }
    }

    /// Try to consume one token.
    ///
    /// Returns false when the bucket is empty; the caller should reject
    /// the request as throttled.
    pub async fn check(&self) -> bool {
        loop {
            let observed = self.bucket.packed.load(Ordering::Acquire);
            let (tokens, last_refill_ms) = unpack(observed);

            let elapsed_ms = self.bucket.epoch.elapsed().as_millis() as u32;
            let delta_ms = elapsed_ms.saturating_sub(last_refill_ms);

            let refilled = (delta_ms as u64 * self.refill_rate as u64) / 1000;
            let available =
                ((tokens as u64 + refilled).min(self.max_tokens as u64)) as u32;

            if available == 0 {
                // Empty; still advance the refill clock so the drought
                // is measured from now
                let _ = self.bucket.packed.compare_exchange(
                    observed,
                    pack(0, elapsed_ms),
                    Ordering::Release,
                    Ordering::Acquire,
                );
                return false;
            }

            match self.bucket.packed.compare_exchange(
                observed,
                pack(available - 1, elapsed_ms),
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(_) => continue, // Raced with another caller, retry
            }
        }
    }
}
