//! Jittered exponential backoff for stream reconnection.
//!
//! The schedule approximates 1s, 2s, 4s, 8s, 16s, then caps at 30s. Each
//! delay is randomized by ±25% so a fleet of dashboard sessions dropped by
//! the same outage does not reconnect in lockstep.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Ceiling for the exponential schedule, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

/// Compute the delay before retry number `attempt` (zero-indexed).
///
/// `min(base * 2^attempt, ceiling)`, scaled by a uniform factor in
/// `[0.75, 1.25]`. Pure apart from the jitter draw; the caller owns the
/// timer and its cancellation.
pub fn reconnect_delay(policy: &ReconnectPolicy, attempt: u32) -> Duration {
    let exp = 2f64.powi(attempt.min(30) as i32);
    let capped = (policy.base_delay_ms as f64 * exp).min(policy.max_delay_ms as f64);
    let jitter = rand::thread_rng().gen_range(0.75..=1.25);
    Duration::from_millis((capped * jitter).round() as u64)
}
