//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay to wait after failed attempt `attempt` (0-based) before the next one.
///
/// `base_ms * 2^attempt`, capped at `max_ms`, plus 0-10% jitter on top.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b0 = calculate_backoff(0, 100, 30_000);
        assert!(b0.as_millis() >= 100 && b0.as_millis() < 110);

        let b1 = calculate_backoff(1, 100, 30_000);
        assert!(b1.as_millis() >= 200 && b1.as_millis() < 220);

        let b2 = calculate_backoff(2, 100, 30_000);
        assert!(b2.as_millis() >= 400 && b2.as_millis() < 440);
    }

    #[test]
    fn test_backoff_cap() {
        let capped = calculate_backoff(10, 100, 1000);
        assert!(capped.as_millis() >= 1000 && capped.as_millis() < 1100);

        let huge = calculate_backoff(200, u64::MAX / 2, u64::MAX / 4);
        assert!(huge.as_millis() >= (u64::MAX / 4) as u128);
    }
}
