//! Helpers for the sleep-with-jitter backoff used between no-data ticks.

use std::time::Duration;

use rand::Rng;

/// Returns `base` plus a uniformly random extra delay in `[0, base)`, so
/// iterations polling the same source table on the same interval don't
/// all wake up in lockstep.
pub fn jittered_backoff(base: Duration, rng: &mut impl Rng) -> Duration {
    if base.is_zero() {
        return base;
    }
    let jitter_fraction: f64 = rng.random_range(0.0..1.0);
    base + base.mul_f64(jitter_fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn jitter_stays_within_one_to_two_times_base() {
        let mut rng = SmallRng::seed_from_u64(42);
        let base = Duration::from_secs(5);
        for _ in 0..1000 {
            let got = jittered_backoff(base, &mut rng);
            assert!(got >= base);
            assert!(got < base * 2);
        }
    }

    #[test]
    fn zero_base_has_no_jitter() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(jittered_backoff(Duration::ZERO, &mut rng), Duration::ZERO);
    }
}
