use std::str::FromStr;

use crate::error::ClockError;
use crate::time::now_nanos;

/// Which time source backs a [`Clock`].
///
/// Only the monotonic source exists; wall-clock kinds are unrepresentable so
/// a deadline can never jump backward under an NTP adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    Monotonic,
}

impl FromStr for ClockKind {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monotonic" => Ok(ClockKind::Monotonic),
            other => Err(ClockError::InvalidArgument(format!(
                "unknown clock kind: {}",
                other
            ))),
        }
    }
}

/// A cached monotonic timestamp plus a refresh counter.
///
/// A scheduler calls [`Clock::refresh`] once per loop iteration or batch,
/// then performs many cheap expiry checks against the cached value instead of
/// paying a system call per comparison. The generation counter identifies
/// which refresh a derived deadline was computed against.
///
/// No internal synchronization: one clock per scheduler thread.
#[derive(Debug, Clone)]
pub struct Clock {
    cached_ns: u64,
    generation: u64,
}

impl Clock {
    /// Creates a clock backed by `kind` and primes the cache, so a fresh
    /// clock is never observed with a zero timestamp or generation 0.
    pub fn new(kind: ClockKind) -> Self {
        let mut clock = match kind {
            ClockKind::Monotonic => Clock {
                cached_ns: 0,
                generation: 0,
            },
        };
        clock.refresh();
        tracing::debug!(cached_ns = clock.cached_ns, "monotonic clock primed");
        clock
    }

    /// Re-reads the time source, stores the result and bumps the generation.
    /// Returns the new cached value.
    ///
    /// This is the single system-call boundary; every other operation reads
    /// the cache or does pure arithmetic.
    #[inline]
    pub fn refresh(&mut self) -> u64 {
        self.cached_ns = now_nanos();
        self.generation += 1;
        self.cached_ns
    }

    /// Number of refreshes performed so far, usable as a staleness token.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cached timestamp in nanoseconds. No side effect.
    #[inline]
    pub fn cached_ns(&self) -> u64 {
        self.cached_ns
    }

    /// Cached timestamp in seconds, for display. Not precise enough for
    /// comparisons; compare against [`Clock::cached_ns`] instead.
    #[inline]
    pub fn cached_seconds(&self) -> f64 {
        self.cached_ns as f64 / 1e9
    }

    /// Reads the time source directly, bypassing the cache. Diagnostics
    /// only; the hot path compares against the cached value.
    #[inline]
    pub fn raw_now_ns(&self) -> u64 {
        now_nanos()
    }

    /// Absolute deadline `seconds` after the cached timestamp.
    ///
    /// Fractional nanoseconds are truncated, never rounded. A negative
    /// horizon moves the deadline earlier, saturating at 0. NaN and
    /// non-finite horizons are rejected.
    pub fn deadline_after(&self, seconds: f64) -> Result<u64, ClockError> {
        if !seconds.is_finite() {
            return Err(ClockError::InvalidArgument(format!(
                "deadline horizon must be a finite number of seconds, got {}",
                seconds
            )));
        }
        let delta_ns = (seconds * 1e9) as i64;
        Ok(self.cached_ns.saturating_add_signed(delta_ns))
    }

    /// Absolute deadline `ms` milliseconds after the cached timestamp.
    #[inline]
    pub fn deadline_after_ms(&self, ms: u64) -> u64 {
        self.cached_ns.saturating_add(ms.saturating_mul(1_000_000))
    }

    /// Absolute deadline `us` microseconds after the cached timestamp.
    #[inline]
    pub fn deadline_after_us(&self, us: u64) -> u64 {
        self.cached_ns.saturating_add(us.saturating_mul(1_000))
    }

    /// Absolute deadline `delta_ns` nanoseconds after the cached timestamp.
    #[inline]
    pub fn deadline_in_ns(&self, delta_ns: u64) -> u64 {
        self.cached_ns.saturating_add(delta_ns)
    }

    /// True once `deadline_ns` is at or before the cached timestamp.
    #[inline]
    pub fn is_expired(&self, deadline_ns: u64) -> bool {
        deadline_ns <= self.cached_ns
    }

    /// Nanoseconds until `deadline_ns`, or 0 if it has already expired.
    #[inline]
    pub fn remaining_ns(&self, deadline_ns: u64) -> u64 {
        deadline_ns.saturating_sub(self.cached_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A clock pinned at a known cached timestamp, for deterministic
    /// arithmetic checks.
    fn at(cached_ns: u64) -> Clock {
        Clock {
            cached_ns,
            generation: 1,
        }
    }

    #[test]
    fn test_new_primes_cache() {
        let clock = Clock::new(ClockKind::Monotonic);
        assert_eq!(clock.generation(), 1);
        assert!(clock.cached_ns() > 0);
    }

    #[test]
    fn test_refresh_increments_generation_and_returns_cache() {
        let mut clock = Clock::new(ClockKind::Monotonic);
        let before = clock.generation();
        let returned = clock.refresh();
        assert_eq!(clock.generation(), before + 1);
        assert_eq!(returned, clock.cached_ns());
    }

    #[test]
    fn test_refresh_never_goes_backward() {
        let mut clock = Clock::new(ClockKind::Monotonic);
        let mut prev = clock.cached_ns();
        for _ in 0..1_000 {
            let next = clock.refresh();
            assert!(next >= prev);
            prev = next;
        }
    }

    #[test]
    fn test_reads_do_not_touch_cache() {
        let clock = Clock::new(ClockKind::Monotonic);
        let snapshot = clock.cached_ns();
        let _ = clock.raw_now_ns();
        let _ = clock.cached_seconds();
        assert_eq!(clock.cached_ns(), snapshot);
        assert_eq!(clock.generation(), 1);
    }

    #[test]
    fn test_expiry_boundary() {
        let clock = at(1_000_000_000);
        assert_eq!(clock.deadline_after_ms(50), 1_050_000_000);

        let just_before = at(1_049_999_999);
        assert!(!just_before.is_expired(1_050_000_000));

        let exact = at(1_050_000_000);
        assert!(exact.is_expired(1_050_000_000));
    }

    #[test]
    fn test_remaining_clamps_to_zero() {
        let clock = at(1_000_000_000);
        assert_eq!(clock.remaining_ns(1_000_000_500), 500);
        assert_eq!(clock.remaining_ns(1_000_000_000), 0);
        assert_eq!(clock.remaining_ns(999_999_999), 0);
    }

    #[test]
    fn test_deadline_units_agree() {
        let clock = at(7_777);
        assert_eq!(clock.deadline_after_ms(50), clock.deadline_in_ns(50_000_000));
        assert_eq!(clock.deadline_after_us(50), clock.deadline_in_ns(50_000));
    }

    #[test]
    fn test_deadline_after_truncates() {
        let clock = at(1_000_000_000);
        assert_eq!(clock.deadline_after(0.05).unwrap(), 1_050_000_000);
        // 1.9ns truncates to 1, never rounds to 2
        assert_eq!(clock.deadline_after(0.0000000019).unwrap(), 1_000_000_001);
        assert_eq!(clock.deadline_after(0.0).unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_negative_horizon_moves_deadline_earlier() {
        let clock = at(2_000_000_000);
        assert_eq!(clock.deadline_after(-0.5).unwrap(), 1_500_000_000);
        assert_eq!(clock.deadline_after(-5.0).unwrap(), 0);
    }

    #[test]
    fn test_non_finite_horizon_rejected() {
        let clock = at(1);
        assert!(matches!(
            clock.deadline_after(f64::NAN),
            Err(ClockError::InvalidArgument(_))
        ));
        assert!(clock.deadline_after(f64::INFINITY).is_err());
        assert!(clock.deadline_after(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_clock_kind_parsing() {
        assert_eq!(
            "monotonic".parse::<ClockKind>().unwrap(),
            ClockKind::Monotonic
        );
        assert!(matches!(
            "realtime".parse::<ClockKind>(),
            Err(ClockError::InvalidArgument(_))
        ));
        assert!("Monotonic".parse::<ClockKind>().is_err());
    }
}
