use once_cell::sync::Lazy;
use std::time::Instant;

/// Process-wide origin of the monotonic time source.
/// All timestamps are nanoseconds elapsed since the first read of this origin.
pub static MONOTONIC_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Current monotonic time in nanoseconds, read straight from the source.
///
/// The origin is created on first use, so the very first read in a process
/// can land on the origin instant itself; 0 is never reported because a zero
/// timestamp means "never stamped" to callers.
#[inline]
pub fn now_nanos() -> u64 {
    (MONOTONIC_START.elapsed().as_nanos() as u64).max(1)
}
