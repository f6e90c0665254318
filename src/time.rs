//! Wrap-safe monotonic millisecond arithmetic.
//!
//! The controller never reads a clock itself.  Callers hand in a `u32`
//! millisecond counter that wraps after ~49.7 days, the same shape as an
//! MCU `millis()` tick.  Every interval comparison in the crate goes
//! through these helpers so wraparound never yields a negative or
//! oversized elapsed time.
//!
//! Intervals are only meaningful below [`MAX_INTERVAL_MS`]; anything
//! longer is indistinguishable from a timestamp in the future.

/// Longest interval that still compares unambiguously across a wrap.
pub const MAX_INTERVAL_MS: u32 = i32::MAX as u32;

/// Milliseconds elapsed from `since` to `now`, modulo 2^32.
#[inline]
pub const fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// True once at least `interval` ms have passed since `since`.
#[inline]
pub const fn has_elapsed(now: u32, since: u32, interval: u32) -> bool {
    elapsed_ms(now, since) >= interval
}
