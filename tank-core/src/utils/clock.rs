//! Monotonic millisecond time sources for the ramp cadence.
//!
//! The counter is a wrapping `u32`; consumers must compute elapsed time with
//! `wrapping_sub` so a rollover never stalls the ramp.

use embassy_time::Instant;

/// A monotonic millisecond counter that may wrap.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Clock backed by the embassy time driver.
///
/// The 64-bit tick count is truncated, so it wraps every ~49.7 days.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

/// Milliseconds elapsed between two counter readings, tolerant of wraparound.
pub const fn elapsed_ms(
    since: u32,
    now: u32,
) -> u32 {
    now.wrapping_sub(since)
}
