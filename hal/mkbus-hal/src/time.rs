//! Millisecond time source
//!
//! Every wait on the bus is a poll loop that re-reads the clock on each
//! iteration. Tick values wrap around; elapsed time is always computed with
//! wrapping subtraction so a wrap during a wait is harmless.

/// Monotonic millisecond counter
pub trait Clock {
    /// Milliseconds since an arbitrary epoch, wrapping at `u32::MAX`
    fn now_ms(&mut self) -> u32;
}

/// A started timeout window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    start_ms: u32,
    timeout_ms: u32,
}

impl Deadline {
    /// Open a window of `timeout_ms` starting now
    pub fn start<C: Clock>(clock: &mut C, timeout_ms: u32) -> Self {
        Self {
            start_ms: clock.now_ms(),
            timeout_ms,
        }
    }

    /// Milliseconds since the window opened
    pub fn elapsed<C: Clock>(&self, clock: &mut C) -> u32 {
        clock.now_ms().wrapping_sub(self.start_ms)
    }

    /// Check whether the window has closed
    pub fn is_expired<C: Clock>(&self, clock: &mut C) -> bool {
        self.elapsed(clock) >= self.timeout_ms
    }

    /// Length of the window
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}
