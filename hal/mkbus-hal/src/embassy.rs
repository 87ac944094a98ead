//! Clock backed by the embassy time driver

use embassy_time::Instant;

use crate::time::Clock;

/// Millisecond clock reading `embassy_time::Instant`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&mut self) -> u32 {
        // Truncation gives the wrapping tick `Deadline` expects
        Instant::now().as_millis() as u32
    }
}
