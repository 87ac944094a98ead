//! Query outcome reporting
//!
//! A query never fails with an `Err`: every fault is a flag in a
//! [`Status`] bitmask and several can be raised by one exchange. Each
//! fault value has bit 0 set, so the least significant bit is clear
//! exactly when the exchange succeeded.

use core::ops::{BitOr, BitOrAssign};

use crate::frame::Frame;
use crate::profile::{Addressed, Profile};

/// Bitmask of exchange faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    /// Exchange completed without faults
    pub const OK: Status = Status(0);
    /// Node did not answer in time
    pub const TIMEOUT: Status = Status(0b0000_0011);
    /// Answer failed checksum validation
    pub const CRC_FAILED: Status = Status(0b0000_0101);
    /// Answer body exceeded the buffer
    pub const BUFFER_EXHAUSTED: Status = Status(0b0000_1001);
    /// Request was not fully transmitted
    pub const TX_ERROR: Status = Status(0b0001_0001);
    /// Answer was not fully received
    pub const RX_ERROR: Status = Status(0b0010_0001);

    /// Raw bit pattern
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Status from a raw bit pattern
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// True iff no fault flag is raised
    pub const fn is_ok(self) -> bool {
        self.0 & 1 == 0
    }

    /// True if every bit of `flag` is raised
    pub const fn contains(self, flag: Status) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Raise `flag`
    pub fn insert(&mut self, flag: Status) {
        self.0 |= flag.0;
    }
}

impl BitOr for Status {
    type Output = Status;

    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Status) {
        self.0 |= rhs.0;
    }
}

/// Outcome of one request/response exchange
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<P: Profile = Addressed> {
    /// Fault flags
    pub status: Status,
    /// Received frame, kept even when faults were flagged
    pub content: Option<Frame<P>>,
}

impl<P: Profile> QueryResult<P> {
    /// Result with no received frame
    pub fn with_status(status: Status) -> Self {
        Self {
            status,
            content: None,
        }
    }

    /// The node never answered
    pub fn timeout() -> Self {
        Self::with_status(Status::TIMEOUT)
    }

    /// True iff the exchange succeeded
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Received frame, only if the exchange succeeded
    pub fn frame(&self) -> Option<&Frame<P>> {
        if self.is_ok() {
            self.content.as_ref()
        } else {
            None
        }
    }
}
