//! Endpoint listen outcomes
//!
//! Every call into the endpoint reports exactly one of these, so the
//! application can account for each byte the line delivered.

use super::machine::EndpointFault;

/// Result of one listen step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointEvent {
    /// Nothing was available on the line
    NoData,
    /// Blocking wait ended without a byte, or a frame stalled
    Timeout,
    /// Byte outside a frame, dropped
    Discarded,
    /// Byte accepted into the current frame
    Receiving,
    /// Frame handled without a reply
    Handled { opcode: u8 },
    /// Frame handled and the reply sent
    Replied { opcode: u8 },
    /// Valid frame addressed to another node
    Ignored,
    /// Frame dropped on checksum mismatch
    ChecksumFailed,
    /// Frame dropped for exceeding the body limit
    BufferExhausted,
    /// Frame dropped for malformed structure
    FramingError,
    /// Line read failed; any partial frame was dropped
    ReceiveError,
    /// Endpoint is latched in an error state; a completed frame was dropped
    /// or nothing arrived before the receive timeout
    Faulted(EndpointFault),
}

impl EndpointEvent {
    /// Check if a whole frame was delivered to this node
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            EndpointEvent::Handled { .. } | EndpointEvent::Replied { .. }
        )
    }

    /// Check if a frame was started and then dropped
    pub fn is_dropped(&self) -> bool {
        matches!(
            self,
            EndpointEvent::ChecksumFailed
                | EndpointEvent::BufferExhausted
                | EndpointEvent::FramingError
                | EndpointEvent::ReceiveError
        )
    }
}
