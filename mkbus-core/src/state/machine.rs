//! Role state definitions
//!
//! A master and an endpoint each move through a small, explicit set of
//! states. Neither is ever left in a transient state between calls.

use mkbus_protocol::ParseState;

/// Master exchange progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterState {
    /// Line not yet configured
    Setup,
    /// Ready for a request
    Idle,
    /// Writing to the line
    Transmitting,
    /// Waiting for the start of an answer
    AwaitingResponse,
    /// Reading the answer
    Receiving,
    /// Validating the answer
    Processing,
}

impl MasterState {
    /// Check if a new request may start
    pub fn is_idle(&self) -> bool {
        matches!(self, MasterState::Idle)
    }

    /// Check if an exchange is underway
    pub fn is_busy(&self) -> bool {
        !matches!(self, MasterState::Setup | MasterState::Idle)
    }
}

/// Reasons an endpoint stops serving the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointFault {
    /// A reply could not be fully written
    TransmitFailed,
    /// Taken off the bus by the application
    Halted,
}

/// Endpoint receive/dispatch progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointState {
    /// Waiting for a start byte
    Idle,
    /// Start byte seen, reading the header
    ReceivingHeader,
    /// Header complete, reading body and checksum
    ReceivingBody,
    /// Handler is processing a frame
    Busy,
    /// Writing a reply
    Transmitting,
    /// Latched fault; cleared only by an explicit reset
    Error(EndpointFault),
}

impl EndpointState {
    /// Check if this is an error state
    pub fn is_error(&self) -> bool {
        matches!(self, EndpointState::Error(_))
    }

    /// Check if a frame is partially received
    pub fn is_receiving(&self) -> bool {
        matches!(
            self,
            EndpointState::ReceivingHeader | EndpointState::ReceivingBody
        )
    }
}

impl From<ParseState> for EndpointState {
    fn from(state: ParseState) -> Self {
        match state {
            ParseState::WaitingForStart => EndpointState::Idle,
            ParseState::ReadingHeader => EndpointState::ReceivingHeader,
            ParseState::ReadingBody => EndpointState::ReceivingBody,
        }
    }
}
