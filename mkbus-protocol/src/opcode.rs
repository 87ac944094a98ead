//! Operation codes
//!
//! The master never interprets these. An endpoint acts on [`BROADCAST`]
//! and [`RESET`] itself; the rest get their meaning from the request types
//! and endpoint handlers.

/// Read the device description string
pub const INFO: u8 = 0x01;

/// Liveness check
pub const PING: u8 = 10;

/// Answer to [`PING`]
pub const PONG: u8 = 11;

/// Frame meant for every node
///
/// Delivered to every endpoint's handler regardless of the target address.
/// Nobody answers it, since every node would talk at once.
pub const BROADCAST: u8 = 20;

/// Ask a node to restart its protocol state
///
/// The only frame a faulted endpoint still acts on; it clears the latched
/// fault before the handler sees it.
pub const RESET: u8 = 30;

/// Application-defined request
pub const REQUEST: u8 = 100;

/// Application-defined response
pub const RESPOND: u8 = 101;
