//! mkbus Frame Codec
//!
//! This crate defines the wire format of mkbus, a request/response bus for
//! microcontrollers sharing one half-duplex serial line. A master sends an
//! addressed request frame and waits a bounded time for the answer.
//!
//! # Protocol Overview
//!
//! All messages use a simple delimited frame:
//! ```text
//! ┌───────┬────────────┬─────────────┬──────────┬─────┐
//! │ START │ HEADER     │ BODY        │ CHECKSUM │ END │
//! │ ':'   │ 3B or 7B   │ 0–128B      │ 1B or 2B │ \n  │
//! └───────┴────────────┴─────────────┴──────────┴─────┘
//! ```
//!
//! Header layout and checksum width depend on the [`Profile`]:
//! [`Compact`] (code/from/to, CRC-8) or [`Addressed`] (address/opcode/length,
//! CRC-16). The checksum covers header and body and is *neutral*: running
//! it over the whole frame interior yields zero for an intact frame.

#![no_std]
#![deny(unsafe_code)]

pub mod checksum;
pub mod frame;
pub mod header;
pub mod opcode;
pub mod profile;
pub mod status;

pub use checksum::{crc16, crc8, Checksum, ChecksumKind};
pub use frame::{
    Body, Frame, FrameError, FrameParser, ParseState, FRAME_END, FRAME_START, GUARD_BYTE,
    GUARD_LEN, MAX_BODY_SIZE, MAX_FRAME_SIZE,
};
pub use header::{AddressedHeader, BusAddress, CompactHeader, Header, ADDR_LEN, MAX_HEADER_LEN};
pub use profile::{Addressed, AddressOf, Compact, Profile};
pub use status::{QueryResult, Status};
