//! Frame headers
//!
//! A header has a fixed size per profile so receivers can read it before
//! the body. Headers are always copied field by field in and out of byte
//! buffers; nothing is reinterpreted in place.
//!
//! Compact layout (3 bytes):
//! ```text
//! ┌──────┬──────┬──────┐
//! │ CODE │ FROM │  TO  │
//! │ 1B   │ 1B   │ 1B   │
//! └──────┴──────┴──────┘
//! ```
//!
//! Addressed layout (7 bytes):
//! ```text
//! ┌─────────┬────────┬──────────────────┐
//! │ ADDRESS │ OPCODE │ BODY_LEN (BE)    │
//! │ 2B      │ 1B     │ 4B               │
//! └─────────┴────────┴──────────────────┘
//! ```

use crate::frame::FrameError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Width of an addressed-profile node address
pub const ADDR_LEN: usize = 2;

/// Largest header of any profile
pub const MAX_HEADER_LEN: usize = 8;

/// Node address on an addressed-profile bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusAddress(pub [u8; ADDR_LEN]);

impl BusAddress {
    /// Create an address from its bytes
    pub const fn new(bytes: [u8; ADDR_LEN]) -> Self {
        Self(bytes)
    }

    /// Address bytes in wire order
    pub const fn as_bytes(&self) -> &[u8; ADDR_LEN] {
        &self.0
    }
}

impl From<[u8; ADDR_LEN]> for BusAddress {
    fn from(bytes: [u8; ADDR_LEN]) -> Self {
        Self(bytes)
    }
}

/// Fixed-size frame header
pub trait Header: Clone + core::fmt::Debug + PartialEq {
    /// Node address type carried by this header
    type Address: Copy + PartialEq + core::fmt::Debug;

    /// Encoded size in bytes
    const LEN: usize;

    /// Header for a request sent to `target`
    fn request(opcode: u8, target: Self::Address) -> Self;

    /// Header for the answer to this frame, sent by `responder`
    fn reply(&self, opcode: u8, responder: Self::Address) -> Self;

    /// Operation code
    fn opcode(&self) -> u8;

    /// Node the frame is addressed to
    fn target(&self) -> Self::Address;

    /// Record the sending node, where the layout has room for it
    fn set_source(&mut self, source: Self::Address);

    /// Body length declared by the header, if the layout carries one
    fn body_len(&self) -> Option<usize>;

    /// Record the body length, where the layout has room for it
    fn set_body_len(&mut self, len: usize);

    /// Write the header into `out`, returning [`Self::LEN`]
    fn encode(&self, out: &mut [u8; MAX_HEADER_LEN]) -> usize;

    /// Read a header from the first [`Self::LEN`] bytes of `bytes`
    fn decode(bytes: &[u8]) -> Result<Self, FrameError>;
}

/// Header of the compact profile: one-byte code and node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompactHeader {
    /// Operation code
    pub code: u8,
    /// Sending node
    pub from: u8,
    /// Receiving node
    pub to: u8,
}

impl Header for CompactHeader {
    type Address = u8;

    const LEN: usize = 3;

    fn request(opcode: u8, target: u8) -> Self {
        Self {
            code: opcode,
            from: 0,
            to: target,
        }
    }

    fn reply(&self, opcode: u8, responder: u8) -> Self {
        Self {
            code: opcode,
            from: responder,
            to: self.from,
        }
    }

    fn opcode(&self) -> u8 {
        self.code
    }

    fn target(&self) -> u8 {
        self.to
    }

    fn set_source(&mut self, source: u8) {
        self.from = source;
    }

    fn body_len(&self) -> Option<usize> {
        None
    }

    fn set_body_len(&mut self, _len: usize) {}

    fn encode(&self, out: &mut [u8; MAX_HEADER_LEN]) -> usize {
        out[0] = self.code;
        out[1] = self.from;
        out[2] = self.to;
        Self::LEN
    }

    fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        match bytes {
            [code, from, to, ..] => Ok(Self {
                code: *code,
                from: *from,
                to: *to,
            }),
            _ => Err(FrameError::Incomplete),
        }
    }
}

/// Header of the addressed profile: bus address, opcode, body length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressedHeader {
    /// Target of a request, or the responder of a reply
    pub address: BusAddress,
    /// Operation code
    pub opcode: u8,
    /// Number of body bytes that follow the header
    pub body_len: u32,
}

impl AddressedHeader {
    /// Create a header with an empty body
    pub const fn new(address: BusAddress, opcode: u8) -> Self {
        Self {
            address,
            opcode,
            body_len: 0,
        }
    }
}

impl Header for AddressedHeader {
    type Address = BusAddress;

    const LEN: usize = ADDR_LEN + 5;

    fn request(opcode: u8, target: BusAddress) -> Self {
        Self::new(target, opcode)
    }

    fn reply(&self, opcode: u8, responder: BusAddress) -> Self {
        Self::new(responder, opcode)
    }

    fn opcode(&self) -> u8 {
        self.opcode
    }

    fn target(&self) -> BusAddress {
        self.address
    }

    // The requester is implied by the single-master bus
    fn set_source(&mut self, _source: BusAddress) {}

    fn body_len(&self) -> Option<usize> {
        Some(self.body_len as usize)
    }

    fn set_body_len(&mut self, len: usize) {
        self.body_len = u32::try_from(len).unwrap_or(u32::MAX);
    }

    fn encode(&self, out: &mut [u8; MAX_HEADER_LEN]) -> usize {
        out[..ADDR_LEN].copy_from_slice(&self.address.0);
        out[ADDR_LEN] = self.opcode;
        out[ADDR_LEN + 1..Self::LEN].copy_from_slice(&self.body_len.to_be_bytes());
        Self::LEN
    }

    fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < Self::LEN {
            return Err(FrameError::Incomplete);
        }
        let mut address = [0u8; ADDR_LEN];
        address.copy_from_slice(&bytes[..ADDR_LEN]);
        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[ADDR_LEN + 1..Self::LEN]);

        Ok(Self {
            address: BusAddress(address),
            opcode: bytes[ADDR_LEN],
            body_len: u32::from_be_bytes(len),
        })
    }
}
