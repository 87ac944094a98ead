//! Deployment profiles
//!
//! A profile pairs one header layout with one checksum width. Master and
//! endpoints on a bus must agree on a single profile; the two are never
//! mixed on the same line.

use crate::checksum::ChecksumKind;
use crate::header::{AddressedHeader, CompactHeader, Header};

/// Header layout and checksum selection
pub trait Profile {
    /// Header layout
    type Header: Header;

    /// Checksum algorithm
    const CHECKSUM: ChecksumKind;
}

/// Node address type of a profile
pub type AddressOf<P> = <<P as Profile>::Header as Header>::Address;

/// One-byte code/from/to header, CRC-8, body delimited by the end byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Compact;

impl Profile for Compact {
    type Header = CompactHeader;
    const CHECKSUM: ChecksumKind = ChecksumKind::Crc8;
}

/// Two-byte address/opcode/length header, CRC-16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Addressed;

impl Profile for Addressed {
    type Header = AddressedHeader;
    const CHECKSUM: ChecksumKind = ChecksumKind::Crc16;
}
