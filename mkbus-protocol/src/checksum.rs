//! Incremental frame checksums
//!
//! Both algorithms are plain MSB-first CRCs with a zero seed, no input or
//! output reflection and no final xor. That makes them *neutral*: running
//! the CRC over a message followed by its own CRC (big-endian) yields zero,
//! so a receiver validates a frame by feeding every byte, checksum
//! included, and testing for zero.

/// CRC-8 generator polynomial (x^8 + x^2 + x + 1)
pub const CRC8_POLY: u8 = 0x07;

/// CRC-16 generator polynomial (x^16 + x^15 + x^2 + 1)
pub const CRC16_POLY: u16 = 0x8005;

/// Widest checksum any profile uses
pub const MAX_CHECKSUM_LEN: usize = 2;

/// CRC-8 over `data`, continuing from `seed`
pub fn crc8(data: &[u8], seed: u8) -> u8 {
    let mut crc = seed;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// CRC-16 over `data`, continuing from `seed`
pub fn crc16(data: &[u8], seed: u16) -> u16 {
    let mut crc = seed;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Checksum algorithm and width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumKind {
    /// One byte, [`crc8`]
    Crc8,
    /// Two bytes big-endian, [`crc16`]
    Crc16,
}

impl ChecksumKind {
    /// Number of checksum bytes on the wire
    pub const fn width(self) -> usize {
        match self {
            ChecksumKind::Crc8 => 1,
            ChecksumKind::Crc16 => 2,
        }
    }

    /// Continue a running checksum over `data`
    pub fn compute(self, data: &[u8], seed: u16) -> u16 {
        match self {
            ChecksumKind::Crc8 => crc8(data, seed as u8) as u16,
            ChecksumKind::Crc16 => crc16(data, seed),
        }
    }

    /// Wire bytes for a checksum value
    ///
    /// Only the first [`width`](Self::width) bytes are meaningful.
    pub fn to_bytes(self, value: u16) -> [u8; MAX_CHECKSUM_LEN] {
        match self {
            ChecksumKind::Crc8 => [value as u8, 0],
            ChecksumKind::Crc16 => value.to_be_bytes(),
        }
    }

    /// Checksum value from its wire bytes
    ///
    /// Returns 0 when fewer than [`width`](Self::width) bytes are given.
    pub fn from_bytes(self, bytes: &[u8]) -> u16 {
        match (self, bytes) {
            (ChecksumKind::Crc8, [b, ..]) => *b as u16,
            (ChecksumKind::Crc16, [hi, lo, ..]) => u16::from_be_bytes([*hi, *lo]),
            _ => 0,
        }
    }
}

/// Running checksum fed one byte or slice at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Checksum {
    kind: ChecksumKind,
    value: u16,
}

impl Checksum {
    /// Start a fresh checksum
    pub const fn new(kind: ChecksumKind) -> Self {
        Self { kind, value: 0 }
    }

    /// Restart from zero
    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// Feed one byte
    pub fn push(&mut self, byte: u8) {
        self.update(&[byte]);
    }

    /// Feed a slice
    pub fn update(&mut self, data: &[u8]) {
        self.value = self.kind.compute(data, self.value);
    }

    /// Current value
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Algorithm in use
    pub fn kind(&self) -> ChecksumKind {
        self.kind
    }

    /// True once message and checksum bytes have cancelled out
    pub fn is_neutral(&self) -> bool {
        self.value == 0
    }
}
