//! Frame encoding and decoding for the mkbus protocol.
//!
//! Frame format:
//! - START (1 byte): `':'` synchronization byte
//! - HEADER (profile-sized): see [`crate::header`]
//! - BODY (0-128 bytes): request or response data
//! - CHECKSUM (1 or 2 bytes): CRC over HEADER and BODY, big-endian
//! - END (1 byte): `'\n'`
//!
//! There is no escaping. In the compact profile the body length is not on
//! the wire, so a body or checksum byte equal to END cuts the frame short
//! and shows up as a checksum failure. Length-carrying profiles locate END
//! by count and accept any body byte.

use heapless::Vec;

use crate::checksum::{Checksum, MAX_CHECKSUM_LEN};
use crate::header::{Header, MAX_HEADER_LEN};
use crate::profile::{Addressed, Profile};

/// Frame synchronization byte
pub const FRAME_START: u8 = b':';

/// Frame terminator
pub const FRAME_END: u8 = b'\n';

/// Filler sent before a frame while the line settles
pub const GUARD_BYTE: u8 = 0x00;

/// Default length of the guard run
pub const GUARD_LEN: usize = 4;

/// Maximum body size in bytes
pub const MAX_BODY_SIZE: usize = 128;

/// Maximum complete frame size (START + HEADER + BODY + CHECKSUM + END)
pub const MAX_FRAME_SIZE: usize = 1 + MAX_HEADER_LEN + MAX_BODY_SIZE + MAX_CHECKSUM_LEN + 1;

/// Receive buffer size: body plus trailing checksum
pub const RX_BUFFER_SIZE: usize = MAX_BODY_SIZE + MAX_CHECKSUM_LEN;

/// Frame body storage
pub type Body = Vec<u8, MAX_BODY_SIZE>;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Body exceeds the allowed size
    BodyTooLarge,
    /// Checksum did not cancel out
    InvalidChecksum,
    /// Frame is incomplete (need more bytes)
    Incomplete,
    /// Invalid frame structure
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Header length field disagrees with the body
    LengthMismatch,
    /// Body or checksum holds END where no length field tells it apart
    EndInPayload,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<P: Profile = Addressed> {
    /// Frame header
    pub header: P::Header,
    /// Body data
    pub body: Body,
    /// Checksum as computed (outgoing) or as received (incoming)
    pub checksum: u16,
}

impl<P: Profile> Frame<P> {
    /// Create a frame, filling in the header's body length
    pub fn new(mut header: P::Header, body: &[u8]) -> Result<Self, FrameError> {
        if body.len() > MAX_BODY_SIZE {
            return Err(FrameError::BodyTooLarge);
        }

        let mut body_vec = Vec::new();
        body_vec
            .extend_from_slice(body)
            .map_err(|_| FrameError::BodyTooLarge)?;

        header.set_body_len(body.len());
        let checksum = Self::compute_checksum(&header, body);

        Ok(Self {
            header,
            body: body_vec,
            checksum,
        })
    }

    /// Create a frame with no body
    pub fn empty(mut header: P::Header) -> Self {
        header.set_body_len(0);
        let checksum = Self::compute_checksum(&header, &[]);
        Self {
            header,
            body: Vec::new(),
            checksum,
        }
    }

    /// Checksum over the encoded header followed by the body
    pub fn compute_checksum(header: &P::Header, body: &[u8]) -> u16 {
        let mut head = [0u8; MAX_HEADER_LEN];
        let head_len = header.encode(&mut head);

        let mut running = Checksum::new(P::CHECKSUM);
        running.update(&head[..head_len]);
        running.update(body);
        running.value()
    }

    /// Operation code from the header
    pub fn opcode(&self) -> u8 {
        self.header.opcode()
    }

    /// Body as UTF-8 text, if it is valid
    pub fn body_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.body).ok()
    }

    /// Check that END can only be read as the terminator
    ///
    /// Profiles without a length field end the frame at the first END
    /// byte, so neither the body nor the checksum may contain one.
    pub fn end_is_unambiguous(header: &P::Header, body: &[u8], checksum: &[u8]) -> bool {
        header.body_len().is_some() || !body.iter().chain(checksum).any(|&b| b == FRAME_END)
    }

    /// Number of bytes [`encode`](Self::encode) produces
    pub fn encoded_len(&self) -> usize {
        1 + <P::Header as Header>::LEN + self.body.len() + P::CHECKSUM.width() + 1
    }

    /// Encode this frame into a byte buffer
    ///
    /// The checksum is recomputed from the current header and body.
    /// Returns the number of bytes written, or
    /// [`FrameError::EndInPayload`] for a frame no receiver could delimit.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        if let Some(declared) = self.header.body_len() {
            if declared != self.body.len() {
                return Err(FrameError::LengthMismatch);
            }
        }

        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let mut head = [0u8; MAX_HEADER_LEN];
        let head_len = self.header.encode(&mut head);
        let width = P::CHECKSUM.width();
        let checksum = P::CHECKSUM.to_bytes(Self::compute_checksum(&self.header, &self.body));
        if !Self::end_is_unambiguous(&self.header, &self.body, &checksum[..width]) {
            return Err(FrameError::EndInPayload);
        }

        let body_start = 1 + head_len;
        let crc_start = body_start + self.body.len();

        buffer[0] = FRAME_START;
        buffer[1..body_start].copy_from_slice(&head[..head_len]);
        buffer[body_start..crc_start].copy_from_slice(&self.body);
        buffer[crc_start..crc_start + width].copy_from_slice(&checksum[..width]);
        buffer[crc_start + width] = FRAME_END;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Validate and decode one complete frame, delimiters included
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let head_len = <P::Header as Header>::LEN;
        let width = P::CHECKSUM.width();

        if bytes.len() < 1 + head_len + width + 1 {
            return Err(FrameError::Incomplete);
        }

        let inner = match bytes {
            [FRAME_START, inner @ .., FRAME_END] => inner,
            _ => return Err(FrameError::InvalidFrame),
        };

        let mut running = Checksum::new(P::CHECKSUM);
        running.update(inner);
        if !running.is_neutral() {
            return Err(FrameError::InvalidChecksum);
        }

        let header = <P::Header as Header>::decode(&inner[..head_len])?;
        let (body, crc) = inner[head_len..].split_at(inner.len() - head_len - width);

        if let Some(declared) = header.body_len() {
            if declared != body.len() {
                return Err(FrameError::LengthMismatch);
            }
        }

        let mut body_vec = Vec::new();
        body_vec
            .extend_from_slice(body)
            .map_err(|_| FrameError::BodyTooLarge)?;

        Ok(Self {
            header,
            body: body_vec,
            checksum: P::CHECKSUM.from_bytes(crc),
        })
    }
}

/// Receiver progress through a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Accumulating header bytes
    ReadingHeader,
    /// Accumulating body and checksum bytes
    ReadingBody,
}

/// Byte-at-a-time frame reassembly
///
/// Keeps one fixed receive buffer that is reused for every frame. The
/// running checksum is fed as bytes arrive, so validation needs no second
/// pass over the data.
#[derive(Debug, Clone)]
pub struct FrameParser<P: Profile = Addressed> {
    state: ParseState,
    header_buf: Vec<u8, MAX_HEADER_LEN>,
    header: Option<P::Header>,
    buffer: Vec<u8, RX_BUFFER_SIZE>,
    expected: Option<usize>,
    checksum: Checksum,
    max_body_len: usize,
}

impl<P: Profile> Default for FrameParser<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Profile> FrameParser<P> {
    /// Create a parser accepting bodies up to [`MAX_BODY_SIZE`]
    pub fn new() -> Self {
        Self::with_limit(MAX_BODY_SIZE)
    }

    /// Create a parser with a smaller body limit
    pub fn with_limit(max_body_len: usize) -> Self {
        Self {
            state: ParseState::WaitingForStart,
            header_buf: Vec::new(),
            header: None,
            buffer: Vec::new(),
            expected: None,
            checksum: Checksum::new(P::CHECKSUM),
            max_body_len: max_body_len.min(MAX_BODY_SIZE),
        }
    }

    /// Reset the parser state, dropping any partial frame
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.header_buf.clear();
        self.header = None;
        self.buffer.clear();
        self.expected = None;
        self.checksum.reset();
    }

    /// Current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Body limit in effect
    pub fn max_body_len(&self) -> usize {
        self.max_body_len
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error. Every
    /// error drops the partial frame and returns to
    /// [`ParseState::WaitingForStart`].
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame<P>>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.reset();
                    self.state = ParseState::ReadingHeader;
                }
                // Silently ignore non-START bytes while waiting
                Ok(None)
            }
            ParseState::ReadingHeader => {
                if self.header_buf.push(byte).is_err() {
                    return self.fail(FrameError::InvalidFrame);
                }
                self.checksum.push(byte);

                if self.header_buf.len() < <P::Header as Header>::LEN {
                    return Ok(None);
                }

                let header = match <P::Header as Header>::decode(&self.header_buf) {
                    Ok(header) => header,
                    Err(_) => return self.fail(FrameError::InvalidFrame),
                };

                if let Some(len) = header.body_len() {
                    if len > self.max_body_len {
                        return self.fail(FrameError::BodyTooLarge);
                    }
                    self.expected = Some(len + P::CHECKSUM.width());
                }

                self.header = Some(header);
                self.state = ParseState::ReadingBody;
                Ok(None)
            }
            ParseState::ReadingBody => match self.expected {
                Some(total) if self.buffer.len() == total => {
                    if byte == FRAME_END {
                        self.finish()
                    } else {
                        self.fail(FrameError::InvalidFrame)
                    }
                }
                Some(_) => self.accumulate(byte),
                None if byte == FRAME_END => self.finish(),
                None => self.accumulate(byte),
            },
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame<P>>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    fn accumulate(&mut self, byte: u8) -> Result<Option<Frame<P>>, FrameError> {
        if self.buffer.len() >= self.max_body_len + P::CHECKSUM.width() {
            return self.fail(FrameError::BodyTooLarge);
        }
        if self.buffer.push(byte).is_err() {
            return self.fail(FrameError::BodyTooLarge);
        }
        self.checksum.push(byte);
        Ok(None)
    }

    fn finish(&mut self) -> Result<Option<Frame<P>>, FrameError> {
        let width = P::CHECKSUM.width();
        if self.buffer.len() < width {
            return self.fail(FrameError::InvalidFrame);
        }
        if !self.checksum.is_neutral() {
            return self.fail(FrameError::InvalidChecksum);
        }
        let header = match self.header.take() {
            Some(header) => header,
            None => return self.fail(FrameError::InvalidFrame),
        };

        let (body, crc) = self.buffer.split_at(self.buffer.len() - width);
        let mut body_vec = Vec::new();
        if body_vec.extend_from_slice(body).is_err() {
            return self.fail(FrameError::BodyTooLarge);
        }
        let frame = Frame {
            header,
            body: body_vec,
            checksum: P::CHECKSUM.from_bytes(crc),
        };

        self.reset();
        Ok(Some(frame))
    }

    fn fail(&mut self, error: FrameError) -> Result<Option<Frame<P>>, FrameError> {
        self.reset();
        Err(error)
    }
}
