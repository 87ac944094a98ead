//! Master query engine
//!
//! The master owns the line. It sends one request, then waits for and reads
//! the answer under a single bound of `timeout_ms` and reports every fault
//! as a [`Status`] flag. Nothing is retried.
//!
//! ```text
//! Setup ──▶ Idle ──▶ Transmitting ──▶ AwaitingResponse ──▶ Receiving ──▶ Processing
//!            ▲                               │ timeout                       │
//!            └───────────────────────────────┴───────────────────────────────┘
//! ```

use core::marker::PhantomData;

use heapless::Vec;
use mkbus_hal::{Clock, Deadline, HalfDuplex, OutputPin, SerialLine};
use mkbus_protocol::checksum::MAX_CHECKSUM_LEN;
use mkbus_protocol::frame::RX_BUFFER_SIZE;
use mkbus_protocol::{
    AddressOf, Body, Checksum, Frame, Header, Profile, QueryResult, Status, FRAME_END,
    FRAME_START, GUARD_BYTE, MAX_HEADER_LEN,
};

use crate::config::{BusConfig, ConfigError, MAX_GUARD_LEN};
use crate::request::Request;
use crate::state::MasterState;

static GUARD: [u8; MAX_GUARD_LEN] = [GUARD_BYTE; MAX_GUARD_LEN];

/// Why no byte was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxFault {
    Timeout,
    Line,
}

/// Bus master bound to one half-duplex line
pub struct Bus<P: Profile, L, D, C> {
    config: BusConfig<AddressOf<P>>,
    line: HalfDuplex<L, D>,
    clock: C,
    state: MasterState,
    _profile: PhantomData<P>,
}

impl<P, L, D, C> Bus<P, L, D, C>
where
    P: Profile,
    L: SerialLine,
    D: OutputPin,
    C: Clock,
{
    /// Validate `config`, start the line and become ready
    pub fn new(
        config: BusConfig<AddressOf<P>>,
        line: HalfDuplex<L, D>,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut bus = Self {
            config,
            line,
            clock,
            state: MasterState::Setup,
            _profile: PhantomData,
        };
        bus.line.begin(bus.config.baudrate);
        bus.state = MasterState::Idle;
        info!("Bus master ready at {} baud", bus.config.baudrate);

        Ok(bus)
    }

    /// Current engine state
    pub fn state(&self) -> MasterState {
        self.state
    }

    /// Configuration the bus was built with
    pub fn config(&self) -> &BusConfig<AddressOf<P>> {
        &self.config
    }

    /// Borrow the line
    pub fn line(&self) -> &HalfDuplex<L, D> {
        &self.line
    }

    /// Mutably borrow the line
    pub fn line_mut(&mut self) -> &mut HalfDuplex<L, D> {
        &mut self.line
    }

    /// Borrow the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Give back the line and clock
    pub fn release(self) -> (HalfDuplex<L, D>, C) {
        (self.line, self.clock)
    }

    /// Send a typed request and interpret the answer
    pub fn query<R: Request<P>>(&mut self, request: &R) -> R::Response {
        let result = self.exchange(request);
        request.parse_response(result)
    }

    fn exchange<R: Request<P>>(&mut self, request: &R) -> QueryResult<P> {
        if !request.is_ready() {
            warn!("Request not ready, nothing sent");
            return QueryResult::with_status(Status::TX_ERROR);
        }

        let mut body = Body::new();
        if request.serialize(&mut body).is_err() {
            warn!("Request body could not be serialized");
            return QueryResult::with_status(Status::TX_ERROR);
        }

        let mut header = request.header();
        header.set_source(self.config.address);
        header.set_body_len(body.len());

        // START + header
        let mut encoded = [0u8; MAX_HEADER_LEN];
        let head_len = header.encode(&mut encoded);
        let mut head = [0u8; 1 + MAX_HEADER_LEN];
        head[0] = FRAME_START;
        head[1..=head_len].copy_from_slice(&encoded[..head_len]);
        let head = &head[..=head_len];

        // Checksum + END
        let width = P::CHECKSUM.width();
        let checksum = P::CHECKSUM.to_bytes(Frame::<P>::compute_checksum(&header, &body));
        if !Frame::<P>::end_is_unambiguous(&header, &body, &checksum[..width]) {
            warn!("Request would end early at an END byte, nothing sent");
            return QueryResult::with_status(Status::TX_ERROR);
        }
        let mut tail = [0u8; MAX_CHECKSUM_LEN + 1];
        tail[..width].copy_from_slice(&checksum[..width]);
        tail[width] = FRAME_END;
        let tail = &tail[..=width];

        debug!(
            "Query opcode {} with {} body bytes",
            header.opcode(),
            body.len()
        );

        let mut status = Status::OK;
        if self.raw_send(head, true) != head.len() {
            status |= Status::TX_ERROR;
        }
        if !body.is_empty() && self.raw_send(&body, false) != body.len() {
            status |= Status::TX_ERROR;
        }

        let mut result = self.raw_query(tail, false);
        result.status |= status;
        result
    }

    /// Write `data` in one turnaround, preceded by the guard run if `pause`
    ///
    /// Returns how many bytes of `data` the line accepted.
    pub fn raw_send(&mut self, data: &[u8], pause: bool) -> usize {
        self.state = MasterState::Transmitting;

        let guard: &[u8] = if pause {
            &GUARD[..self.config.guard_len]
        } else {
            &[]
        };

        let written = match self.line.transmit(&[guard, data]) {
            Ok(total) => total.saturating_sub(guard.len()),
            Err(_) => {
                warn!("Line write failed");
                0
            }
        };
        if written < data.len() {
            warn!("Short write: {} of {} bytes", written, data.len());
        }

        self.state = MasterState::Idle;
        written
    }

    /// Write `data`, then wait for and read one answer frame
    ///
    /// The whole answer, START through END, must arrive within
    /// `timeout_ms` of the write completing.
    pub fn raw_query(&mut self, data: &[u8], pause: bool) -> QueryResult<P> {
        let mut status = Status::OK;
        if self.raw_send(data, pause) != data.len() {
            status |= Status::TX_ERROR;
        }

        let deadline = Deadline::start(&mut self.clock, self.config.timeout_ms);
        let result = match self.await_start(&deadline) {
            Ok(()) => self.receive(&deadline, status),
            Err(fault) => QueryResult::with_status(status | fault),
        };

        self.state = MasterState::Idle;
        trace!("Query finished with status {}", result.status);
        result
    }

    fn await_start(&mut self, deadline: &Deadline) -> Result<(), Status> {
        self.state = MasterState::AwaitingResponse;

        loop {
            match self.next_byte(deadline) {
                Ok(FRAME_START) => return Ok(()),
                // Guard run or line noise ahead of the answer
                Ok(_) => {}
                Err(RxFault::Timeout) => {
                    debug!("No answer within {} ms", self.config.timeout_ms);
                    return Err(Status::TIMEOUT);
                }
                Err(RxFault::Line) => return Err(Status::RX_ERROR),
            }
        }
    }

    fn receive(&mut self, deadline: &Deadline, mut status: Status) -> QueryResult<P> {
        self.state = MasterState::Receiving;
        let mut checksum = Checksum::new(P::CHECKSUM);

        let head_len = <P::Header as Header>::LEN;
        let mut head = [0u8; MAX_HEADER_LEN];
        for slot in head.iter_mut().take(head_len) {
            match self.next_byte(deadline) {
                Ok(byte) => {
                    *slot = byte;
                    checksum.push(byte);
                }
                Err(_) => {
                    warn!("Answer header cut short");
                    return QueryResult::with_status(status | Status::RX_ERROR);
                }
            }
        }
        let header = match <P::Header as Header>::decode(&head[..head_len]) {
            Ok(header) => header,
            Err(_) => return QueryResult::with_status(status | Status::RX_ERROR),
        };

        let mut body = Body::new();
        let mut crc: Vec<u8, MAX_CHECKSUM_LEN> = Vec::new();
        status |= match header.body_len() {
            Some(len) => self.read_counted(deadline, len, &mut checksum, &mut body, &mut crc),
            None => self.read_delimited(deadline, &mut checksum, &mut body, &mut crc),
        };

        self.state = MasterState::Processing;
        if !checksum.is_neutral() {
            warn!("Answer checksum mismatch");
            status |= Status::CRC_FAILED;
        }

        QueryResult {
            status,
            content: Some(Frame {
                header,
                body,
                checksum: P::CHECKSUM.from_bytes(&crc),
            }),
        }
    }

    /// Body of known length, checksum, then END
    ///
    /// A body above the limit is still read and checksummed in full; only
    /// the first `max_body_len` bytes are kept.
    fn read_counted(
        &mut self,
        deadline: &Deadline,
        len: usize,
        checksum: &mut Checksum,
        body: &mut Body,
        crc: &mut Vec<u8, MAX_CHECKSUM_LEN>,
    ) -> Status {
        let mut status = Status::OK;
        let limit = self.config.max_body_len;
        if len > limit {
            warn!("Answer body of {} bytes exceeds {}", len, limit);
            status |= Status::BUFFER_EXHAUSTED;
        }

        for _ in 0..len {
            let Ok(byte) = self.next_byte(deadline) else {
                warn!("Answer body cut short");
                return status | Status::RX_ERROR;
            };
            checksum.push(byte);
            if body.len() < limit {
                let _ = body.push(byte);
            }
        }

        for _ in 0..P::CHECKSUM.width() {
            let Ok(byte) = self.next_byte(deadline) else {
                warn!("Answer checksum cut short");
                return status | Status::RX_ERROR;
            };
            checksum.push(byte);
            let _ = crc.push(byte);
        }

        match self.next_byte(deadline) {
            Ok(FRAME_END) => status,
            _ => {
                warn!("Answer not terminated");
                status | Status::RX_ERROR
            }
        }
    }

    /// Body and checksum up to END
    ///
    /// Bytes past the limit are checksummed but dropped; the last checksum
    /// width bytes are always kept as the received checksum.
    fn read_delimited(
        &mut self,
        deadline: &Deadline,
        checksum: &mut Checksum,
        body: &mut Body,
        crc: &mut Vec<u8, MAX_CHECKSUM_LEN>,
    ) -> Status {
        let mut status = Status::OK;
        let width = P::CHECKSUM.width();
        let limit = self.config.max_body_len + width;

        let mut staged: Vec<u8, RX_BUFFER_SIZE> = Vec::new();
        let mut recent = [0u8; MAX_CHECKSUM_LEN];
        let mut total = 0usize;

        loop {
            match self.next_byte(deadline) {
                Ok(FRAME_END) => break,
                Ok(byte) => {
                    checksum.push(byte);
                    recent.copy_within(1.., 0);
                    recent[MAX_CHECKSUM_LEN - 1] = byte;
                    total += 1;
                    if staged.len() < limit {
                        let _ = staged.push(byte);
                    }
                }
                Err(_) => {
                    warn!("Answer not terminated");
                    status |= Status::RX_ERROR;
                    break;
                }
            }
        }

        if total < width {
            return status | Status::RX_ERROR;
        }

        if total > limit {
            warn!("Answer of {} bytes exceeds {}", total, limit);
            status |= Status::BUFFER_EXHAUSTED;
            let _ = body.extend_from_slice(&staged[..self.config.max_body_len]);
        } else {
            let _ = body.extend_from_slice(&staged[..total - width]);
        }
        let _ = crc.extend_from_slice(&recent[MAX_CHECKSUM_LEN - width..]);

        status
    }

    fn next_byte(&mut self, deadline: &Deadline) -> Result<u8, RxFault> {
        loop {
            if deadline.is_expired(&mut self.clock) {
                return Err(RxFault::Timeout);
            }
            if self.line.available() {
                return self.line.read_byte().map_err(|_| {
                    warn!("Line read failed");
                    RxFault::Line
                });
            }
        }
    }
}
