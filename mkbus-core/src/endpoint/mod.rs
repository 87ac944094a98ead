//! Endpoint receiver
//!
//! An endpoint listens on the shared line, reassembles frames one byte per
//! call and hands every valid frame addressed to it to a
//! [`MessageHandler`]. The handler's optional [`Reply`] goes straight back
//! on the line.
//!
//! ```text
//! Idle ──':'──▶ ReceivingHeader ──LEN──▶ ReceivingBody ──END──▶ Busy ──▶ Transmitting
//!  ▲                  │                        │                  │           │
//!  └──────────────────┴─── drop on error ──────┴──────────────────┴───────────┘
//!                                                  failed reply ──▶ Error(fault)
//! ```
//!
//! A latched endpoint keeps reassembling frames but only acts on a
//! [`RESET`](opcode::RESET) addressed to it. [`BROADCAST`](opcode::BROADCAST)
//! frames reach every node's handler and are never answered.

use mkbus_hal::{Clock, Deadline, HalfDuplex, OutputPin, SerialLine};
use mkbus_protocol::{
    opcode, AddressOf, Body, Frame, FrameError, FrameParser, Header, ParseState, Profile,
};

use crate::config::{ConfigError, EndpointConfig};
use crate::state::{EndpointEvent, EndpointFault, EndpointState};

/// How [`Endpoint::listen`] waits for a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ListenMode {
    /// Return [`EndpointEvent::NoData`] when the line is quiet
    NonBlocking,
    /// Poll until a byte arrives or the receive timeout elapses
    Blocking,
}

/// Answer produced by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    /// Opcode of the answer frame
    pub opcode: u8,
    /// Answer payload
    pub body: Body,
}

impl Reply {
    /// Reply carrying `body`
    pub fn new(opcode: u8, body: &[u8]) -> Result<Self, FrameError> {
        let mut stored = Body::new();
        stored
            .extend_from_slice(body)
            .map_err(|_| FrameError::BodyTooLarge)?;
        Ok(Self {
            opcode,
            body: stored,
        })
    }

    /// Reply with no body
    pub fn empty(opcode: u8) -> Self {
        Self {
            opcode,
            body: Body::new(),
        }
    }
}

/// Application side of an endpoint
pub trait MessageHandler<P: Profile> {
    /// Act on a validated frame, optionally answering it
    fn handle(&mut self, frame: &Frame<P>) -> Option<Reply>;
}

impl<P, F> MessageHandler<P> for F
where
    P: Profile,
    F: FnMut(&Frame<P>) -> Option<Reply>,
{
    fn handle(&mut self, frame: &Frame<P>) -> Option<Reply> {
        self(frame)
    }
}

/// Why a frame could not be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Frame could not be encoded
    Frame(FrameError),
    /// Endpoint is, or has just become, latched in an error state
    Faulted(EndpointFault),
}

/// Bus endpoint bound to one half-duplex line
pub struct Endpoint<P: Profile, L, D, C> {
    config: EndpointConfig<AddressOf<P>>,
    line: HalfDuplex<L, D>,
    clock: C,
    parser: FrameParser<P>,
    state: EndpointState,
}

impl<P, L, D, C> Endpoint<P, L, D, C>
where
    P: Profile,
    L: SerialLine,
    D: OutputPin,
    C: Clock,
{
    /// Validate `config`, start the line and wait for frames
    pub fn new(
        config: EndpointConfig<AddressOf<P>>,
        mut line: HalfDuplex<L, D>,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        line.begin(config.baudrate);
        info!("Endpoint listening at {} baud", config.baudrate);

        Ok(Self {
            parser: FrameParser::with_limit(config.max_body_len),
            config,
            line,
            clock,
            state: EndpointState::Idle,
        })
    }

    /// Current receiver state
    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// Address this endpoint answers to
    pub fn address(&self) -> AddressOf<P> {
        self.config.address
    }

    /// Configuration the endpoint was built with
    pub fn config(&self) -> &EndpointConfig<AddressOf<P>> {
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

    /// Consume at most one byte and advance by one transition
    ///
    /// While a fault is latched the state stays `Error`; completed frames
    /// other than a [`RESET`](opcode::RESET) for this node are reported as
    /// [`EndpointEvent::Faulted`] and dropped.
    pub fn listen<H>(&mut self, mode: ListenMode, handler: &mut H) -> EndpointEvent
    where
        H: MessageHandler<P>,
    {
        let latched = match self.state {
            EndpointState::Error(fault) => Some(fault),
            _ => None,
        };

        match mode {
            ListenMode::NonBlocking => {
                if !self.line.available() {
                    return EndpointEvent::NoData;
                }
            }
            ListenMode::Blocking => {
                let deadline = Deadline::start(&mut self.clock, self.config.rx_timeout_ms);
                while !self.line.available() {
                    if deadline.is_expired(&mut self.clock) {
                        return EndpointEvent::Timeout;
                    }
                }
            }
        }

        let byte = match self.line.read_byte() {
            Ok(byte) => byte,
            Err(_) => {
                warn!("Line read failed, frame dropped");
                self.drop_frame();
                return EndpointEvent::ReceiveError;
            }
        };

        let was_idle = self.parser.state() == ParseState::WaitingForStart;
        match self.parser.feed(byte) {
            Ok(Some(frame)) => match latched {
                None => self.dispatch(frame, handler),
                Some(fault) => self.recover(frame, fault, handler),
            },
            Ok(None) => {
                if latched.is_none() {
                    self.state = self.parser.state().into();
                }
                if was_idle && self.parser.state() == ParseState::WaitingForStart {
                    EndpointEvent::Discarded
                } else {
                    EndpointEvent::Receiving
                }
            }
            Err(error) => {
                if latched.is_none() {
                    self.state = EndpointState::Idle;
                }
                match error {
                    FrameError::InvalidChecksum => {
                        warn!("Checksum mismatch, frame dropped");
                        EndpointEvent::ChecksumFailed
                    }
                    FrameError::BodyTooLarge => {
                        warn!("Frame exceeds {} body bytes, dropped", self.config.max_body_len);
                        EndpointEvent::BufferExhausted
                    }
                    _ => {
                        debug!("Malformed frame dropped");
                        EndpointEvent::FramingError
                    }
                }
            }
        }
    }

    /// Listen until a frame completes, a fault is reported or the receive
    /// timeout elapses
    ///
    /// A frame still partial at the deadline is dropped. A latched endpoint
    /// reports its fault instead of `Timeout`.
    pub fn receive_frame<H>(&mut self, handler: &mut H) -> EndpointEvent
    where
        H: MessageHandler<P>,
    {
        let deadline = Deadline::start(&mut self.clock, self.config.rx_timeout_ms);
        loop {
            match self.listen(ListenMode::NonBlocking, handler) {
                EndpointEvent::NoData | EndpointEvent::Discarded | EndpointEvent::Receiving => {}
                event => return event,
            }
            if deadline.is_expired(&mut self.clock) {
                if self.state.is_receiving() {
                    debug!("Frame stalled, dropped");
                }
                self.drop_frame();
                return match self.state {
                    EndpointState::Error(fault) => EndpointEvent::Faulted(fault),
                    _ => EndpointEvent::Timeout,
                };
            }
        }
    }

    /// Transmit a frame outside of a request
    ///
    /// A partial write latches [`EndpointFault::TransmitFailed`].
    pub fn send(&mut self, frame: &Frame<P>) -> Result<(), SendError> {
        if let EndpointState::Error(fault) = self.state {
            return Err(SendError::Faulted(fault));
        }

        let bytes = frame.encode_to_vec().map_err(SendError::Frame)?;

        self.state = EndpointState::Transmitting;
        match self.line.transmit(&[bytes.as_slice()]) {
            Ok(written) if written == bytes.len() => {
                self.state = EndpointState::Idle;
                Ok(())
            }
            _ => {
                error!("Reply transmission failed, endpoint halted");
                self.latch(EndpointFault::TransmitFailed);
                Err(SendError::Faulted(EndpointFault::TransmitFailed))
            }
        }
    }

    /// Take the endpoint off the bus until [`reset`](Self::reset)
    pub fn halt(&mut self) {
        self.latch(EndpointFault::Halted);
    }

    /// Drop any partial frame and clear a latched fault
    pub fn reset(&mut self) {
        if let EndpointState::Error(fault) = self.state {
            info!("Endpoint reset from {}", fault);
        }
        self.parser.reset();
        self.state = EndpointState::Idle;
    }

    fn dispatch<H>(&mut self, frame: Frame<P>, handler: &mut H) -> EndpointEvent
    where
        H: MessageHandler<P>,
    {
        let code = frame.opcode();
        let broadcast = code == opcode::BROADCAST;
        if !broadcast && frame.header.target() != self.config.address {
            trace!("Frame for another node ignored");
            self.state = EndpointState::Idle;
            return EndpointEvent::Ignored;
        }

        if code == opcode::RESET {
            self.reset();
        }

        self.state = EndpointState::Busy;
        let reply = handler.handle(&frame);
        if broadcast && reply.is_some() {
            debug!("Reply to broadcast suppressed");
        }
        let Some(reply) = reply.filter(|_| !broadcast) else {
            self.state = EndpointState::Idle;
            return EndpointEvent::Handled { opcode: code };
        };

        let header = frame.header.reply(reply.opcode, self.config.address);
        let answer = match Frame::<P>::new(header, &reply.body) {
            Ok(answer) => answer,
            Err(_) => {
                self.state = EndpointState::Idle;
                return EndpointEvent::Handled { opcode: code };
            }
        };

        match self.send(&answer) {
            Ok(()) => EndpointEvent::Replied { opcode: code },
            Err(SendError::Faulted(fault)) => EndpointEvent::Faulted(fault),
            Err(SendError::Frame(_)) => {
                warn!("Reply could not be encoded, dropped");
                self.state = EndpointState::Idle;
                EndpointEvent::Handled { opcode: code }
            }
        }
    }

    fn recover<H>(
        &mut self,
        frame: Frame<P>,
        fault: EndpointFault,
        handler: &mut H,
    ) -> EndpointEvent
    where
        H: MessageHandler<P>,
    {
        if frame.opcode() == opcode::RESET && frame.header.target() == self.config.address {
            return self.dispatch(frame, handler);
        }
        trace!("Frame dropped while faulted");
        EndpointEvent::Faulted(fault)
    }

    fn drop_frame(&mut self) {
        self.parser.reset();
        if !self.state.is_error() {
            self.state = EndpointState::Idle;
        }
    }

    fn latch(&mut self, fault: EndpointFault) {
        self.parser.reset();
        self.state = EndpointState::Error(fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;
    use mkbus_hal::mock::{MockClock, MockLine, MockPin};
    use mkbus_hal::LineMode;
    use mkbus_protocol::frame::MAX_FRAME_SIZE;
    use mkbus_protocol::{
        opcode, Addressed, AddressedHeader, BusAddress, Compact, CompactHeader, MAX_BODY_SIZE,
    };

    const NODE: BusAddress = BusAddress::new([0x01, 0x00]);
    const OTHER: BusAddress = BusAddress::new([0x02, 0x00]);

    type TestEndpoint<P> = Endpoint<P, MockLine, MockPin, MockClock>;

    fn endpoint_with(config: EndpointConfig<BusAddress>) -> TestEndpoint<Addressed> {
        let line = HalfDuplex::new(MockLine::new(), MockPin::new());
        Endpoint::new(config, line, MockClock::new(1)).unwrap()
    }

    fn endpoint() -> TestEndpoint<Addressed> {
        endpoint_with(EndpointConfig::new(NODE))
    }

    fn request(target: BusAddress, opcode: u8, body: &[u8]) -> Vec<u8, MAX_FRAME_SIZE> {
        Frame::<Addressed>::new(AddressedHeader::new(target, opcode), body)
            .unwrap()
            .encode_to_vec()
            .unwrap()
    }

    fn hear<P: Profile>(endpoint: &mut TestEndpoint<P>, bytes: &[u8]) {
        endpoint.line_mut().line_mut().queue_rx(bytes);
    }

    /// Feed queued bytes until something other than progress is reported
    fn drain<P: Profile, H: MessageHandler<P>>(
        endpoint: &mut TestEndpoint<P>,
        handler: &mut H,
    ) -> EndpointEvent {
        loop {
            match endpoint.listen(ListenMode::NonBlocking, handler) {
                EndpointEvent::Receiving | EndpointEvent::Discarded => {}
                event => return event,
            }
        }
    }

    fn silent(_: &Frame<Addressed>) -> Option<Reply> {
        None
    }

    fn info(frame: &Frame<Addressed>) -> Option<Reply> {
        match frame.opcode() {
            opcode::INFO => Reply::new(opcode::INFO, b"device-v1").ok(),
            opcode::PING => Some(Reply::empty(opcode::PONG)),
            _ => None,
        }
    }

    #[test]
    fn test_new_starts_line() {
        let endpoint = endpoint();
        assert_eq!(endpoint.state(), EndpointState::Idle);
        assert_eq!(endpoint.line().line().baudrate(), Some(9600));
        assert_eq!(endpoint.address(), NODE);
    }

    #[test]
    fn test_quiet_line() {
        let mut endpoint = endpoint();
        assert_eq!(
            endpoint.listen(ListenMode::NonBlocking, &mut silent),
            EndpointEvent::NoData
        );
    }

    #[test]
    fn test_blocking_listen_times_out() {
        let mut endpoint = endpoint();
        assert_eq!(
            endpoint.listen(ListenMode::Blocking, &mut silent),
            EndpointEvent::Timeout
        );
        assert!(endpoint.clock().peek() >= 1000);
        assert_eq!(endpoint.state(), EndpointState::Idle);
    }

    #[test]
    fn test_noise_is_discarded() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &[0x00, 0x55, b'\n']);

        for _ in 0..3 {
            assert_eq!(
                endpoint.listen(ListenMode::NonBlocking, &mut silent),
                EndpointEvent::Discarded
            );
            assert_eq!(endpoint.state(), EndpointState::Idle);
        }
    }

    #[test]
    fn test_one_transition_per_call() {
        let mut endpoint = endpoint();
        let bytes = request(NODE, opcode::INFO, b"");
        hear(&mut endpoint, &bytes);

        assert_eq!(
            endpoint.listen(ListenMode::NonBlocking, &mut silent),
            EndpointEvent::Receiving
        );
        assert_eq!(endpoint.state(), EndpointState::ReceivingHeader);

        for _ in 0..AddressedHeader::LEN {
            endpoint.listen(ListenMode::NonBlocking, &mut silent);
        }
        assert_eq!(endpoint.state(), EndpointState::ReceivingBody);
        assert_eq!(endpoint.line().line().pending_rx(), 3);
    }

    #[test]
    fn test_frame_is_handled() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &request(NODE, opcode::REQUEST, b"go"));

        let mut seen = None;
        let mut handler = |frame: &Frame<Addressed>| -> Option<Reply> {
            seen = Some(frame.clone());
            None
        };

        assert_eq!(
            drain(&mut endpoint, &mut handler),
            EndpointEvent::Handled {
                opcode: opcode::REQUEST
            }
        );
        assert_eq!(seen.unwrap().body.as_slice(), b"go");
        assert_eq!(endpoint.state(), EndpointState::Idle);
        assert!(endpoint.line().line().written().is_empty());
    }

    #[test]
    fn test_reply_is_sent() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &request(NODE, opcode::INFO, b""));

        assert_eq!(
            drain(&mut endpoint, &mut info),
            EndpointEvent::Replied {
                opcode: opcode::INFO
            }
        );
        assert_eq!(endpoint.state(), EndpointState::Idle);
        assert_eq!(endpoint.line().mode(), LineMode::Receive);
        assert_eq!(endpoint.line().pin().rising_edges(), 1);

        let reply = Frame::<Addressed>::decode(endpoint.line().line().written()).unwrap();
        assert_eq!(reply.header.address, NODE);
        assert_eq!(reply.opcode(), opcode::INFO);
        assert_eq!(reply.body_str(), Some("device-v1"));
    }

    #[test]
    fn test_checksum_failure() {
        let mut endpoint = endpoint();
        let mut bytes = request(NODE, opcode::REQUEST, b"go");
        bytes[8] ^= 0x01;
        hear(&mut endpoint, &bytes);

        let mut calls = 0;
        let mut handler = |_: &Frame<Addressed>| -> Option<Reply> {
            calls += 1;
            None
        };

        assert_eq!(
            drain(&mut endpoint, &mut handler),
            EndpointEvent::ChecksumFailed
        );
        assert_eq!(calls, 0);
        assert_eq!(endpoint.state(), EndpointState::Idle);
        assert!(endpoint.line().line().written().is_empty());
    }

    #[test]
    fn test_declared_length_over_limit() {
        let mut endpoint = endpoint_with(EndpointConfig {
            max_body_len: 4,
            ..EndpointConfig::new(NODE)
        });
        hear(&mut endpoint, &request(NODE, opcode::REQUEST, b"too long"));

        assert_eq!(
            drain(&mut endpoint, &mut silent),
            EndpointEvent::BufferExhausted
        );
        assert_eq!(endpoint.state(), EndpointState::Idle);
        // Dropped at the end of the header; the body is left unread
        assert_eq!(endpoint.line().line().pending_rx(), 8 + 2 + 1);
    }

    #[test]
    fn test_body_may_contain_delimiters() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &request(NODE, opcode::REQUEST, b"a\nb:c"));

        let mut body = Body::new();
        let mut handler = |frame: &Frame<Addressed>| -> Option<Reply> {
            body = frame.body.clone();
            None
        };

        assert!(drain(&mut endpoint, &mut handler).is_delivered());
        assert_eq!(body.as_slice(), b"a\nb:c");
    }

    #[test]
    fn test_missing_end_is_framing_error() {
        let mut endpoint = endpoint();
        let mut bytes = request(NODE, opcode::REQUEST, b"go");
        let last = bytes.len() - 1;
        bytes[last] = b'x';
        hear(&mut endpoint, &bytes);

        assert_eq!(
            drain(&mut endpoint, &mut silent),
            EndpointEvent::FramingError
        );
        assert_eq!(endpoint.state(), EndpointState::Idle);
    }

    #[test]
    fn test_other_node_is_ignored() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &request(OTHER, opcode::INFO, b""));

        assert_eq!(drain(&mut endpoint, &mut info), EndpointEvent::Ignored);
        assert!(endpoint.line().line().written().is_empty());
    }

    #[test]
    fn test_read_error_drops_frame() {
        let mut endpoint = endpoint();
        let bytes = request(NODE, opcode::INFO, b"");
        hear(&mut endpoint, &bytes[..4]);
        for _ in 0..4 {
            endpoint.listen(ListenMode::NonBlocking, &mut silent);
        }
        assert_eq!(endpoint.state(), EndpointState::ReceivingHeader);

        hear(&mut endpoint, &bytes[4..]);
        endpoint.line_mut().line_mut().set_fail_reads(true);
        assert_eq!(
            endpoint.listen(ListenMode::NonBlocking, &mut silent),
            EndpointEvent::ReceiveError
        );
        assert_eq!(endpoint.state(), EndpointState::Idle);

        // The rest of the frame is now noise
        endpoint.line_mut().line_mut().set_fail_reads(false);
        assert_eq!(
            endpoint.listen(ListenMode::NonBlocking, &mut silent),
            EndpointEvent::Discarded
        );
    }

    #[test]
    fn test_failed_reply_latches() {
        let mut endpoint = endpoint();
        endpoint.line_mut().line_mut().set_write_limit(Some(3));
        hear(&mut endpoint, &request(NODE, opcode::PING, b""));

        assert_eq!(
            drain(&mut endpoint, &mut info),
            EndpointEvent::Faulted(EndpointFault::TransmitFailed)
        );
        assert_eq!(
            endpoint.state(),
            EndpointState::Error(EndpointFault::TransmitFailed)
        );
        assert_eq!(endpoint.line().mode(), LineMode::Receive);

        // Latched: frames are read but not acted on
        hear(&mut endpoint, &request(NODE, opcode::PING, b""));
        assert_eq!(
            drain(&mut endpoint, &mut info),
            EndpointEvent::Faulted(EndpointFault::TransmitFailed)
        );
        assert_eq!(endpoint.line().line().pending_rx(), 0);
        assert_eq!(
            endpoint.state(),
            EndpointState::Error(EndpointFault::TransmitFailed)
        );

        endpoint.reset();
        endpoint.line_mut().line_mut().set_write_limit(None);
        assert_eq!(endpoint.state(), EndpointState::Idle);
        assert_eq!(
            drain(&mut endpoint, &mut info),
            EndpointEvent::Replied {
                opcode: opcode::PING
            }
        );
    }

    #[test]
    fn test_halt_and_reset() {
        let mut endpoint = endpoint();
        endpoint.halt();
        assert_eq!(
            endpoint.state(),
            EndpointState::Error(EndpointFault::Halted)
        );

        let frame = Frame::<Addressed>::empty(AddressedHeader::new(NODE, opcode::PONG));
        assert_eq!(
            endpoint.send(&frame),
            Err(SendError::Faulted(EndpointFault::Halted))
        );
        assert!(endpoint.line().line().written().is_empty());

        endpoint.reset();
        assert_eq!(endpoint.send(&frame), Ok(()));
        assert_eq!(
            endpoint.line().line().written(),
            frame.encode_to_vec().unwrap().as_slice()
        );
    }

    #[test]
    fn test_reset_frame_clears_fault() {
        let mut endpoint = endpoint();
        endpoint.halt();
        hear(&mut endpoint, &request(NODE, opcode::RESET, b""));

        let mut seen = None;
        let mut handler = |frame: &Frame<Addressed>| -> Option<Reply> {
            seen = Some(frame.opcode());
            None
        };

        assert_eq!(
            endpoint.receive_frame(&mut handler),
            EndpointEvent::Handled {
                opcode: opcode::RESET
            }
        );
        assert_eq!(seen, Some(opcode::RESET));
        assert_eq!(endpoint.state(), EndpointState::Idle);
        assert_eq!(endpoint.line().line().pending_rx(), 0);

        hear(&mut endpoint, &request(NODE, opcode::PING, b""));
        assert_eq!(
            endpoint.receive_frame(&mut info),
            EndpointEvent::Replied {
                opcode: opcode::PING
            }
        );
    }

    #[test]
    fn test_reset_for_other_node_keeps_fault() {
        let mut endpoint = endpoint();
        endpoint.halt();
        hear(&mut endpoint, &request(OTHER, opcode::RESET, b""));

        assert_eq!(
            endpoint.receive_frame(&mut info),
            EndpointEvent::Faulted(EndpointFault::Halted)
        );
        assert_eq!(
            endpoint.state(),
            EndpointState::Error(EndpointFault::Halted)
        );
    }

    #[test]
    fn test_corrupt_reset_keeps_fault() {
        let mut endpoint = endpoint();
        endpoint.halt();
        let mut bytes = request(NODE, opcode::RESET, b"");
        bytes[3] ^= 0x01;
        hear(&mut endpoint, &bytes);

        assert_eq!(
            drain(&mut endpoint, &mut silent),
            EndpointEvent::ChecksumFailed
        );
        assert_eq!(
            endpoint.state(),
            EndpointState::Error(EndpointFault::Halted)
        );

        // Quiet line: the fault is still what gets reported
        assert_eq!(
            endpoint.receive_frame(&mut silent),
            EndpointEvent::Faulted(EndpointFault::Halted)
        );
    }

    #[test]
    fn test_reset_frame_restarts_receiver() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &request(NODE, opcode::RESET, b""));

        assert_eq!(
            drain(&mut endpoint, &mut info),
            EndpointEvent::Handled {
                opcode: opcode::RESET
            }
        );
        assert_eq!(endpoint.state(), EndpointState::Idle);
    }

    #[test]
    fn test_broadcast_reaches_every_node() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &request(OTHER, opcode::BROADCAST, b"all"));

        let mut body = Body::new();
        let mut handler = |frame: &Frame<Addressed>| -> Option<Reply> {
            body = frame.body.clone();
            Some(Reply::empty(opcode::RESPOND))
        };

        assert_eq!(
            drain(&mut endpoint, &mut handler),
            EndpointEvent::Handled {
                opcode: opcode::BROADCAST
            }
        );
        assert_eq!(body.as_slice(), b"all");
        assert!(endpoint.line().line().written().is_empty());
        assert_eq!(endpoint.line().pin().rising_edges(), 0);
        assert_eq!(endpoint.state(), EndpointState::Idle);
    }

    #[test]
    fn test_send_rejects_inconsistent_frame() {
        let mut endpoint = endpoint();
        let mut frame = Frame::<Addressed>::new(AddressedHeader::new(NODE, 1), b"abc").unwrap();
        frame.header.body_len = 7;

        assert_eq!(
            endpoint.send(&frame),
            Err(SendError::Frame(FrameError::LengthMismatch))
        );
        assert_eq!(endpoint.state(), EndpointState::Idle);
    }

    #[test]
    fn test_receive_frame_completes() {
        let mut endpoint = endpoint();
        hear(&mut endpoint, &[0x00, 0x00]);
        hear(&mut endpoint, &request(NODE, opcode::INFO, b""));

        assert_eq!(
            endpoint.receive_frame(&mut info),
            EndpointEvent::Replied {
                opcode: opcode::INFO
            }
        );
    }

    #[test]
    fn test_receive_frame_drops_stalled_frame() {
        let mut endpoint = endpoint();
        let bytes = request(NODE, opcode::INFO, b"");
        hear(&mut endpoint, &bytes[..5]);

        assert_eq!(endpoint.receive_frame(&mut info), EndpointEvent::Timeout);
        assert_eq!(endpoint.state(), EndpointState::Idle);

        // A fresh frame is still accepted afterwards
        hear(&mut endpoint, &bytes);
        assert!(endpoint.receive_frame(&mut info).is_delivered());
    }

    fn compact_endpoint(max_body_len: usize) -> TestEndpoint<Compact> {
        let config = EndpointConfig {
            max_body_len,
            ..EndpointConfig::new(7u8)
        };
        let line = HalfDuplex::new(MockLine::new(), MockPin::new());
        Endpoint::new(config, line, MockClock::new(1)).unwrap()
    }

    fn compact_request(code: u8, to: u8, body: &[u8]) -> Vec<u8, MAX_FRAME_SIZE> {
        let header = CompactHeader { code, from: 0, to };
        Frame::<Compact>::new(header, body)
            .unwrap()
            .encode_to_vec()
            .unwrap()
    }

    #[test]
    fn test_compact_reply_goes_to_sender() {
        let mut endpoint = compact_endpoint(MAX_BODY_SIZE);
        hear(&mut endpoint, &compact_request(opcode::PING, 7, b""));

        let mut handler = |_: &Frame<Compact>| -> Option<Reply> { Some(Reply::empty(opcode::PONG)) };
        assert_eq!(
            drain(&mut endpoint, &mut handler),
            EndpointEvent::Replied {
                opcode: opcode::PING
            }
        );

        let reply = Frame::<Compact>::decode(endpoint.line().line().written()).unwrap();
        assert_eq!(
            reply.header,
            CompactHeader {
                code: opcode::PONG,
                from: 7,
                to: 0
            }
        );
    }

    #[test]
    fn test_compact_reply_with_end_is_dropped() {
        let mut endpoint = compact_endpoint(MAX_BODY_SIZE);
        hear(&mut endpoint, &compact_request(opcode::INFO, 7, b""));

        let mut handler =
            |_: &Frame<Compact>| -> Option<Reply> { Reply::new(opcode::INFO, b"a\nb").ok() };
        assert_eq!(
            drain(&mut endpoint, &mut handler),
            EndpointEvent::Handled {
                opcode: opcode::INFO
            }
        );
        assert!(endpoint.line().line().written().is_empty());
        assert_eq!(endpoint.state(), EndpointState::Idle);
    }

    #[test]
    fn test_compact_overflow() {
        let mut endpoint = compact_endpoint(2);
        hear(&mut endpoint, &compact_request(opcode::INFO, 7, b"hi!"));

        let mut handler = |_: &Frame<Compact>| -> Option<Reply> { None };
        assert_eq!(
            drain(&mut endpoint, &mut handler),
            EndpointEvent::BufferExhausted
        );
        assert_eq!(endpoint.state(), EndpointState::Idle);
    }
}
