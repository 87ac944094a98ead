//! In-memory collaborators for host-side tests
//!
//! [`MockLine`] is a loopback-free serial line: bytes queued with
//! [`MockLine::queue_rx`] are what the node "hears", and everything the node
//! writes is captured for inspection. [`MockClock`] advances by a fixed step
//! on every read so poll loops always terminate.

use heapless::{Deque, Vec};

use crate::gpio::OutputPin;
use crate::time::Clock;
use crate::uart::SerialLine;

/// Capacity of the mock receive queue and transmit log
pub const MOCK_BUFFER_SIZE: usize = 512;

/// Faults the mock line can be told to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MockError {
    /// Read attempted with nothing queued
    Empty,
    /// Injected read failure
    ReadFault,
    /// Injected write failure
    WriteFault,
}

/// Scriptable serial line
#[derive(Debug, Default)]
pub struct MockLine {
    rx: Deque<u8, MOCK_BUFFER_SIZE>,
    tx: Vec<u8, MOCK_BUFFER_SIZE>,
    baudrate: Option<u32>,
    write_limit: Option<usize>,
    fail_reads: bool,
    fail_writes: bool,
    flushes: usize,
}

impl MockLine {
    /// Create an idle, silent line
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the node to receive
    ///
    /// Bytes beyond the queue capacity are dropped.
    pub fn queue_rx(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.rx.push_back(byte).is_err() {
                break;
            }
        }
    }

    /// Number of received bytes not yet consumed
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    /// Everything written since creation or the last [`clear_written`](Self::clear_written)
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Forget the transmit log
    pub fn clear_written(&mut self) {
        self.tx.clear();
    }

    /// Accept at most `limit` bytes in the transmit log, then go short
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// Make every read fail
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every write fail
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Baud rate passed to `begin`, if started
    pub fn baudrate(&self) -> Option<u32> {
        self.baudrate
    }

    /// Number of flush calls
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl SerialLine for MockLine {
    type Error = MockError;

    fn begin(&mut self, baudrate: u32) {
        self.baudrate = Some(baudrate);
    }

    fn available(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read_byte(&mut self) -> Result<u8, MockError> {
        if self.fail_reads {
            return Err(MockError::ReadFault);
        }
        self.rx.pop_front().ok_or(MockError::Empty)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, MockError> {
        if self.fail_writes {
            return Err(MockError::WriteFault);
        }
        let mut written = 0;
        for &byte in data {
            if let Some(limit) = self.write_limit {
                if self.tx.len() >= limit {
                    break;
                }
            }
            if self.tx.push(byte).is_err() {
                break;
            }
            written += 1;
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), MockError> {
        self.flushes += 1;
        Ok(())
    }
}

/// Direction pin that records its level and transitions
#[derive(Debug, Default)]
pub struct MockPin {
    high: bool,
    rising_edges: usize,
}

impl MockPin {
    /// Create a pin driven low
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of low-to-high transitions seen
    pub fn rising_edges(&self) -> usize {
        self.rising_edges
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        if !self.high {
            self.rising_edges += 1;
        }
        self.high = true;
    }

    fn set_low(&mut self) {
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Clock that moves forward by `step_ms` every time it is read
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    now_ms: u32,
    step_ms: u32,
}

impl MockClock {
    /// Start at zero, advancing `step_ms` per read
    pub fn new(step_ms: u32) -> Self {
        Self::starting_at(0, step_ms)
    }

    /// Start at an arbitrary tick
    pub fn starting_at(now_ms: u32, step_ms: u32) -> Self {
        Self { now_ms, step_ms }
    }

    /// Current tick without advancing
    pub fn peek(&self) -> u32 {
        self.now_ms
    }

    /// Jump forward
    pub fn advance(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&mut self) -> u32 {
        let now = self.now_ms;
        self.now_ms = self.now_ms.wrapping_add(self.step_ms);
        now
    }
}
