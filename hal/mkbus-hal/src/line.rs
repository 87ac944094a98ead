//! Half-duplex line with explicit direction control
//!
//! One transceiver, one data line: the direction pin must be asserted
//! before any write and released straight after, otherwise the node stays
//! deaf to replies.

use crate::gpio::OutputPin;
use crate::uart::SerialLine;

/// Transceiver direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    /// Driver disabled, listening (pin low)
    Receive,
    /// Driver enabled, talking (pin high)
    Transmit,
}

/// Serial line plus the direction pin that owns it
///
/// Created once per node and owned by the bus or endpoint for its whole
/// life. The only way to transmit is [`HalfDuplex::transmit`], which always
/// hands the line back in receive mode.
pub struct HalfDuplex<L, D> {
    line: L,
    dir: D,
    mode: LineMode,
}

impl<L: SerialLine, D: OutputPin> HalfDuplex<L, D> {
    /// Bind a line to its direction pin, starting in receive mode
    pub fn new(line: L, dir: D) -> Self {
        let mut this = Self {
            line,
            dir,
            mode: LineMode::Receive,
        };
        this.set_mode(LineMode::Receive);
        this
    }

    /// Start the underlying line, listening
    pub fn begin(&mut self, baudrate: u32) {
        self.set_mode(LineMode::Receive);
        self.line.begin(baudrate);
    }

    /// Current transceiver direction
    pub fn mode(&self) -> LineMode {
        self.mode
    }

    fn set_mode(&mut self, mode: LineMode) {
        self.dir.set_state(mode == LineMode::Transmit);
        self.mode = mode;
    }

    /// Check whether a received byte is waiting
    pub fn available(&mut self) -> bool {
        self.line.available()
    }

    /// Take one received byte
    pub fn read_byte(&mut self) -> Result<u8, L::Error> {
        self.line.read_byte()
    }

    /// Send chunks back to back in a single turnaround
    ///
    /// Returns the total number of bytes accepted by the line. Receive mode
    /// is restored whether or not the write succeeded.
    pub fn transmit(&mut self, chunks: &[&[u8]]) -> Result<usize, L::Error> {
        self.set_mode(LineMode::Transmit);
        let result = self.write_chunks(chunks);
        self.set_mode(LineMode::Receive);
        result
    }

    fn write_chunks(&mut self, chunks: &[&[u8]]) -> Result<usize, L::Error> {
        let mut written = 0;
        for chunk in chunks {
            if chunk.is_empty() {
                continue;
            }
            let n = self.line.write(chunk)?;
            written += n;
            if n < chunk.len() {
                break;
            }
        }
        self.line.flush()?;
        Ok(written)
    }

    /// Borrow the serial line
    pub fn line(&self) -> &L {
        &self.line
    }

    /// Mutably borrow the serial line
    pub fn line_mut(&mut self) -> &mut L {
        &mut self.line
    }

    /// Borrow the direction pin
    pub fn pin(&self) -> &D {
        &self.dir
    }

    /// Split back into line and pin
    pub fn release(self) -> (L, D) {
        (self.line, self.dir)
    }
}
