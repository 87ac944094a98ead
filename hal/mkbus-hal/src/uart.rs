//! Serial line abstraction
//!
//! The bus treats the UART as a polled byte stream: the caller checks
//! [`SerialLine::available`] before every [`SerialLine::read_byte`] so no
//! call ever blocks indefinitely.

/// Default line rate of the bus in bits per second
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Byte-oriented serial transport
///
/// Implementations wrap a hardware or software UART. Direction switching
/// is not part of this trait; see [`crate::line::HalfDuplex`].
pub trait SerialLine {
    /// Error type for line operations
    type Error;

    /// Start the line at the given baud rate
    fn begin(&mut self, baudrate: u32);

    /// Check whether at least one received byte is waiting
    fn available(&mut self) -> bool;

    /// Take one received byte
    ///
    /// Only called after [`available`](Self::available) returned `true`.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Write data to the line
    ///
    /// Returns the number of bytes accepted, which may be short.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Block until every written byte has left the shift register
    fn flush(&mut self) -> Result<(), Self::Error>;
}
