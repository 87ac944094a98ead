//! `embedded-io` adapter
//!
//! Lets any blocking UART that implements the `embedded-io` traits act as
//! a [`SerialLine`]. The baud rate is fixed when the peripheral is built,
//! so `begin` only records it.

use embedded_io::{Read, ReadReady, Write};

use crate::uart::SerialLine;

/// Errors from an [`IoLine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoLineError<E> {
    /// The stream reported ready but returned no data
    Eof,
    /// Error from the wrapped stream
    Io(E),
}

/// Serial line over an `embedded-io` stream
pub struct IoLine<T> {
    inner: T,
    baudrate: u32,
}

impl<T> IoLine<T> {
    /// Wrap a stream
    pub fn new(inner: T) -> Self {
        Self { inner, baudrate: 0 }
    }

    /// Baud rate the bus asked for
    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }

    /// Borrow the wrapped stream
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Give the wrapped stream back
    pub fn release(self) -> T {
        self.inner
    }
}

impl<T: Read + ReadReady + Write> SerialLine for IoLine<T> {
    type Error = IoLineError<T::Error>;

    fn begin(&mut self, baudrate: u32) {
        self.baudrate = baudrate;
    }

    fn available(&mut self) -> bool {
        // A failing readiness check reads as "nothing yet"; the caller's
        // deadline bounds the wait.
        self.inner.read_ready().unwrap_or(false)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf).map_err(IoLineError::Io)? {
            0 => Err(IoLineError::Eof),
            _ => Ok(buf[0]),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        let mut written = 0;
        while written < data.len() {
            let n = self.inner.write(&data[written..]).map_err(IoLineError::Io)?;
            if n == 0 {
                break;
            }
            written += n;
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush().map_err(IoLineError::Io)
    }
}
