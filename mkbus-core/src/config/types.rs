//! Configuration type definitions
//!
//! One record per bus role. Both are plain data: they can be built in code,
//! or persisted as postcard binary data with the `serde` feature.

use mkbus_hal::uart::DEFAULT_BAUDRATE;
use mkbus_protocol::{BusAddress, GUARD_LEN, MAX_BODY_SIZE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default time a master waits for an answer
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Default time an endpoint waits for the rest of a frame
pub const DEFAULT_RX_TIMEOUT_MS: u32 = 1000;

/// Longest guard run a master may send before a frame
pub const MAX_GUARD_LEN: usize = 16;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Baud rate of zero
    ZeroBaudrate,
    /// Body limit above the frame maximum
    BodyLimitTooLarge,
    /// Timeout of zero
    ZeroTimeout,
    /// Guard run above [`MAX_GUARD_LEN`]
    GuardTooLong,
    /// Record did not fit the output buffer
    Serialize,
    /// Stored bytes are not a valid record
    Deserialize,
}

/// Master side settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusConfig<A = BusAddress> {
    /// Own address, written into request headers that carry a source
    pub address: A,
    /// Line speed
    pub baudrate: u32,
    /// Largest answer body kept; longer bodies raise `BUFFER_EXHAUSTED`
    pub max_body_len: usize,
    /// Bound on the whole answer, from the end of the request to END
    pub timeout_ms: u32,
    /// Guard bytes sent before each request
    pub guard_len: usize,
}

impl<A> BusConfig<A> {
    /// Settings for `address` with every other field at its default
    pub const fn new(address: A) -> Self {
        Self {
            address,
            baudrate: DEFAULT_BAUDRATE,
            max_body_len: MAX_BODY_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            guard_len: GUARD_LEN,
        }
    }

    /// Check limits before the line is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baudrate == 0 {
            return Err(ConfigError::ZeroBaudrate);
        }
        if self.max_body_len > MAX_BODY_SIZE {
            return Err(ConfigError::BodyLimitTooLarge);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.guard_len > MAX_GUARD_LEN {
            return Err(ConfigError::GuardTooLong);
        }
        Ok(())
    }
}

impl<A: Default> Default for BusConfig<A> {
    fn default() -> Self {
        Self::new(A::default())
    }
}

/// Endpoint side settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EndpointConfig<A = BusAddress> {
    /// Own address; frames for other nodes are ignored
    pub address: A,
    /// Line speed
    pub baudrate: u32,
    /// Largest request body accepted
    pub max_body_len: usize,
    /// Bound on a blocking receive
    pub rx_timeout_ms: u32,
}

impl<A> EndpointConfig<A> {
    /// Settings for `address` with every other field at its default
    pub const fn new(address: A) -> Self {
        Self {
            address,
            baudrate: DEFAULT_BAUDRATE,
            max_body_len: MAX_BODY_SIZE,
            rx_timeout_ms: DEFAULT_RX_TIMEOUT_MS,
        }
    }

    /// Check limits before the line is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baudrate == 0 {
            return Err(ConfigError::ZeroBaudrate);
        }
        if self.max_body_len > MAX_BODY_SIZE {
            return Err(ConfigError::BodyLimitTooLarge);
        }
        if self.rx_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

impl<A: Default> Default for EndpointConfig<A> {
    fn default() -> Self {
        Self::new(A::default())
    }
}
