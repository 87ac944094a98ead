//! Binary persistence of configuration records
//!
//! Records are stored as postcard data, the same format used for anything
//! else a board keeps in flash. Loading validates the record.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{BusConfig, ConfigError, EndpointConfig};

/// Encoded size bound for either record
pub const MAX_CONFIG_SIZE: usize = 32;

impl<A: Serialize> BusConfig<A> {
    /// Serialize into `buffer`, returning the used prefix
    pub fn to_bytes<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }
}

impl<A: DeserializeOwned> BusConfig<A> {
    /// Load a record written by `to_bytes`, rejecting invalid settings
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }
}

impl<A: Serialize> EndpointConfig<A> {
    /// Serialize into `buffer`, returning the used prefix
    pub fn to_bytes<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }
}

impl<A: DeserializeOwned> EndpointConfig<A> {
    /// Load a record written by `to_bytes`, rejecting invalid settings
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }
}
