//! Board-agnostic bus roles for mkbus
//!
//! This crate contains everything that runs on top of the frame codec and
//! the hardware traits:
//!
//! - Master query engine with bounded waits and status flags
//! - Endpoint receiver state machine and message dispatch
//! - Typed request/response extension point
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod config;
pub mod endpoint;
pub mod master;
pub mod request;
pub mod state;

pub use mkbus_hal as hal;
pub use mkbus_protocol as protocol;

pub use config::{BusConfig, ConfigError, EndpointConfig};
pub use endpoint::{Endpoint, ListenMode, MessageHandler, Reply, SendError};
pub use master::Bus;
pub use request::{InfoRequest, InfoResponse, PingRequest, PingResponse, RawRequest, Request};
pub use state::{EndpointEvent, EndpointFault, EndpointState, MasterState};
