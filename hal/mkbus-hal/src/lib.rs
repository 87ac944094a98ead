//! mkbus Hardware Abstraction Layer
//!
//! This crate defines the collaborators the bus protocol needs from the
//! board: a byte-oriented serial line, a transceiver direction pin and a
//! millisecond clock. Chip-specific code implements these traits (directly
//! or through the `embedded-hal` / `embedded-io` adapters) and the protocol
//! crates stay board-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  mkbus-core (master, endpoint)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mkbus-hal (this crate - traits)        │
//! │  HalfDuplex = SerialLine + OutputPin    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-io / │       │ board-specific│
//! │ embedded-hal  │       │     impls     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Transceiver direction pin
//! - [`uart::SerialLine`] - Serial byte transport
//! - [`time::Clock`] - Monotonic millisecond source

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod io;
pub mod line;
pub mod time;
pub mod uart;

#[cfg(feature = "embassy")]
pub mod embassy;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use gpio::{DirectionPin, OutputPin};
pub use io::IoLine;
pub use line::{HalfDuplex, LineMode};
pub use time::{Clock, Deadline};
pub use uart::SerialLine;
