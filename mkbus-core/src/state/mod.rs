//! Bus role state machines
//!
//! The master and endpoint states are explicit and finite. Each public
//! operation leaves its role in a resting state.

pub mod events;
pub mod machine;

pub use events::EndpointEvent;
pub use machine::{EndpointFault, EndpointState, MasterState};
