//! Event system for Autofix Studio
//!
//! This crate provides the event bus and event types observers subscribe to
//! (the server's SSE route is the main consumer).

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
