//! torctl library
//!
//! Client for the line-oriented control port of a running Tor daemon:
//! authentication, GETINFO queries and debounced signals.

pub mod config;
pub mod control;
pub mod error;
pub mod metrics;

pub use control::{Controller, Signal};
pub use error::{ControlError, ControlResult};
