//! Muster engine library.
//!
//! Exposes the player roster, upgrade activation, configuration, and protocol
//! modules for use by integration tests and the binary entry point.

pub mod config;
pub mod engine;
pub mod protocol;
pub mod roster;
pub mod upgrade;
