//! callgate core: transport-agnostic contracts shared by the gateway.
//!
//! This crate defines the error surface, the audit/statistics wire types and
//! the method path grammar (`/<service>/<method>`). It carries no transport or
//! runtime dependencies so policy and fan-out logic can be tested in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed method
//! paths and policy input surface as `GateError` instead of crashing the host.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ClientCode, GateError, Result};
