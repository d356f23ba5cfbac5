//! callgate gateway library entry.
//!
//! This crate wires the ACL, the audit event bus, the call interceptor and the
//! admin/business services into an axum server with an explicit start/stop
//! lifecycle. It is consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod middleware;
pub mod obs;
pub mod policy;
pub mod router;
pub mod services;

pub use host::ServiceHost;
