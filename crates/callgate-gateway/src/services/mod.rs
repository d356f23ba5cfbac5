//! RPC services mounted behind the interceptor.
//!
//! - `admin`: server-streaming observation endpoints (`Logging`, `Statistics`).
//! - `business`: the protected unary application surface.
//!
//! `catalog()` is the single source of truth for which methods exist; ACL
//! wildcards expand against it and the router mounts routes from it.

pub mod admin;
pub mod business;

use callgate_core::protocol::ServiceDescriptor;

/// Every service this host serves.
pub fn catalog() -> [ServiceDescriptor; 2] {
    [admin::SERVICE, business::SERVICE]
}
