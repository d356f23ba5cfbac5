//! Policy layer (consumer access control).
//!
//! Compiles the JSON ACL into a read-only lookup table consumed by the
//! interceptor on every call.

pub mod acl;

pub use acl::{AccessPolicy, AclMode};
