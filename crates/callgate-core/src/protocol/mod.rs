//! Protocol modules (method paths + audit wire types).
//!
//! - `method`: the `/<service>/<method>` grammar and static service
//!   descriptors that policy wildcards expand against.
//! - `event`: the audit `Event`, the `StatSnapshot` readout and the small
//!   request/response messages of the RPC surface.
//!
//! Parsers are panic-free: malformed paths are reported as `GateError`.

pub mod event;
pub mod method;

pub use event::{unix_now, Event, Nothing, StatInterval, StatSnapshot};
pub use method::{MethodPath, ServiceDescriptor};
