//! Lightweight in-process metrics.
//!
//! Counters and gauges are stored as atomics and rendered by the `/metrics`
//! handler. The route sits outside the interception layer.

pub mod metrics;

pub use metrics::GateMetrics;
