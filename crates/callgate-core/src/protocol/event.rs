//! Audit and statistics wire types.
//!
//! Field names on the wire are camelCase (`originHost`, `timestampUnix`,
//! `countByMethod`, ...). Maps are ordered so identical snapshots serialize
//! identically.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One audit record of an intercepted call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Full method path, e.g. `/service.BusinessLogic/Check`.
    pub method: String,
    pub consumer: String,
    /// Caller address as `ip:port`, empty when the transport did not supply it.
    #[serde(default)]
    pub origin_host: String,
    pub timestamp_unix: i64,
}

impl Event {
    /// Stamp a new event with the current wall-clock time.
    pub fn now(
        method: impl Into<String>,
        consumer: impl Into<String>,
        origin_host: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            consumer: consumer.into(),
            origin_host: origin_host.into(),
            timestamp_unix: unix_now(),
        }
    }
}

/// Point-in-time readout of a statistics window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSnapshot {
    pub timestamp_unix: i64,
    #[serde(default)]
    pub count_by_method: BTreeMap<String, u64>,
    #[serde(default)]
    pub count_by_consumer: BTreeMap<String, u64>,
}

impl StatSnapshot {
    /// Total number of events covered by this snapshot.
    pub fn total(&self) -> u64 {
        self.count_by_method.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count_by_method.is_empty() && self.count_by_consumer.is_empty()
    }
}

/// Request message of `Statistics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatInterval {
    pub interval_seconds: u64,
}

/// Empty request/response message of the unary business calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nothing {}

/// Seconds since the Unix epoch; 0 if the clock is before the epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
