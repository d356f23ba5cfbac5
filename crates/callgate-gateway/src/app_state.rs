//! Shared application state for the callgate host.
//!
//! One `AppState` per host instance: the compiled ACL, the event bus and the
//! metrics registry. Nothing here is process-global, so several hosts can run
//! side by side in one test binary.

use std::sync::Arc;

use callgate_core::error::Result;

use crate::config::HostSection;
use crate::events::EventBus;
use crate::obs::GateMetrics;
use crate::policy::{AccessPolicy, AclMode};
use crate::services;

/// Per-host tunables that shape admin streams and the bus.
#[derive(Debug, Clone, Copy)]
pub struct StreamLimits {
    pub queue_capacity: usize,
    pub max_stat_interval_secs: u64,
}

impl Default for StreamLimits {
    fn default() -> Self {
        let host = HostSection::default();
        Self::from(&host)
    }
}

impl From<&HostSection> for StreamLimits {
    fn from(host: &HostSection) -> Self {
        Self {
            queue_capacity: host.queue_capacity,
            max_stat_interval_secs: host.max_stat_interval_secs,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    policy: Arc<AccessPolicy>,
    bus: Arc<EventBus>,
    metrics: Arc<GateMetrics>,
    limits: StreamLimits,
}

impl AppState {
    /// Compile the ACL against the built-in service catalog and create a
    /// fresh bus. Returns `GateError::Config` for malformed ACL input.
    pub fn new(acl_json: &str, mode: AclMode, limits: StreamLimits) -> Result<Self> {
        let policy = AccessPolicy::compile(acl_json, &services::catalog(), mode)?;
        let bus = Arc::new(EventBus::new(limits.queue_capacity));
        Ok(Self::with_parts(Arc::new(policy), bus, limits))
    }

    /// Assemble state from an already built policy and bus.
    pub fn with_parts(policy: Arc<AccessPolicy>, bus: Arc<EventBus>, limits: StreamLimits) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                policy,
                bus,
                metrics: Arc::new(GateMetrics::default()),
                limits,
            }),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.inner.policy
    }

    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.inner.bus)
    }

    pub fn metrics(&self) -> &GateMetrics {
        &self.inner.metrics
    }

    pub fn limits(&self) -> StreamLimits {
        self.inner.limits
    }
}
