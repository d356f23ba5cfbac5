//! Service host: listener ownership and start/stop lifecycle.
//!
//! A host is an explicit value, never process-global. Shutdown is driven by
//! an injected future: when it resolves the bus is torn down first (every
//! admin stream sees its queue close), then the server drains in-flight calls
//! and drops the listener. `stopped()` resolves only after the socket is
//! released, so the same address can be bound again right away.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use callgate_core::error::{GateError, Result};

use crate::app_state::{AppState, StreamLimits};
use crate::config::GatewayConfig;
use crate::events::EventBus;
use crate::policy::AclMode;
use crate::router;

pub struct ServiceHost {
    local_addr: SocketAddr,
    bus: Arc<EventBus>,
    task: JoinHandle<Result<()>>,
}

impl ServiceHost {
    /// Compile `acl_json` (lenient mode, default limits), bind `addr` and
    /// start serving in the background.
    pub async fn start<F>(addr: &str, acl_json: &str, shutdown: F) -> Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = AppState::new(acl_json, AclMode::Lenient, StreamLimits::default())?;
        Self::serve(addr, state, shutdown).await
    }

    /// Start from a validated gateway config.
    pub async fn from_config<F>(cfg: &GatewayConfig, shutdown: F) -> Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let raw = cfg.acl.load_raw()?;
        let state = AppState::new(&raw, cfg.acl.mode(), StreamLimits::from(&cfg.host))?;
        Self::serve(&cfg.host.listen, state, shutdown).await
    }

    /// Bind `addr` and serve `state` until `shutdown` resolves.
    pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GateError::Transport(format!("bind {addr} failed: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GateError::Transport(format!("local addr unavailable: {e}")))?;

        let bus = state.bus();
        let app = router::build_router(state).into_make_service_with_connect_info::<SocketAddr>();

        let drain_bus = Arc::clone(&bus);
        let drain = async move {
            shutdown.await;
            let streams = drain_bus.teardown_all();
            tracing::info!(
                addr = %local_addr,
                streams,
                "shutdown requested; admin streams torn down"
            );
        };

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(drain)
                .await
                .map_err(|e| GateError::Transport(format!("serve failed: {e}")));
            tracing::info!(addr = %local_addr, "listener released");
            served
        });

        tracing::info!(addr = %local_addr, "callgate host serving");
        Ok(Self {
            local_addr,
            bus,
            task,
        })
    }

    /// Bound address (useful when started on port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Wait until shutdown has completed and the listening socket is closed.
    pub async fn stopped(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| GateError::Internal(format!("host task failed: {e}")))?
    }
}
