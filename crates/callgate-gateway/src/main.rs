//! callgate gateway binary.
//!
//! - Config: YAML from `$CALLGATE_CONFIG` (default `callgate.yaml`)
//! - Routes: `/service.Admin/*` (WebSocket streams), `/service.BusinessLogic/*` (unary)
//! - Shutdown on Ctrl+C / SIGTERM; exits once the listener is released

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use callgate_core::error::Result;
use callgate_gateway::{config, ServiceHost};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::var("CALLGATE_CONFIG").unwrap_or_else(|_| "callgate.yaml".to_string());
    match run(&path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, config = %path, "callgate-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(path: &str) -> Result<()> {
    let cfg = config::load_from_file(path)?;
    let host = ServiceHost::from_config(&cfg, shutdown_signal()).await?;
    host.stopped().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl+c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
