//! Shared error type across callgate crates.

use thiserror::Error;

/// Client-facing status codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Missing consumer, unknown consumer, or call not granted by policy.
    Unauthenticated,
    /// Malformed request parameters.
    InvalidArgument,
    /// Transport could not be set up or a stream could not be written.
    Unavailable,
    /// Internal server error (including configuration faults).
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::Unauthenticated => "UNAUTHENTICATED",
            ClientCode::InvalidArgument => "INVALID_ARGUMENT",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum GateError {
    /// Malformed policy or host configuration. Fatal to host start.
    #[error("config: {0}")]
    Config(String),
    /// Authorization failure raised by the interceptor.
    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Listener bind failure or a failed write on one stream.
    #[error("transport: {0}")]
    Transport(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl GateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GateError::Config(_) => ClientCode::Internal,
            GateError::Unauthenticated(_) => ClientCode::Unauthenticated,
            GateError::InvalidArgument(_) => ClientCode::InvalidArgument,
            GateError::Transport(_) => ClientCode::Unavailable,
            GateError::Internal(_) => ClientCode::Internal,
        }
    }
}
