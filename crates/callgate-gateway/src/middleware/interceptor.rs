//! Call interceptor: identity -> audit -> authorization -> handler.
//!
//! Installed as a route layer, so it runs once per unary call and once per
//! stream initiation (before the WebSocket upgrade), never per stream message.
//! The audit event is published *before* the ACL check, so denied attempts are
//! visible on the admin streams exactly like allowed ones. Calls without a
//! consumer identity are rejected before anything is published.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use callgate_core::error::{GateError, Result};
use callgate_core::protocol::Event;

use crate::app_state::AppState;
use crate::error::ApiError;

/// Call metadata key carrying the consumer identity.
pub const CONSUMER_HEADER: &str = "consumer";

/// What the interceptor needs to know about one inbound call.
#[derive(Debug, Clone)]
pub struct CallInfo {
    /// Full method path, `/<service>/<method>`.
    pub method: String,
    pub consumer: Option<String>,
    pub origin: Option<SocketAddr>,
}

impl CallInfo {
    /// Empty or non-UTF-8 consumer values count as absent. The origin is only
    /// present when the server was started with connect info.
    pub fn from_request(req: &Request) -> Self {
        let consumer = req
            .headers()
            .get(CONSUMER_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let origin = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);

        Self {
            method: req.uri().path().to_owned(),
            consumer,
            origin,
        }
    }
}

/// Publish the audit event for `call` and check it against the ACL.
pub fn admit(app: &AppState, call: &CallInfo) -> Result<()> {
    let consumer = call
        .consumer
        .as_deref()
        .ok_or(GateError::Unauthenticated("consumer is empty"))?;
    let origin = call.origin.map(|a| a.to_string()).unwrap_or_default();

    app.bus().publish(Event::now(&call.method, consumer, origin));
    app.policy().validate(consumer, &call.method)
}

/// axum middleware entry (`from_fn_with_state`).
pub async fn intercept(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let call = CallInfo::from_request(&req);
    let consumer = call.consumer.as_deref().unwrap_or("");

    match admit(&app, &call) {
        Ok(()) => {
            app.metrics()
                .calls
                .inc(&[("method", call.method.as_str()), ("outcome", "allowed")]);
            tracing::debug!(consumer, method = %call.method, "call admitted");
            next.run(req).await
        }
        Err(e) => {
            app.metrics()
                .calls
                .inc(&[("method", call.method.as_str()), ("outcome", "denied")]);
            tracing::info!(consumer, method = %call.method, error = %e, "call denied");
            ApiError(e).into_response()
        }
    }
}
