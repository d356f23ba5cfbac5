//! Axum router wiring.
//!
//! Every RPC route sits behind the interceptor (`route_layer`, so unknown
//! paths 404 without touching policy or bus). `/metrics` is mounted after the
//! layer and is not intercepted.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::middleware::intercept;
use crate::services::{admin, business};

pub fn build_router(state: AppState) -> Router {
    let mut rpc = Router::new()
        .route(&admin::SERVICE.path(admin::LOGGING), get(admin::logging))
        .route(&admin::SERVICE.path(admin::STATISTICS), get(admin::statistics));

    for method in business::SERVICE.methods {
        rpc = rpc.route(&business::SERVICE.path(method), post(business::ack));
    }

    rpc.route_layer(axum::middleware::from_fn_with_state(state.clone(), intercept))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn metrics(State(app): State<AppState>) -> String {
    let bus = app.bus();
    app.metrics().render(&[
        ("callgate_events_published_total", bus.published_count()),
        ("callgate_events_dropped_total", bus.dropped_count()),
        ("callgate_subscribers", bus.subscriber_count() as u64),
    ])
}
