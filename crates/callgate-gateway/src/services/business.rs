//! Protected application calls. Bodies are intentionally trivial; the
//! interceptor in front of them is what matters.

use axum::Json;

use callgate_core::protocol::{Nothing, ServiceDescriptor};

pub const SERVICE: ServiceDescriptor = ServiceDescriptor {
    name: "service.BusinessLogic",
    methods: &["Check", "Add", "Test"],
};

/// Shared handler for `Check`, `Add` and `Test`: `Nothing -> Nothing`.
pub async fn ack() -> Json<Nothing> {
    Json(Nothing {})
}
