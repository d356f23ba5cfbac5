//! HTTP mapping of `GateError` (status + stable JSON body).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use callgate_core::error::{ClientCode, GateError};

/// Response wrapper so handlers can `?` a `GateError` straight into an RPC status.
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ClientCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ClientCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self.0 {
            GateError::Unauthenticated(reason) => (*reason).to_string(),
            other => other.to_string(),
        };
        let body = Json(json!({
            "code": code.as_str(),
            "message": message,
        }));
        (status, body).into_response()
    }
}
