//! Consistent error responses, including the authorization denial responder.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use accessgate_auth::GateError;
use accessgate_core::DomainError;

/// Map a gate refusal to its response class.
///
/// The three refusals stay distinguishable: 401 (no identity), 403 (policy
/// said no), 503 (policy could not be consulted).
pub fn gate_error_to_response(err: &GateError) -> axum::response::Response {
    match err {
        GateError::Unauthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "no authenticated principal",
        ),
        GateError::AccessDenied { .. } => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "Access denied")
        }
        GateError::DecisionUnavailable(_) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "decision_unavailable",
            "authorization service unavailable",
        ),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::Rejected(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "rejected", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
