use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use accessgate_auth::{GateError, GateMode};

use crate::app::{AppState, dto::WhoAmIResponse, errors};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// 200 when the gate consults the decision point, 503 in conservative-deny mode.
pub async fn ready(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match state.gate.mode() {
        GateMode::Normal => (StatusCode::OK, Json(serde_json::json!({ "mode": "normal" }))),
        GateMode::ConservativeDeny => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "mode": "conservative_deny" })),
        ),
    }
}

/// Authorization outcome counters, one per response class.
pub async fn metrics(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "authorization": state.outcomes.snapshot() }))
}

pub async fn whoami(principal: Option<Extension<PrincipalContext>>) -> axum::response::Response {
    let Some(Extension(ctx)) = principal else {
        return errors::gate_error_to_response(&GateError::Unauthenticated);
    };

    Json(WhoAmIResponse {
        principal_id: ctx.principal().id().to_string(),
        display_name: ctx.principal().display_name(),
        tenant_id: ctx.tenant_id().to_string(),
        roles: ctx
            .principal()
            .roles()
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
    })
    .into_response()
}
