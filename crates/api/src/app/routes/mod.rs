use axum::{
    Router,
    routing::{get, post},
};

pub mod accounts;
pub mod system;

/// Router for endpoints that see the resolved principal.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/accounts/:account_id", get(accounts::get_account))
        .route("/accounts/:account_id/transfer", post(accounts::transfer))
}
