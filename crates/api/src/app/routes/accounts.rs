//! Protected account endpoints: every handler goes through the gate first.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    response::IntoResponse,
};
use serde_json::json;

use accessgate_auth::{Action, DecisionContext, ResourceRef};
use accessgate_core::{AccountId, Amount, DomainError, TenantId};

use crate::app::{
    AppState,
    dto::{AccountResponse, TransferQuery, TransferResponse},
    errors,
};
use crate::authz;
use crate::context::PrincipalContext;

/// Static call-site context for an account: tenant + `{type, owner_id}`.
fn account_context(tenant: &TenantId, resource: &ResourceRef) -> DecisionContext {
    DecisionContext::new().tenant(tenant).resource_attributes(
        resource,
        [("owner_id".to_string(), json!(resource.id()))],
    )
}

/// GET /accounts/:account_id
pub async fn get_account(
    Extension(state): Extension<Arc<AppState>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(account_id): Path<String>,
) -> axum::response::Response {
    let principal = match authz::require_principal(&state, principal.map(|Extension(p)| p)) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let account_id = match AccountId::parse(account_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let resource = ResourceRef::account(&account_id);
    let context = account_context(principal.tenant_id(), &resource);

    let guarded = authz::protect(
        &state,
        &principal,
        &Action::READ,
        &resource,
        context,
        |_| state.accounts.get(&account_id),
    )
    .await;

    match guarded {
        Ok(account) => Json(AccountResponse {
            id: account_id.to_string(),
            balance: account.balance,
            status: if account.active { "active" } else { "closed" }.to_string(),
        })
        .into_response(),
        Err(response) => response,
    }
}

/// POST /accounts/:account_id/transfer?amount=...
pub async fn transfer(
    Extension(state): Extension<Arc<AppState>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(account_id): Path<String>,
    query: Option<Query<TransferQuery>>,
) -> axum::response::Response {
    let principal = match authz::require_principal(&state, principal.map(|Extension(p)| p)) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let account_id = match AccountId::parse(account_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Some(Query(query)) = query else {
        return errors::domain_error_to_response(DomainError::validation(
            "query parameter 'amount' must be a number",
        ));
    };
    let amount = match Amount::new(query.amount) {
        Ok(amount) => amount,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let resource = ResourceRef::account(&account_id);

    // Request-time attributes merged over the static account context.
    let context = account_context(principal.tenant_id(), &resource).merge(
        DecisionContext::new()
            .resource_attributes(&resource, [("amount".to_string(), json!(amount.value()))]),
    );

    let guarded = authz::protect(
        &state,
        &principal,
        &Action::TRANSFER,
        &resource,
        context,
        |_| state.accounts.transfer_out(&account_id, amount),
    )
    .await;

    match guarded {
        Ok(Ok(balance)) => Json(TransferResponse {
            status: "success".to_string(),
            transferred: amount.value(),
            balance,
        })
        .into_response(),
        Ok(Err(e)) => errors::domain_error_to_response(e),
        Err(response) => response,
    }
}
