use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use accessgate_auth::{IdentityClaims, Principal, validate_claims};
use accessgate_core::TenantId;

use crate::context::PrincipalContext;

/// Produces the calling identity from request headers.
///
/// Resolution failures are not errors here: the request proceeds without a
/// principal and the authorization gate reports it as unauthenticated.
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<PrincipalContext>;
}

/// HS256 bearer tokens carrying [`IdentityClaims`].
pub struct JwtPrincipalResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtPrincipalResolver {
    pub fn new(secret: &[u8]) -> Self {
        // Time-window checks are done by `validate_claims` on the typed claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl PrincipalResolver for JwtPrincipalResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<PrincipalContext> {
        let token = extract_bearer(headers)?;

        let decoded = jsonwebtoken::decode::<IdentityClaims>(token, &self.key, &self.validation);
        let claims = match decoded {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                return None;
            }
        };

        match validate_claims(&claims, Utc::now()) {
            Ok(principal) => Some(PrincipalContext::new(principal, claims.tenant)),
            Err(e) => {
                tracing::debug!(error = %e, sub = %claims.sub, "token claims rejected");
                None
            }
        }
    }
}

/// Fixed identity for local development (no identity provider wired in).
pub struct StaticPrincipalResolver {
    context: PrincipalContext,
}

impl StaticPrincipalResolver {
    pub fn new(principal: Principal, tenant_id: TenantId) -> Self {
        Self {
            context: PrincipalContext::new(principal, tenant_id),
        }
    }
}

impl PrincipalResolver for StaticPrincipalResolver {
    fn resolve(&self, _headers: &HeaderMap) -> Option<PrincipalContext> {
        Some(self.context.clone())
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<dyn PrincipalResolver>,
}

pub async fn principal_middleware(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(ctx) = state.resolver.resolve(req.headers()) {
        req.extensions_mut().insert(ctx);
    }

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}
