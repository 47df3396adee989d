use accessgate_auth::Principal;
use accessgate_core::TenantId;

/// Resolved identity for a request (principal + the tenant it acts in).
///
/// Inserted into request extensions by the principal middleware only when
/// resolution succeeded; its absence means "unauthenticated".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
    tenant_id: TenantId,
}

impl PrincipalContext {
    pub fn new(principal: Principal, tenant_id: TenantId) -> Self {
        Self { principal, tenant_id }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}
