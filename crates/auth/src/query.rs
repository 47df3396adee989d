use serde::Serialize;
use uuid::Uuid;

use crate::{Action, DecisionContext, PrincipalId, ResourceRef};

/// A single authorization question: may `principal_id` perform `action` on `resource`?
///
/// Every field is validated by its own type, so a query always carries a
/// non-empty principal, action and resource. Built fresh per protected call
/// and dropped once the decision is consumed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionQuery {
    query_id: Uuid,
    principal_id: PrincipalId,
    action: Action,
    resource: ResourceRef,
    context: DecisionContext,
}

impl DecisionQuery {
    pub fn new(
        principal_id: PrincipalId,
        action: Action,
        resource: ResourceRef,
        context: DecisionContext,
    ) -> Self {
        Self {
            query_id: Uuid::now_v7(),
            principal_id,
            action,
            resource,
            context,
        }
    }

    /// Correlation id for log lines about this query.
    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn context(&self) -> &DecisionContext {
        &self.context
    }
}
