use serde::{Deserialize, Serialize};

use policygate_core::PrincipalId;

use crate::Permission;

/// The actor on whose behalf a request runs.
///
/// Construction is decoupled from transport: the HTTP layer derives it from
/// whatever credential it accepts and hands it to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(principal_id: PrincipalId, permissions: Vec<Permission>) -> Self {
        Self {
            principal_id,
            permissions,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == permission)
    }

    pub fn has_wildcard(&self) -> bool {
        self.permissions.iter().any(Permission::is_wildcard)
    }
}
