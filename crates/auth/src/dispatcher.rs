//! Per-request interception point.

use std::sync::Arc;

use policygate_core::{ModelCatalog, Target};

use crate::controller::ControllerPolicies;
use crate::error::{AuthzError, PolicyError};
use crate::gate::{authorize, Gate};
use crate::requirement::Coverage;
use crate::resolver::resolve;
use crate::scope::{BoundValue, RequestScope};
use crate::Principal;

/// Runs every check an action requires before its body executes.
///
/// Checks are a logical AND evaluated in a fixed order and the first failure
/// short-circuits:
/// 1. actions registered as denied are rejected outright;
/// 2. complex declarations, in declaration order;
/// 3. the resource ability-map entry for the action, if any.
#[derive(Clone)]
pub struct PolicyCheck {
    gate: Arc<dyn Gate>,
    catalog: Arc<ModelCatalog>,
}

impl core::fmt::Debug for PolicyCheck {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PolicyCheck")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl PolicyCheck {
    pub fn new(gate: Arc<dyn Gate>, catalog: Arc<ModelCatalog>) -> Self {
        Self { gate, catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn check(
        &self,
        controller: &ControllerPolicies,
        scope: &RequestScope,
        principal: &Principal,
    ) -> Result<(), AuthzError> {
        let action = scope.action();

        if controller.coverage(action) == Coverage::Denied {
            tracing::warn!(
                controller = controller.name(),
                action,
                "request to action without policy coverage rejected"
            );
            return Err(PolicyError::UnauthorizedRegistration {
                controller: controller.name().to_string(),
                action: action.to_string(),
            }
            .into());
        }

        if let Some(definition) = controller.action(action) {
            for policy in definition.complex_policies() {
                let resolution = resolve(policy, scope, &self.catalog).inspect_err(|e| {
                    tracing::warn!(error = %e, "policy declaration could not be resolved");
                })?;
                tracing::debug!(
                    ability = %resolution.ability,
                    target = %resolution.target,
                    "checking declared policy"
                );
                authorize(self.gate.as_ref(), principal, &resolution.ability, &resolution.target)?;
            }
        }

        if let Some(ability) = controller.ability_map().get(action) {
            let target = self.resource_target(controller, scope)?;
            tracing::debug!(ability = %ability, target = %target, "checking resource ability");
            authorize(self.gate.as_ref(), principal, ability, &target)?;
        }

        Ok(())
    }

    fn resource_target(
        &self,
        controller: &ControllerPolicies,
        scope: &RequestScope,
    ) -> Result<Target, PolicyError> {
        if controller.methods_without_models().contains(scope.action()) {
            return Ok(Target::Class(controller.model().clone()));
        }

        match scope.parameter(controller.parameter()) {
            Some(BoundValue::Model(instance)) if instance.is_a(controller.model()) => {
                Ok(Target::Instance(instance.clone()))
            }
            _ => Err(PolicyError::TargetNotFound {
                controller: controller.name().to_string(),
                action: scope.action().to_string(),
            }),
        }
    }
}
