//! Controller registration.
//!
//! A controller is described once, at startup, by its resource model, its
//! ability overrides and its actions. [`ControllerPoliciesBuilder::build`]
//! performs the registration pass and freezes the result; the frozen
//! [`ControllerPolicies`] is shared read-only across requests.

use std::collections::BTreeMap;

use serde::Serialize;

use policygate_core::ModelType;

use crate::ability_map::{AbilityMap, MethodSet};
use crate::declaration::{Policy, RequirementOverride};
use crate::requirement::{self, Coverage};
use crate::Ability;

/// One controller action and its static authorization metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    name: String,
    policies: Vec<Policy>,
    requirement_override: Option<RequirementOverride>,
    binds_model: bool,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policies: Vec::new(),
            requirement_override: None,
            binds_model: false,
        }
    }

    /// Attach a declaration. Repeatable; order is preserved.
    pub fn policy(mut self, policy: impl Into<Policy>) -> Self {
        self.policies.push(policy.into());
        self
    }

    pub fn override_requirement(mut self) -> Self {
        self.requirement_override = Some(RequirementOverride);
        self
    }

    /// The action receives the controller's resource model as a route binding.
    pub fn binds_model(mut self) -> Self {
        self.binds_model = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn complex_policies(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter().filter(|p| p.is_complex())
    }

    pub fn is_exempt(&self) -> bool {
        self.requirement_override.is_some()
    }

    pub fn takes_model(&self) -> bool {
        self.binds_model
    }
}

/// Opt-in registration behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Fold simple declarations into the ability map.
    pub policy_attributes: bool,
    /// Deny actions without any authorization coverage.
    pub requirement_audit: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            policy_attributes: true,
            requirement_audit: true,
        }
    }
}

/// Frozen authorization metadata of one controller.
#[derive(Debug, Clone)]
pub struct ControllerPolicies {
    name: String,
    model: ModelType,
    parameter: String,
    capabilities: Capabilities,
    ability_map: AbilityMap,
    methods_without_models: MethodSet,
    actions: BTreeMap<String, ActionDefinition>,
    coverage: BTreeMap<String, Coverage>,
}

impl ControllerPolicies {
    pub fn builder(name: impl Into<String>, model: ModelType) -> ControllerPoliciesBuilder {
        ControllerPoliciesBuilder::new(name, model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource model the controller manages.
    pub fn model(&self) -> &ModelType {
        &self.model
    }

    /// Route parameter carrying the bound resource model.
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Defaults merged with controller overrides and simple declarations.
    pub fn ability_map(&self) -> &AbilityMap {
        &self.ability_map
    }

    pub fn methods_without_models(&self) -> &MethodSet {
        &self.methods_without_models
    }

    pub fn action(&self, name: &str) -> Option<&ActionDefinition> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }

    /// Coverage of `action`.
    ///
    /// Actions that were never registered are classified on the spot as if
    /// they carried no declarations, so an unknown action cannot slip past an
    /// audited controller.
    pub fn coverage(&self, action: &str) -> Coverage {
        if let Some(coverage) = self.coverage.get(action) {
            return *coverage;
        }
        if !self.capabilities.requirement_audit {
            Coverage::Unchecked
        } else if self.ability_map.contains(action) {
            Coverage::MapCovered
        } else {
            Coverage::Denied
        }
    }
}

pub struct ControllerPoliciesBuilder {
    name: String,
    model: ModelType,
    parameter: Option<String>,
    capabilities: Capabilities,
    abilities: AbilityMap,
    without_models: MethodSet,
    actions: Vec<ActionDefinition>,
}

impl ControllerPoliciesBuilder {
    pub fn new(name: impl Into<String>, model: ModelType) -> Self {
        Self {
            name: name.into(),
            model,
            parameter: None,
            capabilities: Capabilities::default(),
            abilities: AbilityMap::new(),
            without_models: MethodSet::new(),
            actions: Vec::new(),
        }
    }

    /// Route parameter name of the resource (default: the model's
    /// conventional parameter name).
    pub fn parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// Controller-level ability mapping for `action`.
    pub fn ability(mut self, action: impl Into<String>, ability: impl Into<Ability>) -> Self {
        self.abilities.insert(action, ability.into());
        self
    }

    pub fn without_model(mut self, action: impl Into<String>) -> Self {
        self.without_models.insert(action);
        self
    }

    pub fn with_policy_attributes(mut self, enabled: bool) -> Self {
        self.capabilities.policy_attributes = enabled;
        self
    }

    pub fn with_requirement_audit(mut self, enabled: bool) -> Self {
        self.capabilities.requirement_audit = enabled;
        self
    }

    /// Register an action. Registering the same name twice replaces it.
    pub fn action(mut self, action: ActionDefinition) -> Self {
        self.actions.retain(|a| a.name() != action.name());
        self.actions.push(action);
        self
    }

    /// Run the registration pass.
    pub fn build(self) -> ControllerPolicies {
        let mut abilities = self.abilities;
        let mut without_models = self.without_models;

        if self.capabilities.policy_attributes {
            for action in &self.actions {
                for policy in action.policies().iter().filter(|p| p.is_simple()) {
                    abilities.insert(action.name(), policy.ability.clone());
                    if !action.takes_model() {
                        without_models.insert(action.name());
                    }
                }
            }
        }

        let ability_map = AbilityMap::resource_defaults().merge(&abilities);
        let methods_without_models = MethodSet::resource_defaults().merge(&without_models);

        let coverage = if self.capabilities.requirement_audit {
            requirement::audit(&self.name, &self.actions, &ability_map)
        } else {
            self.actions
                .iter()
                .map(|a| (a.name().to_string(), Coverage::Unchecked))
                .collect()
        };

        let parameter = self
            .parameter
            .unwrap_or_else(|| self.model.parameter_name());

        tracing::debug!(
            controller = %self.name,
            model = %self.model,
            actions = self.actions.len(),
            "registered controller policies"
        );

        ControllerPolicies {
            name: self.name,
            model: self.model,
            parameter,
            capabilities: self.capabilities,
            ability_map,
            methods_without_models,
            actions: self
                .actions
                .into_iter()
                .map(|a| (a.name().to_string(), a))
                .collect(),
            coverage,
        }
    }
}
