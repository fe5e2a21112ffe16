//! Authorization backend seam.
//!
//! The policy layer decides *what* to check; a [`Gate`] decides whether the
//! principal may do it. [`PolicyRegistry`] is a closure-backed gate suitable
//! for applications that keep their policies in code.

use std::collections::HashMap;
use std::sync::Arc;

use policygate_core::{ModelType, Target};

use crate::{Ability, AuthzError, Principal};

/// "Can `principal` perform `ability` on `target`?"
pub trait Gate: Send + Sync {
    fn allows(&self, principal: &Principal, ability: &Ability, target: &Target) -> bool;
}

/// Run one check through `gate`, mapping a refusal to [`AuthzError::Denied`].
///
/// - No IO of its own
/// - No panics
pub fn authorize(
    gate: &dyn Gate,
    principal: &Principal,
    ability: &Ability,
    target: &Target,
) -> Result<(), AuthzError> {
    if gate.allows(principal, ability, target) {
        Ok(())
    } else {
        Err(AuthzError::Denied {
            ability: ability.clone(),
            target: target.to_string(),
        })
    }
}

type PolicyFn = dyn Fn(&Principal, &Target) -> bool + Send + Sync;
type BeforeFn = dyn Fn(&Principal, &Ability, &Target) -> Option<bool> + Send + Sync;

/// Policies keyed by model type and ability.
///
/// Evaluation order:
/// 1. `before` hooks in registration order; the first `Some` decides.
/// 2. The policy registered for `(target.model_type(), ability)`.
/// 3. Anything else is denied.
#[derive(Clone)]
pub struct PolicyRegistry {
    before: Vec<Arc<BeforeFn>>,
    policies: HashMap<ModelType, HashMap<Ability, Arc<PolicyFn>>>,
}

impl core::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let abilities: HashMap<&ModelType, Vec<&Ability>> = self
            .policies
            .iter()
            .map(|(model, abilities)| (model, abilities.keys().collect()))
            .collect();
        f.debug_struct("PolicyRegistry")
            .field("before_hooks", &self.before.len())
            .field("policies", &abilities)
            .finish()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRegistry {
    /// Empty registry with the wildcard hook installed: principals holding
    /// `"*"` are allowed everything.
    pub fn new() -> Self {
        Self::empty().before(|principal, _ability, _target| principal.has_wildcard().then_some(true))
    }

    /// Registry without any hooks.
    pub fn empty() -> Self {
        Self {
            before: Vec::new(),
            policies: HashMap::new(),
        }
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Principal, &Ability, &Target) -> Option<bool> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Register the policy method `ability` for `model`.
    pub fn define<F>(mut self, model: ModelType, ability: impl Into<Ability>, policy: F) -> Self
    where
        F: Fn(&Principal, &Target) -> bool + Send + Sync + 'static,
    {
        self.policies
            .entry(model)
            .or_default()
            .insert(ability.into(), Arc::new(policy));
        self
    }

    /// Shorthand for a policy that only requires a named permission.
    pub fn permission(
        self,
        model: ModelType,
        ability: impl Into<Ability>,
        permission: impl Into<String>,
    ) -> Self {
        let permission = permission.into();
        self.define(model, ability, move |principal, _target| {
            principal.has_permission(&permission)
        })
    }
}

impl Gate for PolicyRegistry {
    fn allows(&self, principal: &Principal, ability: &Ability, target: &Target) -> bool {
        for hook in &self.before {
            if let Some(decision) = hook(principal, ability, target) {
                return decision;
            }
        }

        match self
            .policies
            .get(target.model_type())
            .and_then(|abilities| abilities.get(ability))
        {
            Some(policy) => policy(principal, target),
            None => {
                tracing::debug!(
                    model = %target.model_type(),
                    ability = %ability,
                    "no policy registered; denying"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use policygate_core::{ModelInstance, PrincipalId};

    use super::*;
    use crate::Permission;

    fn invoice() -> ModelType {
        ModelType::new("App\\Models\\Invoice")
    }

    fn principal(permissions: &[&'static str]) -> Principal {
        Principal::new(
            PrincipalId::new(),
            permissions.iter().map(|p| Permission::new(*p)).collect(),
        )
    }

    #[test]
    fn wildcard_principal_is_allowed_everything() {
        let gate = PolicyRegistry::new();
        let admin = principal(&["*"]);
        assert!(gate.allows(&admin, &Ability::new("delete"), &Target::Class(invoice())));
    }

    #[test]
    fn unknown_abilities_are_denied() {
        let gate = PolicyRegistry::new().permission(invoice(), "view", "invoices.view");
        let user = principal(&["invoices.view"]);

        assert!(gate.allows(&user, &Ability::new("view"), &Target::Class(invoice())));
        let err = authorize(&gate, &user, &Ability::new("update"), &Target::Class(invoice()))
            .unwrap_err();
        assert_eq!(
            err,
            AuthzError::Denied {
                ability: Ability::new("update"),
                target: "App\\Models\\Invoice".into(),
            }
        );
    }

    #[test]
    fn instance_policies_see_the_target() {
        let gate = PolicyRegistry::empty().define(invoice(), "update", |_principal, target| {
            matches!(target, Target::Instance(i) if i.attribute("locked") != Some(&serde_json::json!(true)))
        });
        let user = principal(&[]);
        let open = ModelInstance::new(invoice(), 1u64);
        let locked = ModelInstance::new(invoice(), 2u64).with_attributes(serde_json::json!({"locked": true}));

        assert!(gate.allows(&user, &Ability::new("update"), &Target::Instance(open)));
        assert!(!gate.allows(&user, &Ability::new("update"), &Target::Instance(locked)));
    }

    #[test]
    fn first_decisive_before_hook_wins() {
        let gate = PolicyRegistry::empty()
            .before(|_, ability, _| (ability.as_str() == "delete").then_some(false))
            .before(|_, _, _| Some(true));
        let user = principal(&[]);

        assert!(!gate.allows(&user, &Ability::new("delete"), &Target::Class(invoice())));
        assert!(gate.allows(&user, &Ability::new("view"), &Target::Class(invoice())));
    }
}
