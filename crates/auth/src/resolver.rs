//! Turns a complex declaration into the concrete `(ability, target)` pair.

use policygate_core::{ModelCatalog, ModelKey, ModelType, Target};

use crate::declaration::{ModelSpec, Policy, REQUEST_SOURCE};
use crate::error::PolicyError;
use crate::scope::RequestScope;
use crate::Ability;

/// Result of resolving one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub ability: Ability,
    pub target: Target,
}

/// Resolve a complex declaration against the current request.
///
/// Route-bound instances of the declared type always win over catalog
/// inference. Simple declarations have nothing to resolve and are reported as
/// malformed; the dispatcher never passes them here.
pub fn resolve(
    policy: &Policy,
    scope: &RequestScope,
    catalog: &ModelCatalog,
) -> Result<Resolution, PolicyError> {
    match &policy.model {
        ModelSpec::None => Err(malformed(scope)),
        ModelSpec::Request { source, model } => {
            resolve_from_request(policy, source, model.as_ref(), scope, catalog)
        }
        ModelSpec::Type { model } => resolve_from_type(policy, model, scope, catalog),
    }
}

fn resolve_from_request(
    policy: &Policy,
    source: &str,
    model: Option<&ModelType>,
    scope: &RequestScope,
    catalog: &ModelCatalog,
) -> Result<Resolution, PolicyError> {
    let (Some(field), Some(model)) = (source.strip_prefix(REQUEST_SOURCE), model) else {
        return Err(malformed(scope));
    };

    if catalog.finder(model).is_none() {
        return Err(unrecognized(scope, model));
    }

    let key = scope.input(field).and_then(ModelKey::from_input);
    let Some(key) = key else {
        tracing::debug!(field, model = %model, "request input missing for policy lookup");
        return Err(not_found(scope));
    };

    match catalog.find(model, &key) {
        Some(instance) => Ok(Resolution {
            ability: policy.ability.clone(),
            target: Target::Instance(instance),
        }),
        None => {
            tracing::debug!(field, key = %key, model = %model, "policy target not found");
            Err(not_found(scope))
        }
    }
}

fn resolve_from_type(
    policy: &Policy,
    model: &ModelType,
    scope: &RequestScope,
    catalog: &ModelCatalog,
) -> Result<Resolution, PolicyError> {
    if let Some(instance) = scope.bound_instance_of(model) {
        return Ok(Resolution {
            ability: policy.ability.clone(),
            target: Target::Instance(instance.clone()),
        });
    }

    if !catalog.is_recognized(model) {
        return Err(unrecognized(scope, model));
    }

    let scoped = policy
        .parameter
        .as_ref()
        .and_then(|parameter| scope.bound_instance_of(parameter));

    let target = match scoped {
        Some(related) => Target::Scoped {
            model: model.clone(),
            scope: related.clone(),
        },
        None => Target::Class(model.clone()),
    };

    Ok(Resolution {
        ability: policy.ability.clone(),
        target,
    })
}

fn malformed(scope: &RequestScope) -> PolicyError {
    PolicyError::MalformedDeclaration {
        controller: scope.controller().to_string(),
        action: scope.action().to_string(),
    }
}

fn not_found(scope: &RequestScope) -> PolicyError {
    PolicyError::TargetNotFound {
        controller: scope.controller().to_string(),
        action: scope.action().to_string(),
    }
}

fn unrecognized(scope: &RequestScope, model: &ModelType) -> PolicyError {
    PolicyError::UnrecognizedModel {
        controller: scope.controller().to_string(),
        action: scope.action().to_string(),
        model: model.to_string(),
    }
}
