use std::sync::Arc;

use axum::{routing::get, routing::MethodRouter, Router};
use serde_json::{json, Value};

use policygate_core::ModelInstance;

use crate::app::services::AppServices;
use crate::authz::ActionGuard;
use crate::middleware::policy_middleware;

pub mod companies;
pub mod invoices;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router(services: &Arc<AppServices>) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/whoami", get(system::whoami))
        .route("/_policies", get(system::policies))
        .merge(companies::router(services)?)
        .merge(invoices::router(services)?))
}

/// Guard for `action` of the registered controller `controller`.
pub fn guard(services: &AppServices, controller: &str, action: &'static str) -> anyhow::Result<ActionGuard> {
    Ok(ActionGuard::new(
        services.controllers.get(controller)?,
        action,
        services.check.clone(),
    ))
}

/// Put `route` behind route-model binding and the action's policy check.
pub fn guarded(route: MethodRouter, guard: ActionGuard) -> MethodRouter {
    route.layer(axum::middleware::from_fn_with_state(guard, policy_middleware))
}

/// `{"id": key, ...attributes}`
pub fn model_json(instance: &ModelInstance) -> Value {
    let mut out = json!({ "id": instance.key.as_str() });
    if let (Value::Object(out), Value::Object(attributes)) = (&mut out, &instance.attributes) {
        for (k, v) in attributes {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}
