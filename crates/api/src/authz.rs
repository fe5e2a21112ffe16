//! API-side policy enforcement for controller actions.
//!
//! This turns an HTTP request into the [`RequestScope`] the policy layer
//! understands (route-model binding + merged input) and runs the
//! [`PolicyCheck`] for the action the route is mapped to.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::request::Parts;
use axum::http::header;
use serde_json::{Map, Value};

use policygate_auth::{AuthzError, BoundValue, ControllerPolicies, PolicyCheck, Principal, RequestScope, RouteParameter};
use policygate_core::{ModelCatalog, ModelKey};

/// The controller action a route is mapped to, plus what is needed to guard it.
#[derive(Clone)]
pub struct ActionGuard {
    pub controller: Arc<ControllerPolicies>,
    pub action: &'static str,
    pub check: PolicyCheck,
}

impl ActionGuard {
    pub fn new(controller: Arc<ControllerPolicies>, action: &'static str, check: PolicyCheck) -> Self {
        Self {
            controller,
            action,
            check,
        }
    }

    pub fn authorize(&self, scope: &RequestScope, principal: &Principal) -> Result<(), AuthzError> {
        self.check.check(&self.controller, scope, principal)
    }
}

/// A path parameter named after a bindable model did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingBinding {
    pub parameter: String,
    pub key: String,
}

/// Route-model binding: path parameters registered in the catalog are loaded
/// through their finder; all others stay raw. Route order is preserved.
pub fn bind_route_parameters<'a, I>(
    catalog: &ModelCatalog,
    params: I,
) -> Result<Vec<RouteParameter>, MissingBinding>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    params
        .into_iter()
        .map(|(name, raw)| {
            let value = match catalog.binding(name) {
                Some(model_type) => {
                    let instance = catalog
                        .find(model_type, &ModelKey::new(raw))
                        .ok_or_else(|| MissingBinding {
                            parameter: name.to_string(),
                            key: raw.to_string(),
                        })?;
                    BoundValue::Model(instance)
                }
                None => BoundValue::Raw(raw.to_string()),
            };
            Ok(RouteParameter {
                name: name.to_string(),
                value,
            })
        })
        .collect()
}

/// Merge query-string input with a JSON or form-encoded body; body fields win.
pub fn request_input(parts: &Parts, body: &[u8]) -> Map<String, Value> {
    let mut input: Map<String, Value> = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(query)| query.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
        .unwrap_or_default();

    if body.is_empty() {
        return input;
    }

    if has_content_type(parts, "application/json") {
        match serde_json::from_slice::<Map<String, Value>>(body) {
            Ok(fields) => input.extend(fields),
            Err(e) => tracing::debug!(error = %e, "request body is not a JSON object; ignoring for policy input"),
        }
    } else if has_content_type(parts, "application/x-www-form-urlencoded") {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(fields) => input.extend(fields.into_iter().map(|(k, v)| (k, Value::String(v)))),
            Err(e) => tracing::debug!(error = %e, "request body is not valid form data; ignoring for policy input"),
        }
    }

    input
}

fn has_content_type(parts: &Parts, mime: &str) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(mime))
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use policygate_core::{InMemoryModelStore, ModelType};
    use serde_json::json;

    use super::*;

    fn catalog() -> ModelCatalog {
        let invoices = Arc::new(InMemoryModelStore::new(ModelType::new("App\\Models\\Invoice")));
        invoices.insert(42u64, json!({}));
        ModelCatalog::new().model(ModelType::new("App\\Models\\Invoice"), invoices)
    }

    #[test]
    fn binds_known_parameters_and_keeps_the_rest_raw() {
        let bound = bind_route_parameters(&catalog(), [("invoice", "42"), ("format", "pdf")]).unwrap();
        assert!(matches!(&bound[0].value, BoundValue::Model(i) if i.key.as_str() == "42"));
        assert_eq!(bound[1].value, BoundValue::Raw("pdf".into()));
    }

    #[test]
    fn missing_model_is_reported() {
        let err = bind_route_parameters(&catalog(), [("invoice", "9")]).unwrap_err();
        assert_eq!(
            err,
            MissingBinding {
                parameter: "invoice".into(),
                key: "9".into(),
            }
        );
    }

    #[test]
    fn body_input_overrides_query_input() {
        let (parts, _) = Request::builder()
            .uri("/invoices/approve?invoice_id=1&note=hi")
            .header(header::CONTENT_TYPE, "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let input = request_input(&parts, br#"{"invoice_id": 42}"#);
        assert_eq!(input.get("invoice_id"), Some(&json!(42)));
        assert_eq!(input.get("note"), Some(&json!("hi")));
    }

    #[test]
    fn non_json_bodies_are_ignored() {
        let (parts, _) = Request::builder()
            .uri("/x")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(())
            .unwrap()
            .into_parts();
        assert!(request_input(&parts, b"invoice_id=1").is_empty());
    }

    #[test]
    fn form_body_input_overrides_query_input() {
        let (parts, _) = Request::builder()
            .uri("/invoices/approve?invoice_id=1&note=hi")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
            .body(())
            .unwrap()
            .into_parts();

        let input = request_input(&parts, b"invoice_id=42&memo=paid+in+full");
        assert_eq!(input.get("invoice_id"), Some(&json!("42")));
        assert_eq!(input.get("memo"), Some(&json!("paid in full")));
        assert_eq!(input.get("note"), Some(&json!("hi")));
    }
}
