use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{RawPathParams, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};

use policygate_auth::{Principal, RequestScope};

use crate::app::errors;
use crate::authz::{self, ActionGuard};
use crate::context::{BoundModels, RequestInput};

/// Upper bound on a request body buffered for policy input.
const MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Bearer token -> principal.
#[derive(Clone, Default)]
pub struct TokenTable {
    tokens: Arc<HashMap<String, Principal>>,
}

impl TokenTable {
    pub fn new(tokens: HashMap<String, Principal>) -> Self {
        Self {
            tokens: Arc::new(tokens),
        }
    }

    pub fn principal(&self, token: &str) -> Option<&Principal> {
        self.tokens.get(token)
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenTable,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let principal = state
        .tokens
        .principal(token)
        .cloned()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Route-model binding followed by the action's policy check.
///
/// Installed per route (see `app::routes::guarded`), so the action a request
/// targets is known from the layer state.
pub async fn policy_middleware(
    State(guard): State<ActionGuard>,
    Extension(principal): Extension<Principal>,
    params: RawPathParams,
    req: Request<Body>,
    next: Next,
) -> Response {
    let controller = guard.controller.name().to_string();

    let parameters = match authz::bind_route_parameters(guard.check.catalog(), params.iter()) {
        Ok(parameters) => parameters,
        Err(missing) => {
            tracing::debug!(
                parameter = %missing.parameter,
                key = %missing.key,
                "route model binding found no instance"
            );
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found");
        }
    };

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INPUT_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return errors::json_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "request body too large",
            );
        }
    };

    let input = authz::request_input(&parts, &bytes);
    let scope = RequestScope::new(controller, guard.action)
        .with_parameters(parameters.clone())
        .with_input(input.clone());

    if let Err(e) = guard.authorize(&scope, &principal) {
        tracing::info!(
            controller = scope.controller(),
            action = scope.action(),
            principal = %principal.principal_id,
            code = e.code(),
            "request denied by policy"
        );
        return errors::authz_error_to_response(&e);
    }

    let mut req = Request::from_parts(parts, Body::from(bytes));
    req.extensions_mut().insert(BoundModels::new(parameters));
    req.extensions_mut().insert(RequestInput::new(input));
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
