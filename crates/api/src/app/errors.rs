use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use policygate_auth::AuthzError;

/// Every policy failure, configuration problems included, is a 403.
pub fn authz_error_to_response(err: &AuthzError) -> axum::response::Response {
    let status = StatusCode::FORBIDDEN;
    match err {
        AuthzError::Denied { .. } => json_error(status, err.code(), "This action is unauthorized."),
        AuthzError::Policy(e) => json_error_with_diagnostic(status, err.code(), err.to_string(), e.diagnostic()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn json_error_with_diagnostic(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    diagnostic: String,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "diagnostic": diagnostic,
        })),
    )
        .into_response()
}
