use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use policygate_auth::{CoverageReport, Principal};

use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<Principal>) -> impl IntoResponse {
    Json(serde_json::json!({
        "principal_id": principal.principal_id.to_string(),
        "permissions": principal.permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
    }))
}

/// Coverage of every registered controller action.
pub async fn policies(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let now = Utc::now();
    let reports: Vec<CoverageReport> = services
        .controllers
        .iter()
        .map(|controller| CoverageReport::for_controller(controller, now))
        .collect();
    Json(reports)
}
