use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::app::errors;
use crate::app::models::{COMPANY, COMPANY_CONTROLLER};
use crate::app::routes::{guard, guarded, model_json};
use crate::app::services::AppServices;
use crate::context::BoundModels;

#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: String,
}

pub fn router(services: &AppServices) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/companies", guarded(get(index), guard(services, COMPANY_CONTROLLER, "index")?))
        .route(
            "/companies/:company",
            guarded(get(show), guard(services, COMPANY_CONTROLLER, "show")?)
                .merge(guarded(put(update), guard(services, COMPANY_CONTROLLER, "update")?)),
        ))
}

pub async fn index(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let companies: Vec<_> = services.companies.all().iter().map(model_json).collect();
    Json(companies).into_response()
}

pub async fn show(Extension(bound): Extension<BoundModels>) -> axum::response::Response {
    match bound.model("company", &COMPANY) {
        Some(company) => Json(model_json(company)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(bound): Extension<BoundModels>,
    Json(body): Json<UpdateCompanyRequest>,
) -> axum::response::Response {
    let Some(company) = bound.model("company", &COMPANY) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found");
    };

    let mut attributes = company.attributes.clone();
    attributes["name"] = serde_json::Value::String(body.name);
    let updated = services.companies.insert(company.key.clone(), attributes);

    (StatusCode::OK, Json(model_json(&updated))).into_response()
}
