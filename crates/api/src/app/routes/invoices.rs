use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use policygate_core::ModelKey;

use crate::app::errors;
use crate::app::models::{COMPANY, INVOICE, INVOICE_CONTROLLER};
use crate::app::routes::{guard, guarded, model_json};
use crate::app::services::AppServices;
use crate::context::{BoundModels, RequestInput};

#[derive(Debug, Deserialize)]
pub struct StoreInvoiceRequest {
    pub number: String,
    pub amount: i64,
}

pub fn router(services: &AppServices) -> anyhow::Result<Router> {
    let action = |name: &'static str| guard(services, INVOICE_CONTROLLER, name);

    Ok(Router::new()
        .route("/invoices", guarded(get(index), action("index")?))
        .route("/invoices/export", guarded(get(export), action("export")?))
        .route("/invoices/ping", guarded(get(ping), action("ping")?))
        .route("/invoices/approve", guarded(post(approve), action("approve")?))
        .route("/invoices/:invoice", guarded(get(show), action("show")?))
        .route("/invoices/:invoice/archive", guarded(post(archive), action("archive")?))
        .route(
            "/companies/:company/invoices",
            guarded(post(store_for_company), action("storeForCompany")?),
        ))
}

pub async fn index(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let invoices: Vec<_> = services.invoices.all().iter().map(model_json).collect();
    Json(invoices).into_response()
}

pub async fn show(Extension(bound): Extension<BoundModels>) -> axum::response::Response {
    match bound.model("invoice", &INVOICE) {
        Some(invoice) => Json(model_json(invoice)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub async fn store_for_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(bound): Extension<BoundModels>,
    Json(body): Json<StoreInvoiceRequest>,
) -> axum::response::Response {
    let Some(company) = bound.model("company", &COMPANY) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found");
    };

    let invoice = services.create_invoice(company, body.number, body.amount);
    tracing::info!(invoice = %invoice, company = %company, "invoice created");

    (StatusCode::CREATED, Json(model_json(&invoice))).into_response()
}

pub async fn approve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(input): Extension<RequestInput>,
) -> axum::response::Response {
    let Some(key) = input.get("invoice_id").and_then(ModelKey::from_input) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice_id");
    };
    let Some(invoice) = services.check.catalog().find(&INVOICE, &key) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found");
    };

    let mut attributes = invoice.attributes.clone();
    attributes["status"] = json!("approved");
    let approved = services.invoices.insert(invoice.key.clone(), attributes);

    (StatusCode::OK, Json(model_json(&approved))).into_response()
}

pub async fn export(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let rows: Vec<_> = services
        .invoices
        .all()
        .iter()
        .map(|invoice| {
            json!({
                "id": invoice.key.as_str(),
                "number": invoice.attribute("number"),
                "amount": invoice.attribute("amount"),
                "status": invoice.attribute("status"),
            })
        })
        .collect();
    Json(json!({ "invoices": rows })).into_response()
}

pub async fn ping() -> axum::response::Response {
    Json(json!({ "ok": true })).into_response()
}

/// Never reachable: the action has no policy coverage and is registered as
/// denied.
pub async fn archive(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(bound): Extension<BoundModels>,
) -> axum::response::Response {
    let Some(invoice) = bound.model("invoice", &INVOICE) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "not found");
    };

    let mut attributes = invoice.attributes.clone();
    attributes["status"] = json!("archived");
    let archived = services.invoices.insert(invoice.key.clone(), attributes);

    (StatusCode::OK, Json(model_json(&archived))).into_response()
}
