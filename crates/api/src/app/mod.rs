//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, catalog, gate and registered controllers
//! - `models.rs`: demo models, their policies and controller declarations
//! - `routes/`: HTTP routes + handlers (one file per controller)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod errors;
pub mod models;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config)?);
    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone(),
    };

    // Protected routes: require an authenticated principal. Each controller
    // action carries its own policy layer.
    let protected = routes::router(&services)?
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new()))
}
