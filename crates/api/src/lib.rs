//! HTTP API: route-model binding, per-action policy enforcement and a demo
//! invoicing application wired through both.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;

pub use config::ApiConfig;
