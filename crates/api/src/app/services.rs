//! Service wiring: model stores, the model catalog, the gate, registered
//! controllers and demo principals.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use uuid::Uuid;

use policygate_auth::{ControllerPolicies, Manifest, Permission, PolicyCheck, Principal};
use policygate_core::{InMemoryModelStore, ModelCatalog, ModelInstance, PrincipalId};

use crate::app::models::{self, COMPANY, INVOICE};
use crate::config::ApiConfig;
use crate::middleware::TokenTable;

/// Registered controllers by name.
#[derive(Debug, Clone, Default)]
pub struct ControllerTable(BTreeMap<String, Arc<ControllerPolicies>>);

impl ControllerTable {
    pub fn insert(&mut self, controller: ControllerPolicies) {
        self.0.insert(controller.name().to_string(), Arc::new(controller));
    }

    pub fn get(&self, name: &str) -> anyhow::Result<Arc<ControllerPolicies>> {
        self.0
            .get(name)
            .cloned()
            .with_context(|| format!("controller '{name}' is not registered"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ControllerPolicies>> {
        self.0.values()
    }
}

pub struct AppServices {
    pub companies: Arc<InMemoryModelStore>,
    pub invoices: Arc<InMemoryModelStore>,
    pub check: PolicyCheck,
    pub controllers: ControllerTable,
    pub tokens: TokenTable,
    next_invoice: AtomicU64,
}

impl AppServices {
    /// Allocate the key of a new invoice.
    pub fn next_invoice_key(&self) -> u64 {
        self.next_invoice.fetch_add(1, Ordering::SeqCst)
    }

    pub fn create_invoice(&self, company: &ModelInstance, number: String, amount: i64) -> ModelInstance {
        let key = self.next_invoice_key();
        self.invoices.insert(
            key,
            json!({
                "company_id": company.key.as_str(),
                "number": number,
                "amount": amount,
                "status": "draft",
            }),
        )
    }
}

/// Fixed identities of the demo principals.
pub mod demo {
    use super::*;

    pub const ADMIN_TOKEN: &str = "admin-token";
    pub const OWNER_TOKEN: &str = "owner-token";
    pub const CLERK_TOKEN: &str = "clerk-token";

    pub fn owner_id() -> PrincipalId {
        PrincipalId::from_uuid(Uuid::from_u128(1))
    }

    pub fn clerk_id() -> PrincipalId {
        PrincipalId::from_uuid(Uuid::from_u128(2))
    }

    pub fn tokens() -> TokenTable {
        let mut tokens = HashMap::new();
        tokens.insert(
            ADMIN_TOKEN.to_string(),
            Principal::new(PrincipalId::from_uuid(Uuid::from_u128(100)), vec![Permission::wildcard()]),
        );
        tokens.insert(
            OWNER_TOKEN.to_string(),
            Principal::new(
                owner_id(),
                vec![Permission::new("companies.view"), Permission::new("invoices.view")],
            ),
        );
        tokens.insert(
            CLERK_TOKEN.to_string(),
            Principal::new(
                clerk_id(),
                vec![
                    Permission::new("invoices.view"),
                    Permission::new("invoices.approve"),
                    Permission::new("invoices.export"),
                ],
            ),
        );
        TokenTable::new(tokens)
    }

    /// Company 7 belongs to the owner, company 8 to the clerk.
    /// Invoice 42 (company 7) is a draft, invoice 43 (company 8) is approved.
    pub fn seed(companies: &InMemoryModelStore, invoices: &InMemoryModelStore) {
        companies.insert(7u64, json!({"name": "Acme", "owner_id": owner_id().to_string()}));
        companies.insert(8u64, json!({"name": "Globex", "owner_id": clerk_id().to_string()}));
        invoices.insert(
            42u64,
            json!({"company_id": "7", "number": "INV-42", "amount": 1200, "status": "draft"}),
        );
        invoices.insert(
            43u64,
            json!({"company_id": "8", "number": "INV-43", "amount": 300, "status": "approved"}),
        );
    }
}

pub fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let companies = Arc::new(InMemoryModelStore::new(COMPANY));
    let invoices = Arc::new(InMemoryModelStore::new(INVOICE));
    demo::seed(&companies, &invoices);

    let catalog = ModelCatalog::new()
        .model(COMPANY, companies.clone())
        .model(INVOICE, invoices.clone());

    let mut controllers = ControllerTable::default();
    controllers.insert(models::company_controller());
    controllers.insert(models::invoice_controller());

    if let Some(path) = &config.manifest {
        let manifest = Manifest::from_path(path)
            .with_context(|| format!("loading policy manifest {}", path.display()))?;
        for controller in manifest.into_controllers()? {
            tracing::info!(controller = controller.name(), "controller declarations loaded from manifest");
            controllers.insert(controller);
        }
    }

    let check = PolicyCheck::new(Arc::new(models::gate()), Arc::new(catalog));

    Ok(AppServices {
        companies,
        invoices,
        check,
        controllers,
        tokens: demo::tokens(),
        next_invoice: AtomicU64::new(1000),
    })
}
