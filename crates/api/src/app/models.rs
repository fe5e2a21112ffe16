//! Demo application models, policies and controllers.

use policygate_auth::{ActionDefinition, ControllerPolicies, Policy, PolicyRegistry, Principal};
use policygate_core::{ModelInstance, ModelType, Target};

pub const COMPANY: ModelType = ModelType::from_static("App\\Models\\Company");
pub const INVOICE: ModelType = ModelType::from_static("App\\Models\\Invoice");

pub const COMPANY_CONTROLLER: &str = "CompanyController";
pub const INVOICE_CONTROLLER: &str = "InvoiceController";

pub fn company_controller() -> ControllerPolicies {
    ControllerPolicies::builder(COMPANY_CONTROLLER, COMPANY)
        .action(ActionDefinition::new("index"))
        .action(ActionDefinition::new("show").binds_model())
        .action(ActionDefinition::new("update").binds_model())
        .build()
}

pub fn invoice_controller() -> ControllerPolicies {
    ControllerPolicies::builder(INVOICE_CONTROLLER, INVOICE)
        .action(ActionDefinition::new("index"))
        .action(ActionDefinition::new("show").binds_model())
        .action(
            ActionDefinition::new("storeForCompany")
                .policy(Policy::new("create").on(INVOICE).scoped_by(COMPANY)),
        )
        .action(
            ActionDefinition::new("approve")
                .policy(Policy::new("approve").from_request("invoice_id", INVOICE)),
        )
        .action(ActionDefinition::new("export").policy("export"))
        .action(ActionDefinition::new("ping").override_requirement())
        // Deliberately uncovered: registered as denied.
        .action(ActionDefinition::new("archive").binds_model())
        .build()
}

pub fn gate() -> PolicyRegistry {
    PolicyRegistry::new()
        .permission(COMPANY, "viewAny", "companies.view")
        .permission(COMPANY, "view", "companies.view")
        .define(COMPANY, "update", |principal, target| {
            matches!(target, Target::Instance(company) if owns(principal, company))
        })
        .permission(INVOICE, "viewAny", "invoices.view")
        .permission(INVOICE, "view", "invoices.view")
        .define(INVOICE, "create", |principal, target| {
            matches!(target, Target::Scoped { scope, .. } if owns(principal, scope))
        })
        .define(INVOICE, "approve", |principal, target| {
            principal.has_permission("invoices.approve")
                && matches!(target, Target::Instance(invoice)
                    if invoice.attribute("status").and_then(|s| s.as_str()) == Some("draft"))
        })
        .permission(INVOICE, "export", "invoices.export")
}

fn owns(principal: &Principal, company: &ModelInstance) -> bool {
    company
        .attribute("owner_id")
        .and_then(|v| v.as_str())
        .is_some_and(|owner| owner == principal.principal_id.to_string())
}
