//! JSON sidecar describing controllers and their declarations.
//!
//! ```json
//! {
//!   "controllers": [{
//!     "name": "InvoiceController",
//!     "model": "App\\Models\\Invoice",
//!     "abilities": { "publish": "publish" },
//!     "actions": [
//!       { "name": "updateInvoice",
//!         "policies": [{ "ability": "update", "model": "App\\Models\\Invoice",
//!                        "parameter": "App\\Models\\Company" }] },
//!       { "name": "sync",
//!         "policies": [{ "ability": "update",
//!                        "model": ["request:invoice_id", "App\\Models\\Invoice"] }] },
//!       { "name": "ping", "override": true }
//!     ]
//!   }]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use policygate_core::ModelType;

use crate::controller::{ActionDefinition, ControllerPolicies};
use crate::declaration::Policy;
use crate::error::ManifestError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub controllers: Vec<ControllerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerEntry {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub abilities: BTreeMap<String, String>,
    #[serde(default)]
    pub without_model: Vec<String>,
    #[serde(default = "enabled")]
    pub policy_attributes: bool,
    #[serde(default = "enabled")]
    pub requirement_audit: bool,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionEntry {
    pub name: String,
    #[serde(default)]
    pub policies: Vec<PolicyEntry>,
    #[serde(default, rename = "override")]
    pub override_requirement: bool,
    #[serde(default)]
    pub binds_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyEntry {
    pub ability: String,
    #[serde(default)]
    pub model: Option<ModelField>,
    #[serde(default)]
    pub parameter: Option<String>,
}

/// `"Type"` or `["request:field", "Type"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModelField {
    Type(String),
    Pair(Vec<String>),
}

fn enabled() -> bool {
    true
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Register every controller in the manifest.
    pub fn into_controllers(self) -> Result<Vec<ControllerPolicies>, ManifestError> {
        let mut names = BTreeSet::new();
        let mut out = Vec::with_capacity(self.controllers.len());
        for entry in self.controllers {
            if !names.insert(entry.name.clone()) {
                return Err(ManifestError::InvalidController {
                    controller: entry.name,
                    reason: "declared more than once".to_string(),
                });
            }
            out.push(entry.into_controller()?);
        }
        Ok(out)
    }
}

impl ControllerEntry {
    pub fn into_controller(self) -> Result<ControllerPolicies, ManifestError> {
        let invalid = |reason: String| ManifestError::InvalidController {
            controller: self.name.clone(),
            reason,
        };

        let model = ModelType::parse(&self.model).map_err(|e| invalid(e.to_string()))?;

        let mut seen = BTreeSet::new();
        for action in &self.actions {
            if !seen.insert(action.name.as_str()) {
                return Err(invalid(format!("action '{}' declared more than once", action.name)));
            }
        }

        let mut builder = ControllerPolicies::builder(self.name.clone(), model)
            .with_policy_attributes(self.policy_attributes)
            .with_requirement_audit(self.requirement_audit);
        if let Some(parameter) = &self.parameter {
            builder = builder.parameter(parameter.clone());
        }
        for (action, ability) in &self.abilities {
            builder = builder.ability(action.clone(), ability.clone());
        }
        for action in &self.without_model {
            builder = builder.without_model(action.clone());
        }
        for action in &self.actions {
            builder = builder.action(action.to_definition().map_err(&invalid)?);
        }
        Ok(builder.build())
    }
}

impl ActionEntry {
    fn to_definition(&self) -> Result<ActionDefinition, String> {
        let mut action = ActionDefinition::new(self.name.clone());
        for entry in &self.policies {
            action = action.policy(entry.to_policy()?);
        }
        if self.override_requirement {
            action = action.override_requirement();
        }
        if self.binds_model {
            action = action.binds_model();
        }
        Ok(action)
    }
}

impl PolicyEntry {
    fn to_policy(&self) -> Result<Policy, String> {
        let model_type = |name: &str| ModelType::parse(name).map_err(|e| e.to_string());

        let mut policy = Policy::new(self.ability.clone());
        policy = match &self.model {
            None => policy,
            Some(ModelField::Type(name)) => policy.on(model_type(name)?),
            // Source comes first, model type last; shape problems surface at resolution.
            Some(ModelField::Pair(parts)) => match parts.as_slice() {
                [] => policy,
                [source] => policy.from_source(source.clone(), None),
                [source, .., last] => policy.from_source(source.clone(), ModelType::parse(last).ok()),
            },
        };
        if let Some(parameter) = &self.parameter {
            policy = policy.scoped_by(model_type(parameter)?);
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coverage, ModelSpec};

    const MANIFEST: &str = r#"{
      "controllers": [{
        "name": "InvoiceController",
        "model": "App\\Models\\Invoice",
        "abilities": { "publish": "publish" },
        "without_model": ["report"],
        "actions": [
          { "name": "updateInvoice",
            "policies": [{ "ability": "update", "model": "App\\Models\\Invoice",
                           "parameter": "App\\Models\\Company" }] },
          { "name": "sync",
            "policies": [{ "ability": "update",
                           "model": ["request:invoice_id", "App\\Models\\Invoice"] }] },
          { "name": "half", "policies": [{ "ability": "update", "model": ["request:invoice_id"] }] },
          { "name": "export", "policies": [{ "ability": "export" }] },
          { "name": "ping", "override": true },
          { "name": "archive" }
        ]
      }]
    }"#;

    fn controller() -> ControllerPolicies {
        Manifest::from_json(MANIFEST)
            .unwrap()
            .into_controllers()
            .unwrap()
            .remove(0)
    }

    #[test]
    fn manifest_builds_the_same_shapes_as_the_builder() {
        let c = controller();
        let invoice = ModelType::new("App\\Models\\Invoice");
        let company = ModelType::new("App\\Models\\Company");

        let update = &c.action("updateInvoice").unwrap().policies()[0];
        assert_eq!(update, &Policy::new("update").on(invoice.clone()).scoped_by(company));

        let sync = &c.action("sync").unwrap().policies()[0];
        assert_eq!(sync, &Policy::new("update").from_request("invoice_id", invoice));

        let half = &c.action("half").unwrap().policies()[0];
        assert!(matches!(&half.model, ModelSpec::Request { model: None, .. }));

        assert_eq!(c.ability_map().get("publish").map(|a| a.as_str()), Some("publish"));
        assert_eq!(c.ability_map().get("export").map(|a| a.as_str()), Some("export"));
        assert!(c.methods_without_models().contains("report"));
    }

    #[test]
    fn manifest_controllers_are_audited() {
        let c = controller();
        assert_eq!(c.coverage("ping"), Coverage::Exempt);
        assert_eq!(c.coverage("archive"), Coverage::Denied);
        assert_eq!(c.coverage("sync"), Coverage::AttributeCovered);
    }

    #[test]
    fn pair_takes_the_last_element_as_model_type() {
        let json = r#"{"controllers": [{"name": "C", "model": "App\\Models\\Invoice",
            "actions": [{"name": "sync", "policies": [{"ability": "update",
                "model": ["request:id", "App\\Models\\Invoice", "App\\Models\\Company"]}]}]}]}"#;
        let c = Manifest::from_json(json).unwrap().into_controllers().unwrap().remove(0);

        let sync = &c.action("sync").unwrap().policies()[0];
        assert_eq!(
            sync,
            &Policy::new("update").from_request("id", ModelType::new("App\\Models\\Company"))
        );
    }

    #[test]
    fn empty_pair_is_a_simple_declaration() {
        let json = r#"{"controllers": [{"name": "C", "model": "App\\Models\\Invoice",
            "actions": [{"name": "publish", "policies": [{"ability": "publish", "model": []}]}]}]}"#;
        let c = Manifest::from_json(json).unwrap().into_controllers().unwrap().remove(0);

        let publish = &c.action("publish").unwrap().policies()[0];
        assert!(publish.is_simple());
        assert_eq!(c.ability_map().get("publish").map(|a| a.as_str()), Some("publish"));
        assert_eq!(c.coverage("publish"), Coverage::AttributeCovered);
    }

    #[test]
    fn duplicate_actions_are_rejected() {
        let json = r#"{"controllers": [{"name": "C", "model": "M",
            "actions": [{"name": "a"}, {"name": "a"}]}]}"#;
        let err = Manifest::from_json(json).unwrap().into_controllers().unwrap_err();
        assert!(matches!(err, ManifestError::InvalidController { .. }));
    }

    #[test]
    fn blank_model_is_rejected() {
        let json = r#"{"controllers": [{"name": "C", "model": " "}]}"#;
        let err = Manifest::from_json(json).unwrap().into_controllers().unwrap_err();
        assert!(err.to_string().contains("invalid controller 'C'"));
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let json = r#"{"controllers": [{"name": "C", "model": "M", "polices": []}]}"#;
        assert!(matches!(Manifest::from_json(json), Err(ManifestError::Parse(_))));
    }
}
