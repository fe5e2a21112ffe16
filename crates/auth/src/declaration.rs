//! Policy declarations attached to controller actions.

use serde::{Deserialize, Serialize};

use policygate_core::ModelType;

use crate::Ability;

/// Prefix marking a model source whose instance is loaded from request input.
pub const REQUEST_SOURCE: &str = "request:";

/// Which model a declaration authorizes against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Simple declaration: the ability only feeds the action's ability map.
    #[default]
    None,
    /// A model type; resolved from route bindings or as a class-level check.
    Type { model: ModelType },
    /// Instance loaded from a request input field, e.g. `request:invoice_id`.
    ///
    /// `model` may be absent so that a half-written declaration is still
    /// representable and reported as malformed at resolution time.
    Request {
        source: String,
        model: Option<ModelType>,
    },
}

/// One authorization declaration on an action. Actions may carry several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub ability: Ability,
    #[serde(default)]
    pub model: ModelSpec,
    /// Related route-bound model used to scope a class-level check.
    #[serde(default)]
    pub parameter: Option<ModelType>,
}

impl Policy {
    pub fn new(ability: impl Into<Ability>) -> Self {
        Self {
            ability: ability.into(),
            model: ModelSpec::None,
            parameter: None,
        }
    }

    /// Authorize against `model` (route-bound instance, else the class).
    pub fn on(mut self, model: ModelType) -> Self {
        self.model = ModelSpec::Type { model };
        self
    }

    /// Authorize against the `model` instance whose key is in input `field`.
    pub fn from_request(self, field: &str, model: ModelType) -> Self {
        self.from_source(format!("{REQUEST_SOURCE}{field}"), Some(model))
    }

    /// Raw two-element form `(source, model)`.
    pub fn from_source(mut self, source: impl Into<String>, model: Option<ModelType>) -> Self {
        self.model = ModelSpec::Request {
            source: source.into(),
            model,
        };
        self
    }

    /// Scope a class-level check by a route-bound instance of `parameter`.
    pub fn scoped_by(mut self, parameter: ModelType) -> Self {
        self.parameter = Some(parameter);
        self
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.model, ModelSpec::None)
    }

    pub fn is_complex(&self) -> bool {
        !self.is_simple()
    }
}

impl From<&'static str> for Policy {
    fn from(ability: &'static str) -> Self {
        Policy::new(ability)
    }
}

/// Exempts an action from the coverage requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequirementOverride;
