//! Per-request view handed to the resolver and dispatcher.

use serde_json::{Map, Value};

use policygate_core::{ModelInstance, ModelType};

/// A route parameter after route-model binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Model(ModelInstance),
    Raw(String),
}

impl BoundValue {
    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            BoundValue::Model(instance) => Some(instance),
            BoundValue::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteParameter {
    pub name: String,
    pub value: BoundValue,
}

/// The request as the policy layer sees it.
///
/// `parameters` keep route order; `input` is the merged query/body input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestScope {
    controller: String,
    action: String,
    parameters: Vec<RouteParameter>,
    input: Map<String, Value>,
}

impl RequestScope {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn bind(mut self, name: impl Into<String>, instance: ModelInstance) -> Self {
        self.parameters.push(RouteParameter {
            name: name.into(),
            value: BoundValue::Model(instance),
        });
        self
    }

    pub fn raw(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(RouteParameter {
            name: name.into(),
            value: BoundValue::Raw(value.into()),
        });
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<RouteParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_input(mut self, input: Map<String, Value>) -> Self {
        self.input = input;
        self
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn parameters(&self) -> &[RouteParameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&BoundValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// First bound parameter (in route order) that is an instance of `model_type`.
    pub fn bound_instance_of(&self, model_type: &ModelType) -> Option<&ModelInstance> {
        self.parameters
            .iter()
            .filter_map(|p| p.value.as_model())
            .find(|instance| instance.is_a(model_type))
    }

    /// Read an input field. Dotted names walk nested objects
    /// (`invoice.id` -> `{"invoice": {"id": ..}}`) when no flat key matches.
    pub fn input(&self, field: &str) -> Option<&Value> {
        if let Some(value) = self.input.get(field) {
            return Some(value);
        }
        let mut parts = field.split('.');
        let mut current = self.input.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}
