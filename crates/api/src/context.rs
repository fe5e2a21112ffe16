use serde_json::{Map, Value};

use policygate_auth::RouteParameter;
use policygate_core::{ModelInstance, ModelType};

/// Route parameters after model binding, in route order.
///
/// Inserted into request extensions by the policy middleware so handlers can
/// use the already-loaded models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundModels(Vec<RouteParameter>);

impl BoundModels {
    pub fn new(parameters: Vec<RouteParameter>) -> Self {
        Self(parameters)
    }

    /// The model bound under `name`, if it is of type `model_type`.
    pub fn model(&self, name: &str, model_type: &ModelType) -> Option<&ModelInstance> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_model())
            .filter(|instance| instance.is_a(model_type))
    }
}

/// Query and body input the policy check saw, body fields winning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInput(Map<String, Value>);

impl RequestInput {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}
