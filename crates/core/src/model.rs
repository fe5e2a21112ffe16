//! Model types, loaded instances and authorization targets.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::id::ModelKey;

/// Name of a model type (e.g. `App\Models\Invoice`).
///
/// Instance checks are plain equality on this value: a loaded
/// [`ModelInstance`] "is a" `T` iff its `model_type` equals `T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelType(Cow<'static, str>);

impl ModelType {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Like [`ModelType::new`] but rejects blank names.
    pub fn parse(name: &str) -> CoreResult<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidModelType(name.to_string()));
        }
        Ok(Self(Cow::Owned(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last namespace segment: `App\Models\Invoice` -> `Invoice`.
    pub fn basename(&self) -> &str {
        let name = self.as_str();
        name.rsplit(['\\', ':', '/']).next().unwrap_or(name)
    }

    /// Conventional route parameter name for this type: `Invoice` -> `invoice`,
    /// `LineItem` -> `line_item`.
    pub fn parameter_name(&self) -> String {
        let mut out = String::new();
        for (idx, ch) in self.basename().chars().enumerate() {
            if ch.is_uppercase() {
                if idx > 0 {
                    out.push('_');
                }
                out.extend(ch.to_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl core::fmt::Display for ModelType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInstance {
    pub model_type: ModelType,
    pub key: ModelKey,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl ModelInstance {
    pub fn new(model_type: ModelType, key: impl Into<ModelKey>) -> Self {
        Self {
            model_type,
            key: key.into(),
            attributes: serde_json::Value::Null,
        }
    }

    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn is_a(&self, model_type: &ModelType) -> bool {
        &self.model_type == model_type
    }

    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }
}

impl core::fmt::Display for ModelInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.model_type.basename(), self.key)
    }
}

/// What an ability is checked against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    /// Class-level check (e.g. "may create invoices at all").
    Class(ModelType),
    /// Instance-level check against a loaded model.
    Instance(ModelInstance),
    /// Class-level check scoped by a related instance
    /// (e.g. "may create invoices for Company #7").
    Scoped { model: ModelType, scope: ModelInstance },
}

impl Target {
    /// The model type whose policy governs this target.
    pub fn model_type(&self) -> &ModelType {
        match self {
            Target::Class(model) => model,
            Target::Instance(instance) => &instance.model_type,
            Target::Scoped { model, .. } => model,
        }
    }
}

impl core::fmt::Display for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Target::Class(model) => write!(f, "{}", model),
            Target::Instance(instance) => write!(f, "{}", instance),
            Target::Scoped { model, scope } => write!(f, "{} scoped by {}", model, scope),
        }
    }
}
