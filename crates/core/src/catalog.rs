//! Allow-list of application models.
//!
//! A model type is "recognized" only when it has been registered here. This
//! replaces namespace-prefix conventions with an explicit list, and doubles as
//! the registry of finders used for request-sourced lookups and route-model
//! binding.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::finder::ModelFinder;
use crate::id::ModelKey;
use crate::model::{ModelInstance, ModelType};

#[derive(Clone, Default)]
pub struct ModelCatalog {
    models: BTreeMap<ModelType, Option<Arc<dyn ModelFinder>>>,
    bindings: HashMap<String, ModelType>,
}

impl core::fmt::Debug for ModelCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModelCatalog")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize a model type without a finder (class-level checks only).
    pub fn recognize(mut self, model_type: ModelType) -> Self {
        self.models.entry(model_type).or_insert(None);
        self
    }

    /// Recognize a model type and register its finder. The type also becomes
    /// route-bindable under its conventional parameter name.
    pub fn model(self, model_type: ModelType, finder: Arc<dyn ModelFinder>) -> Self {
        let parameter = model_type.parameter_name();
        self.model_bound_as(model_type, parameter, finder)
    }

    /// Like [`ModelCatalog::model`] with an explicit route parameter name.
    pub fn model_bound_as(
        mut self,
        model_type: ModelType,
        parameter: impl Into<String>,
        finder: Arc<dyn ModelFinder>,
    ) -> Self {
        self.bindings.insert(parameter.into(), model_type.clone());
        self.models.insert(model_type, Some(finder));
        self
    }

    pub fn is_recognized(&self, model_type: &ModelType) -> bool {
        self.models.contains_key(model_type)
    }

    pub fn finder(&self, model_type: &ModelType) -> Option<&Arc<dyn ModelFinder>> {
        self.models.get(model_type)?.as_ref()
    }

    /// Load an instance through the registered finder.
    ///
    /// `None` when the type has no finder or the key does not exist.
    pub fn find(&self, model_type: &ModelType, key: &ModelKey) -> Option<ModelInstance> {
        let instance = self.finder(model_type)?.find(key)?;
        // A finder answering with another type is a wiring bug; never let it
        // satisfy an instance check for the requested type.
        if !instance.is_a(model_type) {
            tracing::warn!(
                requested = %model_type,
                returned = %instance.model_type,
                "model finder returned an instance of the wrong type"
            );
            return None;
        }
        Some(instance)
    }

    /// Model type bound to a route parameter name, if any.
    pub fn binding(&self, parameter: &str) -> Option<&ModelType> {
        self.bindings.get(parameter)
    }
}
