//! Model lookup seam.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::id::ModelKey;
use crate::model::{ModelInstance, ModelType};

/// Loads instances of one model type by key.
///
/// This is a storage collaborator: a database-backed implementation may block
/// on IO. Errors from the store are folded into `None` ("not found"), which
/// callers treat as a denial.
pub trait ModelFinder: Send + Sync {
    fn find(&self, key: &ModelKey) -> Option<ModelInstance>;
}

impl<F> ModelFinder for F
where
    F: Fn(&ModelKey) -> Option<ModelInstance> + Send + Sync,
{
    fn find(&self, key: &ModelKey) -> Option<ModelInstance> {
        self(key)
    }
}

/// In-memory finder for a single model type.
///
/// Intended for tests and the demo application.
#[derive(Debug)]
pub struct InMemoryModelStore {
    model_type: ModelType,
    rows: RwLock<HashMap<ModelKey, serde_json::Value>>,
}

impl InMemoryModelStore {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn insert(&self, key: impl Into<ModelKey>, attributes: serde_json::Value) -> ModelInstance {
        let key = key.into();
        let mut rows = self.rows.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        rows.insert(key.clone(), attributes.clone());
        ModelInstance::new(self.model_type.clone(), key).with_attributes(attributes)
    }

    /// Every stored instance, ordered by key.
    pub fn all(&self) -> Vec<ModelInstance> {
        let Ok(rows) = self.rows.read() else {
            return Vec::new();
        };
        let mut out: Vec<ModelInstance> = rows
            .iter()
            .map(|(key, attributes)| {
                ModelInstance::new(self.model_type.clone(), key.clone()).with_attributes(attributes.clone())
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelFinder for InMemoryModelStore {
    fn find(&self, key: &ModelKey) -> Option<ModelInstance> {
        let rows = self.rows.read().ok()?;
        let attributes = rows.get(key)?.clone();
        Some(ModelInstance::new(self.model_type.clone(), key.clone()).with_attributes(attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_inserted_rows_only() {
        let store = InMemoryModelStore::new(ModelType::new("App\\Models\\Invoice"));
        store.insert(42u64, json!({"company_id": "7"}));

        let found = store.find(&ModelKey::new("42")).unwrap();
        assert_eq!(found.key, ModelKey::new("42"));
        assert_eq!(found.attribute("company_id"), Some(&json!("7")));
        assert!(store.find(&ModelKey::new("43")).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn closures_are_finders() {
        let post = ModelType::new("App\\Models\\Post");
        let finder = move |key: &ModelKey| {
            (key.as_str() == "1").then(|| ModelInstance::new(post.clone(), key.clone()))
        };
        assert!(finder.find(&ModelKey::new("1")).is_some());
        assert!(finder.find(&ModelKey::new("2")).is_none());
    }
}
