//! Action → ability mapping and the set of actions that need no model.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::Ability;

/// Default resource-controller convention.
const RESOURCE_ABILITIES: &[(&str, &str)] = &[
    ("index", "viewAny"),
    ("show", "view"),
    ("create", "create"),
    ("store", "create"),
    ("edit", "update"),
    ("update", "update"),
    ("destroy", "delete"),
];

const RESOURCE_METHODS_WITHOUT_MODELS: &[&str] = &["index", "create", "store"];

/// Mapping from action name to the ability it requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AbilityMap(BTreeMap<String, Ability>);

impl AbilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The conventional map for resource controllers.
    pub fn resource_defaults() -> Self {
        Self(
            RESOURCE_ABILITIES
                .iter()
                .map(|(action, ability)| (action.to_string(), Ability::from_static(ability)))
                .collect(),
        )
    }

    /// Insert or replace the ability for `action`.
    pub fn insert(&mut self, action: impl Into<String>, ability: Ability) {
        self.0.insert(action.into(), ability);
    }

    /// Merge `other` into `self`; entries in `other` win.
    pub fn merge(mut self, other: &AbilityMap) -> Self {
        for (action, ability) in &other.0 {
            self.0.insert(action.clone(), ability.clone());
        }
        self
    }

    pub fn get(&self, action: &str) -> Option<&Ability> {
        self.0.get(action)
    }

    pub fn contains(&self, action: &str) -> bool {
        self.0.contains_key(action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Ability)> {
        self.0.iter().map(|(action, ability)| (action.as_str(), ability))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Set of action names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MethodSet(BTreeSet<String>);

impl MethodSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource actions that never receive a bound model.
    pub fn resource_defaults() -> Self {
        Self(
            RESOURCE_METHODS_WITHOUT_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        )
    }

    pub fn insert(&mut self, action: impl Into<String>) {
        self.0.insert(action.into());
    }

    pub fn merge(mut self, other: &MethodSet) -> Self {
        self.0.extend(other.0.iter().cloned());
        self
    }

    pub fn contains(&self, action: &str) -> bool {
        self.0.contains(action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for MethodSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
