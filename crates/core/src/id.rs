//! Strongly-typed identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Identity of an authenticated actor (human user, service account, etc).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    /// Create a new identifier (UUIDv7, time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for PrincipalId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| CoreError::invalid_id(format!("PrincipalId: {}", e)))?;
        Ok(Self(uuid))
    }
}

/// Lookup key of a model instance.
///
/// Keys arrive as route segments or request input, so they are carried in
/// their textual form and interpreted by the finder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelKey(String);

impl ModelKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret a request input value as a key.
    ///
    /// Strings and numbers are accepted; anything else (objects, arrays, null,
    /// booleans) cannot identify a model.
    pub fn from_input(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl core::fmt::Display for ModelKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for ModelKey {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_keys_accept_strings_and_numbers() {
        assert_eq!(ModelKey::from_input(&json!(42)), Some(ModelKey::new("42")));
        assert_eq!(ModelKey::from_input(&json!("inv-1")), Some(ModelKey::new("inv-1")));
    }

    #[test]
    fn input_keys_reject_non_scalars() {
        assert_eq!(ModelKey::from_input(&json!(null)), None);
        assert_eq!(ModelKey::from_input(&json!("")), None);
        assert_eq!(ModelKey::from_input(&json!([1])), None);
        assert_eq!(ModelKey::from_input(&json!(true)), None);
    }

    #[test]
    fn principal_id_round_trips_through_display() {
        let id = PrincipalId::new();
        let parsed: PrincipalId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<PrincipalId>().is_err());
    }
}
