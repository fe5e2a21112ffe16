//! Registration-time coverage audit.
//!
//! Every action must be covered by a declaration, an ability-map entry, or be
//! explicitly exempted. Anything else is registered as denied.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ability_map::AbilityMap;
use crate::controller::ActionDefinition;

/// Authorization coverage of one action, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// The controller did not opt into the audit.
    Unchecked,
    /// Carries a [`RequirementOverride`](crate::RequirementOverride).
    Exempt,
    /// Carries at least one declaration.
    AttributeCovered,
    /// Named in the merged ability map.
    MapCovered,
    /// No coverage; every request to the action is rejected.
    Denied,
}

impl Coverage {
    pub fn is_denied(self) -> bool {
        self == Coverage::Denied
    }
}

/// Classify one action against the merged ability map.
pub fn classify(action: &ActionDefinition, ability_map: &AbilityMap) -> Coverage {
    if action.is_exempt() {
        Coverage::Exempt
    } else if !action.policies().is_empty() {
        Coverage::AttributeCovered
    } else if ability_map.contains(action.name()) {
        Coverage::MapCovered
    } else {
        Coverage::Denied
    }
}

/// Classify every action. Pure: the same inputs always give the same result.
pub fn audit<'a, I>(controller: &str, actions: I, ability_map: &AbilityMap) -> BTreeMap<String, Coverage>
where
    I: IntoIterator<Item = &'a ActionDefinition>,
{
    actions
        .into_iter()
        .map(|action| {
            let coverage = classify(action, ability_map);
            if coverage.is_denied() {
                tracing::warn!(
                    controller,
                    action = action.name(),
                    "action has no policy coverage; registering as denied"
                );
            }
            (action.name().to_string(), coverage)
        })
        .collect()
}
