// ─────────────────────────────────────────────────────────────────────────────
// Coverage report (developer diagnostics)
// ─────────────────────────────────────────────────────────────────────────────

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::controller::ControllerPolicies;
use crate::declaration::Policy;
use crate::requirement::Coverage;

/// How every action of a controller is authorized.
///
/// Answers "which check guards this action, and which actions are closed
/// because nothing does?" without sending a request.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub controller: String,
    pub model: String,
    pub parameter: String,
    pub generated_at: DateTime<Utc>,
    pub actions: Vec<ActionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub action: String,
    pub coverage: Coverage,
    /// Ability checked through the resource ability map, if any.
    pub mapped_ability: Option<String>,
    /// Whether the mapped ability is checked against a bound instance.
    pub requires_model: bool,
    pub declarations: Vec<Policy>,
    /// Present only for denied actions.
    pub suggestions: Vec<String>,
}

impl CoverageReport {
    pub fn for_controller(controller: &ControllerPolicies, now: DateTime<Utc>) -> Self {
        let actions = controller
            .actions()
            .map(|action| {
                let name = action.name();
                let coverage = controller.coverage(name);
                let mapped_ability = controller.ability_map().get(name).map(|a| a.to_string());
                let suggestions = if coverage.is_denied() {
                    vec![
                        format!("Declare a policy on {} in {}", name, controller.name()),
                        format!("Map '{}' to an ability in the controller's ability map", name),
                        format!("Mark '{}' with a requirement override if it is intentionally public", name),
                    ]
                } else {
                    Vec::new()
                };
                ActionReport {
                    action: name.to_string(),
                    coverage,
                    requires_model: mapped_ability.is_some()
                        && !controller.methods_without_models().contains(name),
                    mapped_ability,
                    declarations: action.policies().to_vec(),
                    suggestions,
                }
            })
            .collect();

        Self {
            controller: controller.name().to_string(),
            model: controller.model().to_string(),
            parameter: controller.parameter().to_string(),
            generated_at: now,
            actions,
        }
    }

    pub fn denied(&self) -> impl Iterator<Item = &ActionReport> {
        self.actions.iter().filter(|a| a.coverage.is_denied())
    }
}

#[cfg(test)]
mod tests {
    use policygate_core::ModelType;

    use super::*;
    use crate::ActionDefinition;

    #[test]
    fn report_lists_denied_actions_with_suggestions() {
        let post = ModelType::new("App\\Models\\Post");
        let controller = ControllerPolicies::builder("PostController", post.clone())
            .action(ActionDefinition::new("show").binds_model())
            .action(ActionDefinition::new("index"))
            .action(ActionDefinition::new("archive"))
            .action(ActionDefinition::new("preview").policy(Policy::new("view").on(post)))
            .build();

        let report = CoverageReport::for_controller(&controller, Utc::now());
        let denied: Vec<_> = report.denied().map(|a| a.action.as_str()).collect();
        assert_eq!(denied, vec!["archive"]);

        let show = report.actions.iter().find(|a| a.action == "show").unwrap();
        assert_eq!(show.mapped_ability.as_deref(), Some("view"));
        assert!(show.requires_model);
        assert!(show.suggestions.is_empty());

        let index = report.actions.iter().find(|a| a.action == "index").unwrap();
        assert!(!index.requires_model);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["controller"], "PostController");
        assert_eq!(json["parameter"], "post");
    }
}
