use thiserror::Error;

use crate::Ability;

/// A declaration or registration problem detected while authorizing.
///
/// These are deterministic configuration errors. They are never retried and
/// always end in a denial; the diagnostic tells the developer which action to
/// fix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The declaration's shape is invalid (e.g. request source without a model).
    #[error("malformed policy declaration: {}", policy_diagnostic(.controller, .action))]
    MalformedDeclaration { controller: String, action: String },

    /// A request-sourced (or route-bound resource) lookup found nothing.
    #[error("authorization target not found: {}", policy_diagnostic(.controller, .action))]
    TargetNotFound { controller: String, action: String },

    /// The declared model type is not a recognized application model.
    #[error("unrecognized model '{model}': {}", policy_diagnostic(.controller, .action))]
    UnrecognizedModel {
        controller: String,
        action: String,
        model: String,
    },

    /// The action has no authorization coverage and was registered as denied.
    #[error("no policy covers this action: {}", requirement_diagnostic(.controller, .action))]
    UnauthorizedRegistration { controller: String, action: String },
}

impl PolicyError {
    /// Developer-facing hint naming the offending action and controller.
    pub fn diagnostic(&self) -> String {
        match self {
            PolicyError::MalformedDeclaration { controller, action }
            | PolicyError::TargetNotFound { controller, action }
            | PolicyError::UnrecognizedModel {
                controller, action, ..
            } => policy_diagnostic(controller, action),
            PolicyError::UnauthorizedRegistration { controller, action } => {
                requirement_diagnostic(controller, action)
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::MalformedDeclaration { .. } => "malformed_declaration",
            PolicyError::TargetNotFound { .. } => "target_not_found",
            PolicyError::UnrecognizedModel { .. } => "unrecognized_model",
            PolicyError::UnauthorizedRegistration { .. } => "unauthorized_registration",
        }
    }
}

fn policy_diagnostic(controller: &str, action: &str) -> String {
    format!("Check the Policy attribute on {action} in {controller}")
}

fn requirement_diagnostic(controller: &str, action: &str) -> String {
    format!("Check policy requirement on {action} in {controller}")
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The gate evaluated the check and said no.
    #[error("forbidden: '{ability}' denied on {target}")]
    Denied { ability: Ability, target: String },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl AuthzError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::Denied { .. } => "forbidden",
            AuthzError::Policy(e) => e.code(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid controller '{controller}': {reason}")]
    InvalidController { controller: String, reason: String },
}
