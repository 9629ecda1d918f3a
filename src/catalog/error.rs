use crate::aws::TemplateError;
use crate::iam::ActionParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Action,
    Service,
    ConditionKey,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Action => "action",
            Self::Service => "service",
            Self::ConditionKey => "condition key",
        })
    }
}

/// A single reason a service definition was rejected.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityViolation {
    #[error("'{0}' is not a valid service namespace")]
    InvalidNamespace(String),
    #[error("action '{action}' references unknown resource type '{resource_type}'")]
    UnknownResourceType { action: String, resource_type: String },
    #[error("{owner} references unknown condition key '{key}'")]
    UnknownConditionKey { owner: String, key: String },
    #[error("action '{0}' is defined more than once")]
    DuplicateAction(String),
    #[error("resource type '{0}' is defined more than once")]
    DuplicateResourceType(String),
    #[error("condition key '{0}' is defined more than once")]
    DuplicateConditionKey(String),
    #[error("action '{action}' does not belong to service '{service}'")]
    ForeignAction { action: String, service: String },
    #[error("action name '{name}' is invalid: {reason}")]
    InvalidActionName { name: String, reason: ActionParseError },
    #[error("resource type '{resource_type}' has an invalid ARN pattern: {reason}")]
    InvalidArnPattern { resource_type: String, reason: TemplateError },
}

fn join_violations(violations: &[IntegrityViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: LookupKind, name: String },
    #[error("service '{service}' has no resource type '{resource_type}'")]
    UnknownResourceType { service: String, resource_type: String },
    #[error("service '{service}' failed integrity checks: {}", join_violations(.violations))]
    SchemaIntegrity { service: String, violations: Vec<IntegrityViolation> },
    #[error("service namespace '{0}' is already registered")]
    DuplicateNamespace(String),
}

impl CatalogError {
    pub(crate) fn not_found(kind: LookupKind, name: &str) -> Self {
        Self::NotFound { kind, name: name.to_string() }
    }
}
