mod action;
mod builtin;
mod condition_key;
mod error;
mod registry;
mod resource;
mod service;

pub use action::{ActionDefinition, ActionDescriptor};
pub use builtin::definitions as builtin_definitions;
pub use condition_key::{global as global_condition_key, ConditionKey, ConditionKeyType};
pub use error::{CatalogError, IntegrityViolation, LookupKind};
pub use registry::Registry;
pub use resource::{ResourceDefinition, ResourceType};
pub use service::{ServiceCatalogEntry, ServiceDefinition};
