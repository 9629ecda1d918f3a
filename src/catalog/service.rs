use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::aws::{ArnTemplate, Glob, Placeholders, ARN};
use crate::iam::{valid_service, AccessLevel, Action};
use super::action::{ActionDefinition, ActionDescriptor};
use super::condition_key::{self, ConditionKey};
use super::error::{CatalogError, IntegrityViolation, LookupKind};
use super::resource::{ResourceDefinition, ResourceType};

/// Everything the provider's reference says about one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub namespace: String,
    pub version: Option<String>,
    pub published: Option<NaiveDate>,
    pub condition_keys: Vec<ConditionKey>,
    pub actions: Vec<ActionDefinition>,
    pub resources: Vec<ResourceDefinition>,
}

impl ServiceDefinition {
    pub fn new(namespace: &str) -> Self {
        ServiceDefinition {
            namespace: namespace.to_string(),
            version: None,
            published: None,
            condition_keys: vec![],
            actions: vec![],
            resources: vec![],
        }
    }

    fn parse_list<T>(value: &json::JsonValue, field: &str) -> json::Result<Vec<T>>
    where
        T: for<'a> TryFrom<&'a json::JsonValue, Error = json::Error>,
    {
        if value.is_null() {
            Ok(vec![])
        } else if value.is_array() {
            value.members().map(T::try_from).collect()
        } else {
            Err(json::Error::wrong_type(&format!("expected {} to be an array", field)))
        }
    }
}

impl TryFrom<&json::JsonValue> for ServiceDefinition {
    type Error = json::Error;

    fn try_from(value: &json::JsonValue) -> json::Result<Self> {
        if !value.is_object() {
            return Err(json::Error::wrong_type("expected object at root of service definition"));
        }
        let namespace = value["Name"].as_str()
            .ok_or_else(|| json::Error::wrong_type("expected Name to be a string"))?
            .to_string();
        let version = value["Version"].as_str().map(String::from);
        let published = match value["Published"].as_str() {
            Some(date) => Some(NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| json::Error::wrong_type("expected Published to be a YYYY-MM-DD date"))?),
            None if value["Published"].is_null() => None,
            None => return Err(json::Error::wrong_type("expected Published to be a string")),
        };
        let condition_keys = Self::parse_list(&value["ConditionKeys"], "ConditionKeys")?;
        let actions = Self::parse_list(&value["Actions"], "Actions")?;
        let resources = Self::parse_list(&value["Resources"], "Resources")?;
        Ok(ServiceDefinition { namespace, version, published, condition_keys, actions, resources })
    }
}

impl TryFrom<&str> for ServiceDefinition {
    type Error = json::Error;

    fn try_from(value: &str) -> json::Result<Self> {
        let value = json::parse(value)?;
        Self::try_from(&value)
    }
}

/// One service's validated, immutable catalog: its actions and the ARN
/// templates of its resource types.
#[derive(Debug, Clone)]
pub struct ServiceCatalogEntry {
    namespace: String,
    version: Option<String>,
    published: Option<NaiveDate>,
    condition_keys: Vec<ConditionKey>,
    actions: Vec<ActionDescriptor>,
    action_index: HashMap<String, usize>,
    resources: Vec<ResourceType>,
    resource_index: HashMap<String, usize>,
}

struct Builder<'a> {
    namespace: &'a str,
    condition_keys: &'a [ConditionKey],
    violations: Vec<IntegrityViolation>,
}

impl<'a> Builder<'a> {
    fn resolve_key(&self, name: &str) -> Option<ConditionKey> {
        self.condition_keys.iter()
            .find(|key| key.name.eq_ignore_ascii_case(name))
            .cloned()
            .or_else(|| condition_key::global(name))
    }

    fn resolve_keys(&mut self, owner: &str, names: &[String]) -> Vec<ConditionKey> {
        let mut keys = Vec::with_capacity(names.len());
        for name in names {
            match self.resolve_key(name) {
                Some(key) => keys.push(key),
                None => self.violations.push(IntegrityViolation::UnknownConditionKey {
                    owner: owner.to_string(),
                    key: name.clone(),
                }),
            }
        }
        keys
    }

    fn check_condition_keys(&mut self) {
        let mut seen = HashSet::new();
        for key in self.condition_keys {
            if !seen.insert(key.name.to_ascii_lowercase()) {
                self.violations.push(IntegrityViolation::DuplicateConditionKey(key.name.clone()));
            }
        }
    }

    fn resources(&mut self, definitions: Vec<ResourceDefinition>) -> Vec<ResourceType> {
        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if !seen.insert(definition.name.clone()) {
                self.violations.push(IntegrityViolation::DuplicateResourceType(definition.name));
                continue;
            }
            let keys = self.resolve_keys(&format!("resource type '{}'", definition.name), &definition.condition_keys);
            match ArnTemplate::parse(&definition.arn_format) {
                Ok(template) => resources.push(ResourceType::new(definition.name, template, keys)),
                Err(reason) => self.violations.push(IntegrityViolation::InvalidArnPattern {
                    resource_type: definition.name,
                    reason,
                }),
            }
        }
        resources
    }

    fn identifier(&mut self, name: &str) -> Option<Action> {
        let parsed = if name.contains(':') { Action::try_from(name) } else { Action::new(self.namespace, name) };
        match parsed {
            Ok(action) if action.service() == self.namespace => Some(action),
            Ok(action) => {
                self.violations.push(IntegrityViolation::ForeignAction {
                    action: action.to_string(),
                    service: self.namespace.to_string(),
                });
                None
            }
            Err(reason) => {
                self.violations.push(IntegrityViolation::InvalidActionName { name: name.to_string(), reason });
                None
            }
        }
    }

    fn actions(&mut self, definitions: Vec<ActionDefinition>, resource_names: &HashSet<&str>) -> Vec<ActionDescriptor> {
        let mut seen = HashSet::new();
        let mut actions = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let identifier = match self.identifier(&definition.name) {
                Some(identifier) => identifier,
                None => continue,
            };
            if !seen.insert(identifier.to_string()) {
                self.violations.push(IntegrityViolation::DuplicateAction(identifier.to_string()));
                continue;
            }
            for resource_type in &definition.resource_types {
                if !resource_names.contains(resource_type.as_str()) {
                    self.violations.push(IntegrityViolation::UnknownResourceType {
                        action: identifier.to_string(),
                        resource_type: resource_type.clone(),
                    });
                }
            }
            let keys = self.resolve_keys(&format!("action '{}'", identifier), &definition.condition_keys);
            actions.push(ActionDescriptor::new(identifier, definition, keys));
        }
        actions
    }
}

impl ServiceCatalogEntry {
    /// Validates and builds an entry from bare action and resource
    /// definitions. Only global `aws:` condition keys can be referenced.
    pub fn build(
        namespace: &str,
        actions: Vec<ActionDefinition>,
        resources: Vec<ResourceDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut definition = ServiceDefinition::new(namespace);
        definition.actions = actions;
        definition.resources = resources;
        Self::from_definition(definition)
    }

    /// Validates the whole definition and either returns a complete entry or
    /// a `SchemaIntegrity` error listing every problem found.
    pub fn from_definition(definition: ServiceDefinition) -> Result<Self, CatalogError> {
        let ServiceDefinition { namespace, version, published, condition_keys, actions, resources } = definition;
        if !valid_service(&namespace) {
            return Err(CatalogError::SchemaIntegrity {
                violations: vec![IntegrityViolation::InvalidNamespace(namespace.clone())],
                service: namespace,
            });
        }

        let mut builder = Builder { namespace: &namespace, condition_keys: &condition_keys, violations: vec![] };
        builder.check_condition_keys();
        let resource_names: HashSet<String> = resources.iter().map(|r| r.name.clone()).collect();
        let resources = builder.resources(resources);
        let actions = builder.actions(actions, &resource_names.iter().map(String::as_str).collect());
        let violations = builder.violations;
        if !violations.is_empty() {
            return Err(CatalogError::SchemaIntegrity { service: namespace, violations });
        }

        let action_index = actions.iter().enumerate()
            .map(|(i, action)| (action.identifier().to_string(), i))
            .collect();
        let resource_index = resources.iter().enumerate()
            .map(|(i, resource)| (resource.name().to_string(), i))
            .collect();
        debug!(service = %namespace, actions = actions.len(), resources = resources.len(), "built service catalog entry");
        Ok(ServiceCatalogEntry {
            namespace,
            version,
            published,
            condition_keys,
            actions,
            action_index,
            resources,
            resource_index,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn published(&self) -> Option<NaiveDate> {
        self.published
    }

    /// All actions in declaration order.
    pub fn list_actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    /// Looks up an action by its full identifier, e.g. `amplify:CreateApp`.
    pub fn get_action(&self, identifier: &str) -> Result<&ActionDescriptor, CatalogError> {
        self.action_index.get(identifier)
            .map(|&i| &self.actions[i])
            .ok_or_else(|| CatalogError::not_found(LookupKind::Action, identifier))
    }

    /// Actions that can be scoped to `resource_type`. Unknown names simply
    /// match nothing.
    pub fn actions_for_resource_type(&self, resource_type: &str) -> Vec<&ActionDescriptor> {
        self.actions.iter().filter(|action| action.applies_to(resource_type)).collect()
    }

    pub fn actions_with_access_level(&self, level: AccessLevel) -> Vec<&ActionDescriptor> {
        self.actions.iter().filter(|action| action.access_level() == level).collect()
    }

    /// Expands a wildcard action name such as `List*` or `Get?ranch`.
    /// Matching ignores case, as policy documents do.
    pub fn matching_actions(&self, pattern: &str) -> Vec<&ActionDescriptor> {
        let glob = match Glob::case_insensitive(pattern) {
            Ok(glob) => glob,
            Err(err) => {
                warn!(service = %self.namespace, pattern, error = %err, "unusable action pattern");
                return vec![];
            }
        };
        self.actions.iter().filter(|action| glob.is_match(action.identifier().action())).collect()
    }

    /// All resource types in declaration order.
    pub fn resources(&self) -> &[ResourceType] {
        &self.resources
    }

    pub fn resource_type(&self, name: &str) -> Result<&ResourceType, CatalogError> {
        self.resource_index.get(name)
            .map(|&i| &self.resources[i])
            .ok_or_else(|| CatalogError::UnknownResourceType {
                service: self.namespace.clone(),
                resource_type: name.to_string(),
            })
    }

    /// Renders the ARN of `resource_type`, with `*` for every placeholder
    /// `values` leaves out.
    pub fn render(&self, resource_type: &str, values: &Placeholders) -> Result<String, CatalogError> {
        self.resource_type(resource_type).map(|resource| resource.render(values))
    }

    /// Resource types whose template `arn` is an instance of, most specific
    /// first.
    pub fn resource_types_for_arn(&self, arn: &ARN) -> Vec<&ResourceType> {
        let mut matches: Vec<&ResourceType> = self.resources.iter()
            .filter(|resource| resource.template().matches(arn))
            .collect();
        matches.sort_by_key(|resource| std::cmp::Reverse(resource.template().specificity()));
        matches
    }

    /// Condition keys declared by this service.
    pub fn condition_keys(&self) -> &[ConditionKey] {
        &self.condition_keys
    }

    /// Resolves a condition key declared by this service or a global `aws:` key.
    pub fn condition_key(&self, name: &str) -> Result<ConditionKey, CatalogError> {
        self.condition_keys.iter()
            .find(|key| key.name.eq_ignore_ascii_case(name))
            .cloned()
            .or_else(|| condition_key::global(name))
            .ok_or_else(|| CatalogError::not_found(LookupKind::ConditionKey, name))
    }
}

#[cfg(test)]
mod test {
    use super::{ServiceCatalogEntry, ServiceDefinition};
    use crate::aws::{Placeholders, ARN};
    use crate::catalog::action::ActionDefinition;
    use crate::catalog::error::{CatalogError, IntegrityViolation};
    use crate::catalog::resource::ResourceDefinition;
    use crate::iam::AccessLevel;

    const APPS: &str = "arn:${partition}:amplify:${region}:${account}:apps/${appId}";
    const BRANCHES: &str = "arn:${partition}:amplify:${region}:${account}:apps/${appId}/branches/${branchName}";

    fn amplify() -> ServiceCatalogEntry {
        ServiceCatalogEntry::build(
            "amplify",
            vec![
                ActionDefinition::new("CreateApp", AccessLevel::Write).resource_type("apps").condition_key("aws:TagKeys"),
                ActionDefinition::new("ListApps", AccessLevel::List),
                ActionDefinition::new("GetBranch", AccessLevel::Read).resource_type("branches"),
                ActionDefinition::new("amplify:TagResource", AccessLevel::Tagging).resource_type("apps").resource_type("branches"),
            ],
            vec![ResourceDefinition::new("apps", APPS), ResourceDefinition::new("branches", BRANCHES)],
        ).expect("The service should have built successfully")
    }

    fn violations(err: CatalogError) -> Vec<IntegrityViolation> {
        match err {
            CatalogError::SchemaIntegrity { violations, .. } => violations,
            other => panic!("expected SchemaIntegrity, got {:?}", other),
        }
    }

    #[test]
    fn list_actions_in_declaration_order() {
        let entry = amplify();
        let names: Vec<_> = entry.list_actions().iter().map(|a| a.identifier().to_string()).collect();
        assert_eq!(names, ["amplify:CreateApp", "amplify:ListApps", "amplify:GetBranch", "amplify:TagResource"]);
    }

    #[test]
    fn get_action_is_exact() {
        let entry = amplify();
        let action = entry.get_action("amplify:CreateApp").unwrap();
        assert_eq!(action.resource_types(), ["apps"]);
        assert_eq!(action.condition_keys()[0].name, "aws:TagKeys");
        assert!(matches!(entry.get_action("CreateApp"), Err(CatalogError::NotFound { .. })));
        assert!(matches!(entry.get_action("amplify:Create"), Err(CatalogError::NotFound { .. })));
        assert!(matches!(entry.get_action("amplify:createapp"), Err(CatalogError::NotFound { .. })));
    }

    #[test]
    fn actions_for_resource_type() {
        let entry = amplify();
        let names: Vec<_> = entry.actions_for_resource_type("branches").iter().map(|a| a.identifier().action()).collect();
        assert_eq!(names, ["GetBranch", "TagResource"]);
        assert!(entry.actions_for_resource_type("jobs").is_empty());
    }

    #[test]
    fn actions_by_pattern_and_level() {
        let entry = amplify();
        let names: Vec<_> = entry.matching_actions("*app*").iter().map(|a| a.identifier().action()).collect();
        assert_eq!(names, ["CreateApp", "ListApps"]);
        assert_eq!(entry.matching_actions("*").len(), 4);
        assert!(entry.matching_actions("Delete*").is_empty());
        assert_eq!(entry.actions_with_access_level(AccessLevel::Tagging).len(), 1);
    }

    #[test]
    fn render_known_and_unknown_types() {
        let entry = amplify();
        assert_eq!(entry.render("apps", &Placeholders::new()).unwrap(), "arn:*:amplify:*:*:apps/*");
        let err = entry.render("jobs", &Placeholders::new()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownResourceType { ref resource_type, .. } if resource_type == "jobs"));
    }

    #[test]
    fn resource_types_for_arn_most_specific_first() {
        let entry = amplify();
        let arn: ARN = "arn:aws:amplify:us-east-1:123456789012:apps/d2x1/branches/main".parse().unwrap();
        let names: Vec<_> = entry.resource_types_for_arn(&arn).iter().map(|r| r.name()).collect();
        assert_eq!(names, ["branches", "apps"]);
        let arn: ARN = "arn:aws:amplify:us-east-1:123456789012:apps/d2x1".parse().unwrap();
        let names: Vec<_> = entry.resource_types_for_arn(&arn).iter().map(|r| r.name()).collect();
        assert_eq!(names, ["apps"]);
    }

    #[test]
    fn build_reports_every_dangling_reference() {
        let err = ServiceCatalogEntry::build(
            "amplify",
            vec![
                ActionDefinition::new("CreateApp", AccessLevel::Write).resource_type("nonexistent"),
                ActionDefinition::new("GetJob", AccessLevel::Read).resource_type("jobs").resource_type("apps"),
            ],
            vec![ResourceDefinition::new("apps", APPS)],
        ).unwrap_err();
        let violations = violations(err);
        assert_eq!(violations.len(), 2);
        assert!(matches!(&violations[0], IntegrityViolation::UnknownResourceType { resource_type, .. } if resource_type == "nonexistent"));
        assert!(matches!(&violations[1], IntegrityViolation::UnknownResourceType { action, resource_type } if action == "amplify:GetJob" && resource_type == "jobs"));
    }

    #[test]
    fn build_reports_structural_problems() {
        let err = ServiceCatalogEntry::build(
            "amplify",
            vec![
                ActionDefinition::new("ListApps", AccessLevel::List),
                ActionDefinition::new("amplify:ListApps", AccessLevel::List),
                ActionDefinition::new("ecr:ListImages", AccessLevel::List),
                ActionDefinition::new("List Apps", AccessLevel::List),
                ActionDefinition::new("GetApp", AccessLevel::Read).condition_key("amplify:Unknown"),
            ],
            vec![
                ResourceDefinition::new("apps", APPS),
                ResourceDefinition::new("apps", APPS),
                ResourceDefinition::new("jobs", "arn:aws:amplify:{region}"),
            ],
        ).unwrap_err();
        let violations = violations(err);
        assert_eq!(violations.len(), 6);
        assert!(matches!(&violations[0], IntegrityViolation::DuplicateResourceType(name) if name == "apps"));
        assert!(matches!(&violations[1], IntegrityViolation::InvalidArnPattern { resource_type, .. } if resource_type == "jobs"));
        assert!(matches!(&violations[2], IntegrityViolation::DuplicateAction(name) if name == "amplify:ListApps"));
        assert!(matches!(&violations[3], IntegrityViolation::ForeignAction { action, .. } if action == "ecr:ListImages"));
        assert!(matches!(&violations[4], IntegrityViolation::InvalidActionName { name, .. } if name == "List Apps"));
        assert!(matches!(&violations[5], IntegrityViolation::UnknownConditionKey { key, .. } if key == "amplify:Unknown"));
    }

    #[test]
    fn build_rejects_invalid_namespace() {
        let err = ServiceCatalogEntry::build("Not A Service", vec![], vec![]).unwrap_err();
        assert!(matches!(&violations(err)[..], [IntegrityViolation::InvalidNamespace(_)]));
    }

    #[test]
    fn service_condition_keys_resolve() {
        let definition = ServiceDefinition::try_from(r#"{
            "Name": "ecr",
            "Version": "v1",
            "Published": "2024-05-01",
            "ConditionKeys": [{"Name": "ecr:ResourceTag/${TagKey}", "Types": ["String"], "Description": "Repository tag"}],
            "Actions": [{"Name": "ListImages", "AccessLevel": "List", "Resources": ["repository"]}],
            "Resources": [{
                "Name": "repository",
                "ARNFormat": "arn:${partition}:ecr:${region}:${account}:repository/${repositoryName}",
                "ConditionKeys": ["ecr:ResourceTag/${TagKey}", "aws:ResourceTag/${TagKey}"]
            }]
        }"#).unwrap();
        let entry = ServiceCatalogEntry::from_definition(definition).unwrap();
        assert_eq!(entry.version(), Some("v1"));
        assert_eq!(entry.published().unwrap().to_string(), "2024-05-01");
        let repository = entry.resource_type("repository").unwrap();
        assert_eq!(repository.condition_keys().len(), 2);
        assert_eq!(repository.condition_keys()[0].description, "Repository tag");
        assert_eq!(entry.condition_key("ECR:resourcetag/${TagKey}").unwrap().name, "ecr:ResourceTag/${TagKey}");
        assert_eq!(entry.condition_key("aws:SourceIp").unwrap().name, "aws:SourceIp");
        assert!(matches!(entry.condition_key("ecr:Nope"), Err(CatalogError::NotFound { .. })));
    }

    #[test]
    fn duplicate_condition_keys_rejected() {
        let definition = ServiceDefinition::try_from(r#"{
            "Name": "ecr",
            "ConditionKeys": [
                {"Name": "ecr:ResourceTag/${TagKey}", "Types": ["String"]},
                {"Name": "ECR:ResourceTag/${TagKey}", "Types": ["String"]}
            ]
        }"#).unwrap();
        let err = ServiceCatalogEntry::from_definition(definition).unwrap_err();
        assert!(matches!(&violations(err)[..], [IntegrityViolation::DuplicateConditionKey(_)]));
    }

    #[test]
    fn parse_definition_errors() {
        assert!(ServiceDefinition::try_from("[]").is_err());
        assert!(ServiceDefinition::try_from(r#"{"Actions": []}"#).is_err());
        assert!(ServiceDefinition::try_from(r#"{"Name": "ecr", "Actions": {}}"#).is_err());
        assert!(ServiceDefinition::try_from(r#"{"Name": "ecr", "Published": "May 2024"}"#).is_err());
        assert!(ServiceDefinition::try_from(r#"{"Name": "ecr", "Published": 2024}"#).is_err());
        assert!(ServiceDefinition::try_from("{").is_err());
    }
}
