use crate::iam::{AccessLevel, Action};
use super::condition_key::ConditionKey;

/// An action as it appears in the provider's reference, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDefinition {
    /// Either the bare name (`CreateApp`) or the full identifier.
    pub name: String,
    pub description: String,
    pub access_level: AccessLevel,
    pub resource_types: Vec<String>,
    pub condition_keys: Vec<String>,
    pub deprecated: bool,
}

impl ActionDefinition {
    pub fn new(name: &str, access_level: AccessLevel) -> Self {
        ActionDefinition {
            name: name.to_string(),
            description: String::new(),
            access_level,
            resource_types: Vec::new(),
            condition_keys: Vec::new(),
            deprecated: false,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn resource_type(mut self, name: &str) -> Self {
        self.resource_types.push(name.to_string());
        self
    }

    pub fn condition_key(mut self, name: &str) -> Self {
        self.condition_keys.push(name.to_string());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    // Entries may be plain names or objects carrying a "Name".
    fn parse_names(value: &json::JsonValue, field: &str) -> json::Result<Vec<String>> {
        if value.is_null() {
            return Ok(vec![]);
        }
        if !value.is_array() {
            return Err(json::Error::wrong_type(&format!("expected action {} to be an array", field)));
        }
        value.members().map(|member| {
            member.as_str()
                .or_else(|| member["Name"].as_str())
                .map(String::from)
                .ok_or_else(|| json::Error::wrong_type(&format!("expected action {} entries to be names", field)))
        }).collect()
    }
}

impl TryFrom<&json::JsonValue> for ActionDefinition {
    type Error = json::Error;

    fn try_from(value: &json::JsonValue) -> json::Result<Self> {
        let name = value["Name"].as_str()
            .ok_or_else(|| json::Error::wrong_type("expected action Name to be a string"))?
            .to_string();
        let access_level = value["AccessLevel"].as_str()
            .ok_or_else(|| json::Error::wrong_type("expected action AccessLevel to be a string"))?
            .parse()
            .map_err(|_| json::Error::wrong_type("expected action AccessLevel to be a known access level"))?;
        let description = value["Description"].as_str().unwrap_or_default().to_string();
        let resource_types = Self::parse_names(&value["Resources"], "Resources")?;
        let condition_keys = Self::parse_names(&value["ConditionKeys"], "ConditionKeys")?;
        let deprecated = match &value["Deprecated"] {
            json::JsonValue::Null => false,
            deprecated => deprecated.as_bool()
                .ok_or_else(|| json::Error::wrong_type("expected action Deprecated to be a boolean"))?,
        };
        Ok(ActionDefinition { name, description, access_level, resource_types, condition_keys, deprecated })
    }
}

/// A validated action belonging to a built service entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    identifier: Action,
    description: String,
    access_level: AccessLevel,
    resource_types: Vec<String>,
    condition_keys: Vec<ConditionKey>,
    deprecated: bool,
}

impl ActionDescriptor {
    pub(crate) fn new(
        identifier: Action,
        definition: ActionDefinition,
        condition_keys: Vec<ConditionKey>,
    ) -> Self {
        let mut resource_types: Vec<String> = Vec::with_capacity(definition.resource_types.len());
        for name in definition.resource_types {
            if !resource_types.contains(&name) {
                resource_types.push(name);
            }
        }
        ActionDescriptor {
            identifier,
            description: definition.description,
            access_level: definition.access_level,
            resource_types,
            condition_keys,
            deprecated: definition.deprecated,
        }
    }

    pub fn identifier(&self) -> &Action {
        &self.identifier
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Resource types this action can be scoped to. Empty means the action
    /// can only be granted on `*`.
    pub fn resource_types(&self) -> &[String] {
        &self.resource_types
    }

    pub fn condition_keys(&self) -> &[ConditionKey] {
        &self.condition_keys
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn is_resource_scoped(&self) -> bool {
        !self.resource_types.is_empty()
    }

    pub fn applies_to(&self, resource_type: &str) -> bool {
        self.resource_types.iter().any(|name| name == resource_type)
    }
}

impl std::fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.identifier, self.access_level)
    }
}
