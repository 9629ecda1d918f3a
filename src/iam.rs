use std::str::FromStr;

use anyhow::anyhow;

/// How granting an action affects the resources it applies to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    List,
    Read,
    Write,
    Tagging,
    PermissionsManagement,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 5] = [
        Self::List,
        Self::Read,
        Self::Write,
        Self::Tagging,
        Self::PermissionsManagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Read => "Read",
            Self::Write => "Write",
            Self::Tagging => "Tagging",
            Self::PermissionsManagement => "Permissions management",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = anyhow::Error;

    // The provider's reference writes "Permissions management"; generated
    // tables tend to use the identifier form.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let level = match s {
            "List" => Self::List,
            "Read" => Self::Read,
            "Write" => Self::Write,
            "Tagging" => Self::Tagging,
            "Permissions management" | "PermissionsManagement" => Self::PermissionsManagement,
            _ => return Err(anyhow!("unrecognized access level '{}'", s)),
        };
        Ok(level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionParseError {
    InvalidFormat,
    InvalidService,
    InvalidName,
}

impl std::fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => f.write_str("expected an action of the form service:Name"),
            Self::InvalidService => f.write_str("service prefix must be lowercase letters, digits and '-'"),
            Self::InvalidName => f.write_str("action name must be letters and digits"),
        }
    }
}

impl std::error::Error for ActionParseError {}

/// A fully-qualified action identifier such as `amplify:CreateApp`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action {
    value: String,
    separator: usize,
}

pub(crate) fn valid_service(service: &str) -> bool {
    !service.is_empty()
        && service.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

impl Action {
    pub fn new(service: &str, action: &str) -> Result<Self, ActionParseError> {
        if !valid_service(service) {
            return Err(ActionParseError::InvalidService);
        }
        if !valid_name(action) {
            return Err(ActionParseError::InvalidName);
        }
        let mut value = String::with_capacity(service.len() + action.len() + 1);
        value.push_str(service);
        value.push(':');
        value.push_str(action);
        Ok(Action { value, separator: service.len() })
    }

    pub fn service(&self) -> &str {
        &self.value[..self.separator]
    }

    pub fn action(&self) -> &str {
        &self.value[self.separator + 1 ..]
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<&str> for Action {
    type Error = ActionParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (service, action) = value.split_once(':').ok_or(ActionParseError::InvalidFormat)?;
        Action::new(service, action)
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::try_from(s)
    }
}
