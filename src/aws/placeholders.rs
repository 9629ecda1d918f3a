use std::collections::HashMap;
use std::str::FromStr;

use anyhow::anyhow;

pub const PARTITION: &str = "partition";
pub const REGION: &str = "region";
pub const ACCOUNT: &str = "account";

/// Caller-supplied values for an ARN template. Every field is optional;
/// anything missing renders as a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: HashMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(self, value: impl Into<String>) -> Self {
        self.set(PARTITION, value)
    }

    pub fn region(self, value: impl Into<String>) -> Self {
        self.set(REGION, value)
    }

    pub fn account(self, value: impl Into<String>) -> Self {
        self.set(ACCOUNT, value)
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// The value for `name`, treating an empty string as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str).filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(String::is_empty)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Placeholders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Placeholders { values }
    }
}

/// Parses a comma-separated `name=value` list, e.g. `appId=d2x1,region=us-east-1`.
impl FromStr for Placeholders {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        s.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=')
                    .ok_or_else(|| anyhow!("expected name=value, got '{}'", pair))?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(anyhow!("placeholder name is empty in '{}'", pair));
                }
                Ok((name.to_string(), value.trim().to_string()))
            })
            .collect()
    }
}
