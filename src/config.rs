use std::path::PathBuf;

use anyhow::anyhow;

pub const DATA_DIR_ENV: &str = "AWSCATALOG_DATA_DIR";
pub const BUILTIN_ENV: &str = "AWSCATALOG_BUILTIN";

/// Where `Registry::load` finds service definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Directory of per-service `*.json` definitions.
    pub data_dir: Option<PathBuf>,
    /// Whether the definitions bundled with the crate are loaded too.
    pub include_builtin: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig { data_dir: None, include_builtin: true }
    }
}

fn parse_flag(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{} must be a boolean, got '{}'", name, value)),
    }
}

impl CatalogConfig {
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn without_builtin(mut self) -> Self {
        self.include_builtin = false;
        self
    }

    /// Reads `AWSCATALOG_DATA_DIR` and `AWSCATALOG_BUILTIN`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup(BUILTIN_ENV) {
            config.include_builtin = parse_flag(BUILTIN_ENV, &flag)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{CatalogConfig, BUILTIN_ENV, DATA_DIR_ENV};

    fn from(vars: &[(&str, &str)]) -> anyhow::Result<CatalogConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        CatalogConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(from(&[]).unwrap(), CatalogConfig::default());
        assert!(CatalogConfig::default().include_builtin);
    }

    #[test]
    fn reads_environment() {
        let config = from(&[(DATA_DIR_ENV, "/etc/awscatalog"), (BUILTIN_ENV, "false")]).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/etc/awscatalog")));
        assert!(! config.include_builtin);
        assert_eq!(from(&[(DATA_DIR_ENV, "")]).unwrap().data_dir, None);
        assert!(from(&[(BUILTIN_ENV, " YES ")]).unwrap().include_builtin);
    }

    #[test]
    fn rejects_bad_flag() {
        let err = from(&[(BUILTIN_ENV, "sometimes")]).unwrap_err();
        assert!(err.to_string().contains(BUILTIN_ENV));
    }
}
