use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{debug, error, info};

use crate::aws::{glob_matches, Placeholders, ARN};
use crate::config::CatalogConfig;
use super::action::ActionDescriptor;
use super::builtin;
use super::condition_key::{self, ConditionKey};
use super::error::{CatalogError, LookupKind};
use super::resource::ResourceType;
use super::service::{ServiceCatalogEntry, ServiceDefinition};

/// Namespace-keyed lookup over every built service. Entries are shared, so
/// a registry can be cloned cheaply and read from any thread.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    services: BTreeMap<String, Arc<ServiceCatalogEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. A namespace can only be registered once.
    pub fn register(&mut self, entry: impl Into<Arc<ServiceCatalogEntry>>) -> Result<(), CatalogError> {
        let entry = entry.into();
        let namespace = entry.namespace().to_string();
        if self.services.contains_key(&namespace) {
            return Err(CatalogError::DuplicateNamespace(namespace));
        }
        debug!(service = %namespace, "registered service");
        self.services.insert(namespace, entry);
        Ok(())
    }

    pub fn get(&self, namespace: &str) -> Result<&ServiceCatalogEntry, CatalogError> {
        self.services.get(namespace)
            .map(Arc::as_ref)
            .ok_or_else(|| CatalogError::not_found(LookupKind::Service, namespace))
    }

    /// A shared handle to an entry, for consumers that outlive the registry.
    pub fn entry(&self, namespace: &str) -> Result<Arc<ServiceCatalogEntry>, CatalogError> {
        self.services.get(namespace)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(LookupKind::Service, namespace))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceCatalogEntry> {
        self.services.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Looks up `svc:Name` in the service it names.
    pub fn get_action(&self, identifier: &str) -> Result<&ActionDescriptor, CatalogError> {
        let (namespace, _) = identifier.split_once(':')
            .ok_or_else(|| CatalogError::not_found(LookupKind::Action, identifier))?;
        self.get(namespace)
            .map_err(|_| CatalogError::not_found(LookupKind::Action, identifier))?
            .get_action(identifier)
    }

    pub fn render(&self, namespace: &str, resource_type: &str, values: &Placeholders) -> Result<String, CatalogError> {
        self.get(namespace)?.render(resource_type, values)
    }

    /// Expands a policy `Action` element such as `*`, `amplify:*` or
    /// `ecr:Batch*`. Services are visited in namespace order, actions in
    /// declaration order.
    pub fn expand_action_pattern(&self, pattern: &str) -> Vec<&ActionDescriptor> {
        if pattern == "*" {
            return self.services().flat_map(|entry| entry.list_actions()).collect();
        }
        let (service, action) = match pattern.split_once(':') {
            Some(parts) => parts,
            None => return vec![],
        };
        self.services()
            .filter(|entry| glob_matches(service, entry.namespace()))
            .flat_map(|entry| entry.matching_actions(action))
            .collect()
    }

    /// Resource types `arn` could be an instance of, most specific first.
    pub fn resolve_arn(&self, arn: &ARN) -> Vec<(&ServiceCatalogEntry, &ResourceType)> {
        match self.get(arn.service()) {
            Ok(entry) => entry.resource_types_for_arn(arn).into_iter().map(|resource| (entry, resource)).collect(),
            Err(_) => vec![],
        }
    }

    /// Resolves `aws:` keys globally and `svc:` keys through their service.
    pub fn condition_key(&self, name: &str) -> Result<ConditionKey, CatalogError> {
        if let Some(key) = condition_key::global(name) {
            return Ok(key);
        }
        let (namespace, _) = name.split_once(':')
            .ok_or_else(|| CatalogError::not_found(LookupKind::ConditionKey, name))?;
        self.get(&namespace.to_ascii_lowercase())
            .map_err(|_| CatalogError::not_found(LookupKind::ConditionKey, name))?
            .condition_key(name)
    }

    /// Builds every definition, spreading the work over the available
    /// cores, then registers the results in input order. Nothing is
    /// returned unless every service builds and registers cleanly.
    pub fn from_definitions(definitions: Vec<ServiceDefinition>) -> Result<Self, Vec<CatalogError>> {
        let workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let chunk_size = ((definitions.len() + workers - 1) / workers).max(1);
        let mut chunks: Vec<Vec<ServiceDefinition>> = Vec::new();
        let mut remaining = definitions.into_iter().peekable();
        while remaining.peek().is_some() {
            chunks.push(remaining.by_ref().take(chunk_size).collect());
        }

        let built: Vec<Result<ServiceCatalogEntry, CatalogError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = chunks.into_iter()
                .map(|chunk| scope.spawn(move || {
                    chunk.into_iter().map(ServiceCatalogEntry::from_definition).collect::<Vec<_>>()
                }))
                .collect();
            handles.into_iter()
                .flat_map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut registry = Registry::new();
        let mut errors = Vec::new();
        for result in built {
            match result.and_then(|entry| registry.register(entry)) {
                Ok(()) => {}
                Err(err) => {
                    error!(error = %err, "service failed to initialize");
                    errors.push(err);
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        info!(services = registry.len(), "catalog initialized");
        Ok(registry)
    }

    /// Loads the services in `config.data_dir` (every `*.json` file, in
    /// file-name order) plus the bundled ones when enabled.
    pub fn load(config: &CatalogConfig) -> anyhow::Result<Self> {
        let mut definitions = match &config.data_dir {
            Some(dir) => load_dir(dir)?,
            None => vec![],
        };
        if config.include_builtin {
            definitions.extend(builtin::definitions().context("parsing bundled service definitions")?);
        }
        Registry::from_definitions(definitions).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow!("catalog failed to initialize: {}", messages.join("; "))
        })
    }
}

fn load_dir(dir: &Path) -> anyhow::Result<Vec<ServiceDefinition>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("reading catalog directory {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("listing catalog directory {}", dir.display()))?;
    paths.retain(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"));
    paths.sort();
    paths.iter().map(|path| {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let definition = ServiceDefinition::try_from(data.as_str())
            .with_context(|| format!("parsing {}", path.display()))?;
        debug!(path = %path.display(), service = %definition.namespace, "loaded service definition");
        Ok(definition)
    }).collect()
}
