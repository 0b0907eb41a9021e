//! Resource registry
//!
//! Maps resource names to controller factories. Built once at startup,
//! validated eagerly, then shared read-only for the life of the process.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::controller::Controller;

/// Builds a fresh controller for one call
pub type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid resource name '{0}': must be non-empty and contain no '/'")]
    InvalidName(String),
    #[error("resource '{0}' is registered twice")]
    Duplicate(String),
    #[error("resource '{resource}' refers to unknown controller '{kind}'")]
    UnknownController { resource: String, kind: String },
}

/// Controller kinds compiled into the binary, addressed by type name
#[derive(Clone, Default)]
pub struct Catalog {
    kinds: BTreeMap<String, ControllerFactory>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller kind; a later entry with the same name replaces it
    #[must_use]
    pub fn with<F, C>(mut self, kind: &str, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.kinds.insert(
            kind.to_string(),
            Arc::new(move || Box::new(factory()) as Box<dyn Controller>),
        );
        self
    }

    pub fn get(&self, kind: &str) -> Option<&ControllerFactory> {
        self.kinds.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds.keys()).finish()
    }
}

/// Resource name → controller factory
#[derive(Clone, Default)]
pub struct Registry {
    resources: BTreeMap<String, ControllerFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller for `resource`
    pub fn register<F, C>(&mut self, resource: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.insert(
            resource,
            Arc::new(move || Box::new(factory()) as Box<dyn Controller>),
        )
    }

    fn insert(&mut self, resource: &str, factory: ControllerFactory) -> Result<(), RegistryError> {
        if resource.is_empty() || resource.contains('/') {
            return Err(RegistryError::InvalidName(resource.to_string()));
        }
        if self.resources.contains_key(resource) {
            return Err(RegistryError::Duplicate(resource.to_string()));
        }
        self.resources.insert(resource.to_string(), factory);
        Ok(())
    }

    /// Build a registry from configured `resource = "controller kind"` pairs
    ///
    /// Fails on the first unknown kind or invalid name.
    pub fn from_config<'a, I>(resources: I, catalog: &Catalog) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut registry = Self::new();
        for (resource, kind) in resources {
            let factory = catalog
                .get(kind)
                .ok_or_else(|| RegistryError::UnknownController {
                    resource: resource.clone(),
                    kind: kind.clone(),
                })?;
            registry.insert(resource, Arc::clone(factory))?;
        }
        Ok(registry)
    }

    pub fn lookup(&self, resource: &str) -> Option<&ControllerFactory> {
        self.resources.get(resource)
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.resources.keys()).finish()
    }
}
