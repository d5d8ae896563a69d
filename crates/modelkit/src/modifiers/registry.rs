//! Name-to-prototype registry.
//!
//! A [`Registry`] maps prototype names to factories and carries the
//! [`ModelkitConfig`] that supplies the base priority of each kind. The
//! process-wide [`Registry::builtin`] knows every built-in filter and
//! constraint and uses the default configuration.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::config::ModelkitConfig;
use crate::error::{ModelError, Result};

use super::builtin;
use super::prototype::{Capabilities, ModifierKind, Prototype, PrototypeRef};

/// Produces a fresh prototype instance.
pub type Factory = fn() -> Box<dyn Prototype>;

#[derive(Debug, Clone, Copy)]
struct Registration {
    factory: Factory,
    kind: ModifierKind,
    capabilities: Capabilities,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, Registration>,
    config: ModelkitConfig,
}

static BUILTIN: Lazy<Registry> = Lazy::new(|| Registry::with_builtins(ModelkitConfig::default()));

impl Registry {
    /// An empty registry with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with the given configuration.
    pub fn with_config(config: ModelkitConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            config,
        }
    }

    /// A registry holding every built-in prototype.
    pub fn with_builtins(config: ModelkitConfig) -> Self {
        let mut registry = Self::with_config(config);
        for factory in builtin::FACTORIES {
            let registered = registry.register(*factory);
            debug_assert!(registered.is_ok(), "built-in registration failed: {registered:?}");
        }
        registry
    }

    /// The shared registry of built-in prototypes.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn config(&self) -> &ModelkitConfig {
        &self.config
    }

    /// Register a prototype under the name it reports.
    pub fn register(&mut self, factory: Factory) -> Result<()> {
        let prototype = factory();
        let name = prototype.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(ModelError::InvalidPrototype(format!(
                "prototype '{}' is already registered",
                name
            )));
        }
        self.entries.insert(
            name,
            Registration {
                factory,
                kind: prototype.kind(),
                capabilities: prototype.capabilities(),
            },
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn kind(&self, name: &str) -> Option<ModifierKind> {
        self.entries.get(name).map(|r| r.kind)
    }

    pub fn capabilities(&self, name: &str) -> Option<Capabilities> {
        self.entries.get(name).map(|r| r.capabilities)
    }

    /// Turn a reference into a fresh prototype. Instances pass through
    /// unchanged; names must be registered.
    pub fn resolve(&self, prototype: PrototypeRef) -> Result<Box<dyn Prototype>> {
        match prototype {
            PrototypeRef::Instance(instance) => Ok(instance),
            PrototypeRef::Name(name) => self
                .entries
                .get(&name)
                .map(|r| (r.factory)())
                .ok_or_else(|| {
                    ModelError::InvalidPrototype(format!("unknown prototype '{}'", name))
                }),
        }
    }
}
