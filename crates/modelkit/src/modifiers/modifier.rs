//! A configured, prioritized rule.
//!
//! A [`Modifier`] is a prototype plus its own [`PropertiesManager`] holding
//! the configuration, so options go through the same type rules as any other
//! property. Evaluation works on a private copy: the caller's value is only
//! replaced when the prototype accepts it.

use crate::error::{ModelError, Result};
use crate::properties::{
    Caller, Converter, ManagerMode, Owner, PropertiesManager, PropertyDecl, TypeRule,
};
use crate::value::Value;

use super::prototype::{Capabilities, ConfigView, EvalError, ModifierKind, Prototype, PrototypeRef};
use super::registry::Registry;
use super::schema::SchemaData;

/// Reserved option holding a per-instance priority offset.
pub const PRIORITY_OPTION: &str = "priority";

#[derive(Debug, Clone)]
pub struct Modifier {
    prototype: Box<dyn Prototype>,
    config: PropertiesManager,
    base_priority: i64,
    capabilities: Capabilities,
    error: Option<EvalError>,
}

impl Modifier {
    /// Build from the built-in registry without options.
    pub fn new(prototype: impl Into<PrototypeRef>) -> Result<Self> {
        Self::build(prototype, Vec::<(String, Value)>::new())
    }

    /// Build from the built-in registry.
    pub fn build<K, V>(
        prototype: impl Into<PrototypeRef>,
        options: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::build_with(Registry::builtin(), prototype, options)
    }

    /// Resolve `prototype` through `registry` and apply `options` through the
    /// prototype's own configuration properties.
    pub fn build_with<K, V>(
        registry: &Registry,
        prototype: impl Into<PrototypeRef>,
        options: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let prototype = registry.resolve(prototype.into())?;
        let name = prototype.name().to_string();

        let mut declarations = prototype.config();
        declarations.push(
            PropertyDecl::new(PRIORITY_OPTION, TypeRule::coerce(Converter::Int))
                .nullable()
                .default(Value::Null),
        );
        let mut config = PropertiesManager::new(Owner::new(name.clone()));
        config
            .initialize(declarations, ManagerMode::Mutable, false)
            .map_err(|e| ModelError::InvalidPrototype(format!("{}: {}", name, e)))?;

        let mut modifier = Self {
            base_priority: registry.config().base_priority(prototype.kind()),
            capabilities: prototype.capabilities(),
            prototype,
            config,
            error: None,
        };
        for (key, value) in options {
            modifier.apply_option(&key.into(), value.into())?;
        }
        modifier.check_required()?;
        modifier.prepare()?;

        tracing::debug!(
            modifier = %name,
            priority = modifier.priority(),
            "built modifier"
        );
        Ok(modifier)
    }

    /// Rebuild a modifier from exported schema-data.
    pub fn from_schema(registry: &Registry, schema: &SchemaData) -> Result<Self> {
        let mut options = schema.options();
        if let Some(priority) = schema.priority {
            options.push((PRIORITY_OPTION.to_string(), Value::from(priority)));
        }
        Self::build_with(registry, schema.name.as_str(), options)
    }

    pub fn name(&self) -> &str {
        self.prototype.name()
    }

    pub fn kind(&self) -> ModifierKind {
        self.prototype.kind()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Kind base priority plus the configured offset, or the prototype's
    /// offset when none is configured.
    pub fn priority(&self) -> i64 {
        let offset = self
            .config()
            .i64(PRIORITY_OPTION)
            .unwrap_or_else(|| self.prototype.priority_offset());
        self.base_priority + offset
    }

    pub fn config(&self) -> ConfigView<'_> {
        ConfigView::new(&self.config)
    }

    /// Whether the configuration has been frozen by attaching to a pipeline.
    pub fn is_attached(&self) -> bool {
        self.config.is_readonly()
    }

    /// Change one option. Fails with `Immutable` once attached.
    /// A rejected change leaves the previous configuration in place.
    pub fn configure(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let config = self.config.clone();
        let prototype = self.prototype.clone();
        self.apply_option(key, value.into())?;
        if let Err(e) = self.prepare() {
            self.config = config;
            self.prototype = prototype;
            return Err(e);
        }
        Ok(())
    }

    /// Evaluate against `value`. On success `value` receives the (possibly
    /// transformed) result; on failure it is left untouched and the error is
    /// kept for [`Modifier::error`].
    pub fn evaluate(&mut self, value: &mut Value) -> bool {
        let mut candidate = value.clone();
        let outcome = self
            .prototype
            .process(&mut candidate, &ConfigView::new(&self.config));
        match outcome {
            Ok(()) => {
                *value = candidate;
                self.error = None;
                true
            }
            Err(error) => {
                tracing::debug!(
                    modifier = self.name(),
                    code = %error.code,
                    "modifier rejected value"
                );
                self.error = Some(error);
                false
            }
        }
    }

    /// The error of the last evaluation, if it failed.
    pub fn error(&self) -> Option<&EvalError> {
        self.error.as_ref()
    }

    /// The error message, using the prototype's override when it has one.
    pub fn message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        let overridden = if self.capabilities.message_override {
            self.prototype
                .messages()
                .and_then(|m| m.message(error, &self.config()))
        } else {
            None
        };
        Some(overridden.unwrap_or_else(|| error.message.clone()))
    }

    pub fn unset_error(&mut self) {
        self.error = None;
        self.prototype.clear_error();
    }

    /// Human-readable label; the prototype name when it has no text.
    pub fn label(&self) -> String {
        match self.prototype.describe() {
            Some(text) if self.capabilities.describe => text.label(&self.config()),
            _ => self.name().to_string(),
        }
    }

    pub fn description(&self) -> Option<String> {
        match self.prototype.describe() {
            Some(text) if self.capabilities.describe => text.description(&self.config()),
            _ => None,
        }
    }

    pub fn schema_data(&self) -> SchemaData {
        let config = self.config();
        let data = match self.prototype.schema() {
            Some(export) if self.capabilities.schema => export.schema_data(&config),
            _ => Value::map(
                config
                    .entries()
                    .into_iter()
                    .filter(|(name, _)| name != PRIORITY_OPTION),
            ),
        };
        SchemaData {
            name: self.name().to_string(),
            priority: config.i64(PRIORITY_OPTION),
            data,
        }
    }

    /// Freeze the configuration. Called when attached to a pipeline.
    pub(crate) fn freeze(&mut self) {
        self.config.set_all_as_readonly();
    }

    fn apply_option(&mut self, key: &str, value: Value) -> Result<()> {
        let name = self.name().to_string();
        if !self.config.has(key)? {
            return Err(ModelError::PropertyNotAllowed {
                modifier: name,
                property: key.to_string(),
            });
        }
        match self.config.set_as(Caller::Scope(&name), key, value) {
            Ok(()) => Ok(()),
            Err(e @ ModelError::Immutable { .. }) => Err(e),
            Err(e) => Err(ModelError::InvalidModifier {
                modifier: name,
                reason: e.to_string(),
            }),
        }
    }

    fn check_required(&mut self) -> Result<()> {
        let name = self.name().to_string();
        let keys: Vec<String> = self.config.names().map(str::to_string).collect();
        for key in keys {
            match self.config.get_as(Caller::Scope(&name), &key) {
                Ok(_) => {}
                Err(ModelError::NotInitialized { .. }) => {
                    return Err(ModelError::InvalidModifier {
                        modifier: name,
                        reason: format!("missing required option '{}'", key),
                    })
                }
                Err(e) => {
                    return Err(ModelError::InvalidModifier {
                        modifier: name,
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        let config = ConfigView::new(&self.config);
        self.prototype
            .prepare(&config)
            .map_err(|reason| ModelError::InvalidModifier {
                modifier: self.prototype.name().to_string(),
                reason,
            })
    }
}
