//! The prototype contract.
//!
//! A prototype is the reusable rule behind a [`Modifier`](super::Modifier):
//! it declares its configuration properties and implements `process`.
//! Optional abilities (human-readable text, custom schema export, message
//! overrides) are exposed through explicit accessors returning trait objects,
//! and summarized as [`Capabilities`] when a prototype is registered.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::properties::{PropertiesManager, PropertyDecl};
use crate::value::Value;

/// Filters may transform a value; constraints only validate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Filter,
    Constraint,
}

/// Why a prototype refused a value.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct EvalError {
    /// Stable machine-readable code, e.g. `length.too_long`.
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl EvalError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Read access to a modifier's configuration.
#[derive(Clone, Copy)]
pub struct ConfigView<'a> {
    manager: &'a PropertiesManager,
}

impl<'a> ConfigView<'a> {
    pub fn new(manager: &'a PropertiesManager) -> Self {
        Self { manager }
    }

    /// The configured (or default) value; `None` when absent or null.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.manager.peek(name).filter(|v| !v.is_null())
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_i64())
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.as_f64())
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    pub fn str(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn list(&self, name: &str) -> Option<Vec<Value>> {
        self.get(name).and_then(|v| v.as_list().map(<[Value]>::to_vec))
    }

    /// Configured values in declaration order, transient ones excluded.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.manager
            .names()
            .filter(|name| {
                self.manager
                    .property(name)
                    .is_some_and(|p| !p.is_transient())
            })
            .filter_map(|name| self.get(name).map(|v| (name.to_string(), v)))
            .collect()
    }
}

/// Label and description texts.
pub trait Describe {
    fn label(&self, config: &ConfigView<'_>) -> String;

    fn description(&self, _config: &ConfigView<'_>) -> Option<String> {
        None
    }
}

/// Custom schema-data export.
///
/// The returned data must be accepted back as configuration by the same
/// prototype.
pub trait ExportSchema {
    fn schema_data(&self, config: &ConfigView<'_>) -> Value;
}

/// Replacement for the message of an [`EvalError`].
pub trait MessageOverride {
    fn message(&self, error: &EvalError, config: &ConfigView<'_>) -> Option<String>;
}

/// Optional abilities of a prototype, recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub describe: bool,
    pub schema: bool,
    pub message_override: bool,
}

#[doc(hidden)]
pub trait PrototypeClone {
    fn clone_box(&self) -> Box<dyn Prototype>;
}

impl<T> PrototypeClone for T
where
    T: 'static + Prototype + Clone,
{
    fn clone_box(&self) -> Box<dyn Prototype> {
        Box::new(self.clone())
    }
}

pub trait Prototype: PrototypeClone + fmt::Debug {
    /// Registered name, also the name of every modifier built from it.
    fn name(&self) -> &str;

    fn kind(&self) -> ModifierKind;

    /// Configuration properties. The reserved `priority` option is added by
    /// the modifier and must not be declared here.
    fn config(&self) -> Vec<PropertyDecl> {
        Vec::new()
    }

    /// Offset added to the kind's base priority when the modifier does not
    /// configure its own.
    fn priority_offset(&self) -> i64 {
        0
    }

    /// Called after configuration changes. Reject inconsistent options and
    /// cache derived state (compiled patterns and the like).
    fn prepare(&mut self, _config: &ConfigView<'_>) -> Result<(), String> {
        Ok(())
    }

    /// Check or transform `value` in place. On error the caller discards
    /// whatever was written to `value`.
    fn process(&self, value: &mut Value, config: &ConfigView<'_>) -> Result<(), EvalError>;

    /// Drop any error state the prototype keeps on its own.
    fn clear_error(&mut self) {}

    fn describe(&self) -> Option<&dyn Describe> {
        None
    }

    fn schema(&self) -> Option<&dyn ExportSchema> {
        None
    }

    fn messages(&self) -> Option<&dyn MessageOverride> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            describe: self.describe().is_some(),
            schema: self.schema().is_some(),
            message_override: self.messages().is_some(),
        }
    }
}

impl Clone for Box<dyn Prototype> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// How a modifier names the prototype it is built from.
#[derive(Debug)]
pub enum PrototypeRef {
    Instance(Box<dyn Prototype>),
    Name(String),
}

impl PrototypeRef {
    /// Resolve by type.
    pub fn of<T: Prototype + Default + 'static>() -> Self {
        PrototypeRef::Instance(Box::new(T::default()))
    }

    pub fn instance(prototype: impl Prototype + 'static) -> Self {
        PrototypeRef::Instance(Box::new(prototype))
    }
}

impl From<&str> for PrototypeRef {
    fn from(name: &str) -> Self {
        PrototypeRef::Name(name.to_string())
    }
}

impl From<String> for PrototypeRef {
    fn from(name: String) -> Self {
        PrototypeRef::Name(name)
    }
}

impl From<Box<dyn Prototype>> for PrototypeRef {
    fn from(prototype: Box<dyn Prototype>) -> Self {
        PrototypeRef::Instance(prototype)
    }
}
