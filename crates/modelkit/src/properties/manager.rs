//! # Properties Manager
//!
//! A [`PropertiesManager`] owns every [`Property`] of one owner object and is
//! the only way to reach them. It handles declaration (eager or through a lazy
//! builder), the one-shot initialization, `get` / `set` / `isset` / `unset`
//! dispatch and the manager-wide readonly switch.
//!
//! ## Check Order
//!
//! Mutating operations run their checks in a fixed order:
//!
//! 1. Manager initialized (`Uninitialized`)
//! 2. Property exists or the builder can produce it (`PropertyNotFound`)
//! 3. Manager readonly switch (`Immutable`)
//! 4. Bound scope (`Inaccessible`)
//! 5. Declared mode (`Inaccessible` for read-only, `Immutable` for write-once)
//! 6. Type rule and modifiers (`InvalidValue`)
//!
//! ## Ordering
//!
//! Properties are stored in an arena in first-declared (or first-referenced,
//! for lazy ones) order, so [`PropertiesManager::get_all`] and
//! [`PropertiesManager::export`] are deterministic.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decl::{DefaultSource, PropertyDecl};
use super::property::Property;
use crate::error::{ModelError, Result};
use crate::value::Value;

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller<'a> {
    /// Code outside any bound scope.
    Public,
    /// Code inside the named scope. Owners use their own kind as scope.
    Scope(&'a str),
}

impl Caller<'_> {
    pub fn is_scope(&self, scope: &str) -> bool {
        matches!(self, Caller::Scope(s) if *s == scope)
    }
}

impl fmt::Display for Caller<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Public => f.write_str("public scope"),
            Caller::Scope(scope) => write!(f, "scope '{}'", scope),
        }
    }
}

/// Identifies the object a manager belongs to.
///
/// The manager does not point back at its owner; it only keeps what error
/// messages and scope checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    kind: String,
    id: Uuid,
}

impl Owner {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Uuid::new_v4(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)
    }
}

/// Manager-wide write state. The only transition is `Mutable -> ReadOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagerMode {
    Mutable,
    ReadOnly,
}

pub type BuilderFn = Rc<dyn Fn(&str) -> Option<PropertyDecl>>;

/// Declarations handed to [`PropertiesManager::initialize`].
#[derive(Clone, Default)]
pub struct PropertySource {
    declarations: Vec<PropertyDecl>,
    builder: Option<BuilderFn>,
}

impl PropertySource {
    pub fn declared(declarations: Vec<PropertyDecl>) -> Self {
        Self {
            declarations,
            builder: None,
        }
    }

    /// Properties materialized on first reference by `builder`.
    pub fn lazy(builder: impl Fn(&str) -> Option<PropertyDecl> + 'static) -> Self {
        Self::default().with_builder(builder)
    }

    pub fn with_builder(
        mut self,
        builder: impl Fn(&str) -> Option<PropertyDecl> + 'static,
    ) -> Self {
        self.builder = Some(Rc::new(builder));
        self
    }
}

impl From<Vec<PropertyDecl>> for PropertySource {
    fn from(declarations: Vec<PropertyDecl>) -> Self {
        Self::declared(declarations)
    }
}

/// Read-only view of a manager handed to automatic derivations.
///
/// Only values that are already available are visible: stored values and
/// literal or generated defaults. Unresolved automatic siblings and lazy
/// properties that were never referenced read as `None`.
pub struct Siblings<'a> {
    manager: &'a PropertiesManager,
}

impl Siblings<'_> {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.manager.peek(name)
    }

    pub fn str(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| v.as_str().map(str::to_string))
    }
}

#[derive(Clone)]
pub struct PropertiesManager {
    owner: Owner,
    initialized: bool,
    mode: ManagerMode,
    persisted: bool,
    properties: Vec<Property>,
    index: HashMap<String, usize>,
    builder: Option<BuilderFn>,
    missing: HashSet<String>,
}

impl fmt::Debug for PropertiesManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertiesManager")
            .field("owner", &self.owner)
            .field("initialized", &self.initialized)
            .field("mode", &self.mode)
            .field("properties", &self.properties)
            .field("lazy", &self.builder.is_some())
            .finish()
    }
}

impl PropertiesManager {
    /// Create an uninitialized manager for `owner`.
    pub fn new(owner: Owner) -> Self {
        Self {
            owner,
            initialized: false,
            mode: ManagerMode::Mutable,
            persisted: false,
            properties: Vec::new(),
            index: HashMap::new(),
            builder: None,
            missing: HashSet::new(),
        }
    }

    /// Declare the owner's properties. Allowed exactly once.
    ///
    /// With `persisted` set, literal defaults count as stored values: the
    /// object is being rebuilt from an existing data source, so write-once
    /// properties are already spent.
    pub fn initialize(
        &mut self,
        source: impl Into<PropertySource>,
        mode: ManagerMode,
        persisted: bool,
    ) -> Result<()> {
        if self.initialized {
            return Err(ModelError::AlreadyInitialized {
                owner: self.owner.to_string(),
            });
        }

        // Declarations land in a staging manager so a failure leaves this one untouched
        let source = source.into();
        let mut staged = Self::new(self.owner.clone());
        staged.persisted = persisted;
        for decl in source.declarations {
            staged.insert(decl)?;
        }
        self.properties = staged.properties;
        self.index = staged.index;
        self.persisted = persisted;
        self.builder = source.builder;
        self.initialized = true;
        self.mode = mode;

        tracing::debug!(
            owner = %self.owner,
            properties = self.properties.len(),
            lazy = self.builder.is_some(),
            ?mode,
            persisted,
            "initialized properties"
        );
        Ok(())
    }

    /// Declare one more property after initialization.
    pub fn declare(&mut self, decl: PropertyDecl) -> Result<()> {
        self.ensure_initialized()?;
        if self.mode == ManagerMode::ReadOnly {
            return Err(self.immutable(&decl.name, None));
        }
        self.insert(decl).map(|_| ())
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// The scope the owner's own code runs in.
    pub fn owner_scope(&self) -> &str {
        self.owner.kind()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_readonly(&self) -> bool {
        self.mode == ManagerMode::ReadOnly
    }

    pub fn mode(&self) -> ManagerMode {
        self.mode
    }

    /// Number of materialized properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Names of materialized properties in first-declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(Property::name)
    }

    /// Introspect a materialized property without triggering the builder.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.index.get(name).map(|&idx| &self.properties[idx])
    }

    /// Forbid every later mutation. There is no way back.
    pub fn set_all_as_readonly(&mut self) {
        if self.mode != ManagerMode::ReadOnly {
            tracing::debug!(owner = %self.owner, "properties switched to readonly");
        }
        self.mode = ManagerMode::ReadOnly;
    }

    pub fn has(&mut self, name: &str) -> Result<bool> {
        self.ensure_initialized()?;
        match self.lookup(name) {
            Ok(_) => Ok(true),
            Err(ModelError::PropertyNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn get(&mut self, name: &str) -> Result<Value> {
        self.get_as(Caller::Public, name)
    }

    pub fn get_as(&mut self, caller: Caller<'_>, name: &str) -> Result<Value> {
        self.ensure_initialized()?;
        let idx = self.lookup(name)?;
        self.properties[idx].check_access(self.owner.kind(), caller)?;
        self.derive_if_needed(idx);
        self.properties[idx].resolve(self.owner.kind())
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.set_as(Caller::Public, name, value)
    }

    pub fn set_as(
        &mut self,
        caller: Caller<'_>,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let value = value.into();
        let idx = self.writable(caller, name, Some(&value))?;
        let owner = self.owner.kind();
        let property = &mut self.properties[idx];
        let accepted = property.validate(owner, value)?;
        tracing::trace!(owner, property = name, value = %accepted, "property set");
        property.store(accepted);
        Ok(())
    }

    /// Whether the property currently resolves to a non-null value.
    pub fn isset(&mut self, name: &str) -> Result<bool> {
        self.isset_as(Caller::Public, name)
    }

    pub fn isset_as(&mut self, caller: Caller<'_>, name: &str) -> Result<bool> {
        match self.get_as(caller, name) {
            Ok(value) => Ok(!value.is_null()),
            Err(ModelError::NotInitialized { .. }) | Err(ModelError::InvalidValue { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn unset(&mut self, name: &str) -> Result<()> {
        self.unset_as(Caller::Public, name)
    }

    pub fn unset_as(&mut self, caller: Caller<'_>, name: &str) -> Result<()> {
        let idx = self.writable(caller, name, None)?;
        self.properties[idx].clear();
        Ok(())
    }

    /// Every readable, resolvable property value visible from the owner's
    /// scope, in first-declared order. Properties without a value are skipped.
    pub fn get_all(&mut self) -> Result<Vec<(String, Value)>> {
        let scope = self.owner.kind().to_string();
        self.get_all_as(Caller::Scope(&scope))
    }

    pub fn get_all_as(&mut self, caller: Caller<'_>) -> Result<Vec<(String, Value)>> {
        self.ensure_initialized()?;
        let names: Vec<String> = self.names().map(str::to_string).collect();
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            match self.get_as(caller, &name) {
                Ok(value) => values.push((name, value)),
                Err(ModelError::NotInitialized { .. }) | Err(ModelError::Inaccessible { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(values)
    }

    /// The persisted view: `get_all` without transient properties.
    pub fn export(&mut self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let values = self.get_all()?;
        Ok(values
            .into_iter()
            .filter(|(name, _)| self.property(name).is_some_and(|p| !p.is_transient()))
            .map(|(name, value)| (name, value.to_json()))
            .collect())
    }

    /// Load values from an existing data source.
    ///
    /// Values are type-checked but bypass modes, bound scopes and write-once
    /// bookkeeping; each restored property counts as written. Either every
    /// value is stored or none is.
    pub fn restore<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.ensure_initialized()?;
        let mut accepted = Vec::new();
        for (name, value) in values {
            let name = name.as_ref();
            let idx = self.lookup(name)?;
            if self.mode == ManagerMode::ReadOnly {
                return Err(self.immutable(name, None));
            }
            let owner = self.owner.kind();
            accepted.push((idx, self.properties[idx].validate(owner, value.into())?));
        }
        for (idx, value) in accepted {
            self.properties[idx].store(value);
        }
        Ok(())
    }

    /// Read a value without materializing, deriving or checking access.
    pub(crate) fn peek(&self, name: &str) -> Option<Value> {
        let property = self.property(name)?;
        property.resolve(self.owner.kind()).ok()
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(ModelError::Uninitialized {
                owner: self.owner.to_string(),
            })
        }
    }

    /// Shared checks of `set`, `unset`: steps 1-5 of the check order.
    fn writable(&mut self, caller: Caller<'_>, name: &str, value: Option<&Value>) -> Result<usize> {
        self.ensure_initialized()?;
        let idx = self.lookup(name)?;
        if self.mode == ManagerMode::ReadOnly {
            return Err(self.immutable(name, value.cloned()));
        }
        let owner = self.owner.kind();
        let property = &self.properties[idx];
        property.check_access(owner, caller)?;
        property.check_writable(owner, owner, caller, value)?;
        Ok(idx)
    }

    fn lookup(&mut self, name: &str) -> Result<usize> {
        if let Some(&idx) = self.index.get(name) {
            return Ok(idx);
        }

        if !self.missing.contains(name) {
            if let Some(builder) = self.builder.clone() {
                match builder(name) {
                    Some(mut decl) => {
                        decl.name = name.to_string();
                        tracing::debug!(
                            owner = %self.owner,
                            property = name,
                            "materialized lazy property"
                        );
                        return self.insert(decl);
                    }
                    None => {
                        self.missing.insert(name.to_string());
                    }
                }
            }
        }

        Err(ModelError::PropertyNotFound {
            owner: self.owner.to_string(),
            property: name.to_string(),
        })
    }

    fn insert(&mut self, decl: PropertyDecl) -> Result<usize> {
        if self.index.contains_key(&decl.name) {
            return Err(ModelError::AlreadyDeclared {
                owner: self.owner.to_string(),
                property: decl.name,
            });
        }

        let persisted_value = match (&decl.default, self.persisted) {
            (Some(DefaultSource::Literal(value)), true) => Some(value.clone()),
            _ => None,
        };

        let idx = self.properties.len();
        self.index.insert(decl.name.clone(), idx);
        self.missing.remove(&decl.name);
        self.properties.push(Property::new(decl));

        if let Some(value) = persisted_value {
            let owner = self.owner.kind();
            let property = &mut self.properties[idx];
            let accepted = property.validate(owner, value)?;
            property.store(accepted);
        }
        Ok(idx)
    }

    fn derive_if_needed(&mut self, idx: usize) {
        if !self.properties[idx].needs_derivation() {
            return;
        }
        let Some(derive) = self.properties[idx].automatic_fn() else {
            return;
        };
        let raw = derive(&Siblings { manager: &*self });
        tracing::trace!(
            owner = %self.owner,
            property = self.properties[idx].name(),
            value = %raw,
            "derived automatic property"
        );
        self.properties[idx].prime_default(raw);
    }

    fn immutable(&self, name: &str, value: Option<Value>) -> ModelError {
        ModelError::Immutable {
            owner: self.owner.to_string(),
            property: name.to_string(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::rules::{Converter, TypeRule};
    use crate::value::ValueKind;
    use std::cell::Cell;

    fn user_manager() -> PropertiesManager {
        let mut manager = PropertiesManager::new(Owner::new("User"));
        manager
            .initialize(
                vec![
                    PropertyDecl::new("id", TypeRule::coerce(Converter::Int)).write_once(),
                    PropertyDecl::new("name", TypeRule::strict(ValueKind::Str)),
                    PropertyDecl::new("created", TypeRule::any())
                        .read_only()
                        .default("today"),
                    PropertyDecl::new("age", TypeRule::coerce(Converter::Int))
                        .nullable()
                        .default(Value::Null),
                    PropertyDecl::new("password", TypeRule::any()).bind("User"),
                    PropertyDecl::new("cache", TypeRule::any()).transient().default(1),
                ],
                ManagerMode::Mutable,
                false,
            )
            .unwrap();
        manager
    }

    #[test]
    fn set_then_get_strict_returns_same_value() {
        let mut m = user_manager();
        m.set("name", "Ada").unwrap();
        assert_eq!(m.get("name").unwrap(), Value::from("Ada"));
        assert!(m.isset("name").unwrap());
    }

    #[test]
    fn set_then_get_coercive_returns_converted_value() {
        let mut m = user_manager();
        m.set("age", "37").unwrap();
        assert_eq!(m.get("age").unwrap(), Value::from(37));
    }

    #[test]
    fn strict_rule_rejects_without_transforming() {
        let mut m = user_manager();
        let err = m.set("name", 12).unwrap_err();
        match err {
            ModelError::InvalidValue { value, property, .. } => {
                assert_eq!(value, Value::from(12));
                assert_eq!(property, "name");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
        assert!(matches!(m.get("name"), Err(ModelError::NotInitialized { .. })));
    }

    #[test]
    fn write_once_second_set_is_immutable() {
        let mut m = user_manager();
        m.set("id", 1).unwrap();
        assert!(matches!(m.set("id", 2), Err(ModelError::Immutable { .. })));
        assert!(matches!(m.unset("id"), Err(ModelError::Immutable { .. })));
        assert_eq!(m.get("id").unwrap(), Value::from(1));
    }

    #[test]
    fn read_only_is_writable_from_owner_scope_only() {
        let mut m = user_manager();
        assert!(matches!(
            m.set("created", "now"),
            Err(ModelError::Inaccessible { .. })
        ));
        m.set_as(Caller::Scope("User"), "created", "now").unwrap();
        assert_eq!(m.get("created").unwrap(), Value::from("now"));
    }

    #[test]
    fn bound_property_hidden_from_public() {
        let mut m = user_manager();
        assert!(matches!(
            m.set("password", "x"),
            Err(ModelError::Inaccessible { .. })
        ));
        m.set_as(Caller::Scope("User"), "password", "x").unwrap();
        assert!(matches!(m.get("password"), Err(ModelError::Inaccessible { .. })));
        assert_eq!(
            m.get_as(Caller::Scope("User"), "password").unwrap(),
            Value::from("x")
        );
    }

    #[test]
    fn readonly_switch_blocks_every_mutation() {
        let mut m = user_manager();
        m.set("name", "Ada").unwrap();
        m.set_all_as_readonly();

        assert!(matches!(m.set("name", "Bob"), Err(ModelError::Immutable { .. })));
        assert!(matches!(m.unset("name"), Err(ModelError::Immutable { .. })));
        assert!(matches!(
            m.set_as(Caller::Scope("User"), "created", "x"),
            Err(ModelError::Immutable { .. })
        ));
        assert!(matches!(m.set("password", "x"), Err(ModelError::Immutable { .. })));
        assert_eq!(m.get("name").unwrap(), Value::from("Ada"));
        assert!(m.is_readonly());
    }

    #[test]
    fn initialize_twice_fails() {
        let mut m = user_manager();
        assert!(matches!(
            m.initialize(Vec::new(), ManagerMode::Mutable, false),
            Err(ModelError::AlreadyInitialized { .. })
        ));
    }

    #[test]
    fn operations_before_initialize_fail() {
        let mut m = PropertiesManager::new(Owner::new("User"));
        assert!(matches!(m.get("x"), Err(ModelError::Uninitialized { .. })));
        assert!(matches!(m.set("x", 1), Err(ModelError::Uninitialized { .. })));
    }

    #[test]
    fn duplicate_declaration_fails() {
        let mut m = PropertiesManager::new(Owner::new("User"));
        let err = m
            .initialize(
                vec![
                    PropertyDecl::new("a", TypeRule::any()),
                    PropertyDecl::new("a", TypeRule::any()),
                ],
                ManagerMode::Mutable,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::AlreadyDeclared { .. }));

        let mut m = user_manager();
        assert!(matches!(
            m.declare(PropertyDecl::new("name", TypeRule::any())),
            Err(ModelError::AlreadyDeclared { .. })
        ));
    }

    #[test]
    fn unknown_property_not_found() {
        let mut m = user_manager();
        assert!(matches!(m.get("nope"), Err(ModelError::PropertyNotFound { .. })));
        assert!(!m.has("nope").unwrap());
        assert!(m.has("name").unwrap());
    }

    #[test]
    fn unset_restores_default() {
        let mut m = user_manager();
        m.set("age", 5).unwrap();
        m.unset("age").unwrap();
        assert_eq!(m.get("age").unwrap(), Value::Null);
        assert!(!m.isset("age").unwrap());

        m.set("name", "Ada").unwrap();
        m.unset("name").unwrap();
        assert!(matches!(m.get("name"), Err(ModelError::NotInitialized { .. })));
    }

    #[test]
    fn lazy_builder_materializes_once_and_keeps_order() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut m = PropertiesManager::new(Owner::new("Bag"));
        m.initialize(
            PropertySource::declared(vec![PropertyDecl::new("first", TypeRule::any()).default(0)])
                .with_builder(move |name| {
                    counter.set(counter.get() + 1);
                    name.starts_with("x_").then(|| {
                        PropertyDecl::new(name, TypeRule::any()).default(name.len() as i64)
                    })
                }),
            ManagerMode::Mutable,
            false,
        )
        .unwrap();

        assert_eq!(m.get("x_b").unwrap(), Value::from(3));
        assert_eq!(m.get("x_a").unwrap(), Value::from(3));
        assert_eq!(m.get("x_b").unwrap(), Value::from(3));
        assert_eq!(calls.get(), 2);

        assert!(matches!(m.get("other"), Err(ModelError::PropertyNotFound { .. })));
        assert!(matches!(m.get("other"), Err(ModelError::PropertyNotFound { .. })));
        assert_eq!(calls.get(), 3);

        let names: Vec<_> = m.names().collect();
        assert_eq!(names, vec!["first", "x_b", "x_a"]);
    }

    #[test]
    fn get_all_preserves_declaration_order_and_skips_unset() {
        let mut m = user_manager();
        m.set("name", "Ada").unwrap();
        m.set("id", 7).unwrap();
        let all = m.get_all().unwrap();
        let names: Vec<_> = all.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "created", "age", "cache"]);
    }

    #[test]
    fn export_excludes_transient() {
        let mut m = user_manager();
        m.set("name", "Ada").unwrap();
        let exported = m.export().unwrap();
        let keys: Vec<_> = exported.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "created", "age"]);
    }

    #[test]
    fn persisted_initialize_marks_literals_as_set() {
        let mut m = PropertiesManager::new(Owner::new("Row"));
        m.initialize(
            vec![
                PropertyDecl::new("id", TypeRule::any()).write_once().default(9),
                PropertyDecl::new("slug", TypeRule::any())
                    .default("stored")
                    .automatic(|_| Value::from("derived")),
            ],
            ManagerMode::Mutable,
            true,
        )
        .unwrap();

        assert!(m.property("id").unwrap().is_set());
        assert!(matches!(m.set("id", 10), Err(ModelError::Immutable { .. })));
        // Automatic replaced the literal, so nothing was persisted for slug
        assert_eq!(m.get("slug").unwrap(), Value::from("derived"));
    }

    #[test]
    fn restore_bypasses_modes_but_checks_types() {
        let mut m = user_manager();
        m.restore([("id", Value::from(3)), ("created", Value::from("2020"))])
            .unwrap();
        assert_eq!(m.get("id").unwrap(), Value::from(3));
        assert!(matches!(m.set("id", 4), Err(ModelError::Immutable { .. })));

        assert!(matches!(
            m.restore([("name", Value::from(1))]),
            Err(ModelError::InvalidValue { .. })
        ));
    }

    #[test]
    fn failed_initialize_can_be_retried() {
        let mut m = PropertiesManager::new(Owner::new("Bag"));
        let err = m
            .initialize(
                vec![
                    PropertyDecl::new("a", TypeRule::any()),
                    PropertyDecl::new("a", TypeRule::any()),
                ],
                ManagerMode::Mutable,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::AlreadyDeclared { .. }));
        assert!(!m.is_initialized());
        assert!(m.is_empty());

        m.initialize(
            vec![PropertyDecl::new("a", TypeRule::any()).default(1)],
            ManagerMode::Mutable,
            false,
        )
        .unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("a").unwrap(), Value::from(1));
    }

    #[test]
    fn failed_restore_stores_nothing() {
        let mut m = user_manager();
        let err = m
            .restore([("name", Value::from("Ada")), ("id", Value::from("nope"))])
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { .. }));
        assert!(matches!(m.get("name"), Err(ModelError::NotInitialized { .. })));
        assert!(!m.property("name").unwrap().was_written());

        // A failed restore spent no write-once allowance
        m.set("id", 5).unwrap();
    }

    #[test]
    fn automatic_derives_from_siblings_until_set() {
        let mut m = PropertiesManager::new(Owner::new("Post"));
        m.initialize(
            vec![
                PropertyDecl::new("title", TypeRule::strict(ValueKind::Str)),
                PropertyDecl::new("slug", TypeRule::strict(ValueKind::Str)).automatic(|s| {
                    Value::from(s.str("title").unwrap_or_default().to_lowercase().replace(' ', "-"))
                }),
            ],
            ManagerMode::Mutable,
            false,
        )
        .unwrap();

        m.set("title", "Hello World").unwrap();
        assert_eq!(m.get("slug").unwrap(), Value::from("hello-world"));

        // Derived once; later sibling changes do not re-derive
        m.set("title", "Other").unwrap();
        assert_eq!(m.get("slug").unwrap(), Value::from("hello-world"));

        m.set("slug", "custom").unwrap();
        assert_eq!(m.get("slug").unwrap(), Value::from("custom"));
    }

    #[test]
    fn automatic_write_once_allows_one_explicit_set() {
        let mut m = PropertiesManager::new(Owner::new("Post"));
        m.initialize(
            vec![PropertyDecl::new("code", TypeRule::any())
                .write_once()
                .automatic(|_| Value::from("auto"))],
            ManagerMode::Mutable,
            false,
        )
        .unwrap();

        assert_eq!(m.get("code").unwrap(), Value::from("auto"));
        m.set("code", "manual").unwrap();
        assert!(matches!(m.set("code", "again"), Err(ModelError::Immutable { .. })));
    }

    #[test]
    fn clone_does_not_alias_properties() {
        let mut original = user_manager();
        original.set("name", "Ada").unwrap();
        let mut copy = original.clone();
        copy.set("name", "Bob").unwrap();
        assert_eq!(original.get("name").unwrap(), Value::from("Ada"));
        assert_eq!(copy.get("name").unwrap(), Value::from("Bob"));
    }

    #[test]
    fn readonly_mode_at_initialize() {
        let mut m = PropertiesManager::new(Owner::new("Frozen"));
        m.initialize(
            vec![PropertyDecl::new("a", TypeRule::any()).default(1)],
            ManagerMode::ReadOnly,
            false,
        )
        .unwrap();
        assert_eq!(m.get("a").unwrap(), Value::from(1));
        assert!(matches!(m.set("a", 2), Err(ModelError::Immutable { .. })));
        assert!(matches!(
            m.declare(PropertyDecl::new("b", TypeRule::any())),
            Err(ModelError::Immutable { .. })
        ));
    }
}
