//! The runtime half of a property.
//!
//! A [`Property`] pairs an immutable [`PropertyDecl`] with the mutable state
//! that changes over the owner's lifetime: the current value, the
//! "has-been-set" flag and the memoized default. Access checks live here;
//! the manager decides the order in which they run.

use once_cell::unsync::OnceCell;

use super::decl::{DefaultSource, Mode, PropertyDecl};
use super::manager::Caller;
use super::rules::Rejection;
use crate::error::{ModelError, Result};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Property {
    decl: PropertyDecl,
    value: Option<Value>,
    written: bool,
    resolved_default: OnceCell<std::result::Result<Value, Rejection>>,
}

impl Property {
    pub(crate) fn new(decl: PropertyDecl) -> Self {
        Self {
            decl,
            value: None,
            written: false,
            resolved_default: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn mode(&self) -> Mode {
        self.decl.mode
    }

    pub fn declaration(&self) -> &PropertyDecl {
        &self.decl
    }

    pub fn is_transient(&self) -> bool {
        self.decl.transient
    }

    pub fn is_automatic(&self) -> bool {
        self.decl.is_automatic()
    }

    pub fn bound_scope(&self) -> Option<&str> {
        self.decl.bound.as_deref()
    }

    /// Whether a value was explicitly stored (by `set`, `restore` or a
    /// persisted initialization).
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the property was ever explicitly written.
    pub fn was_written(&self) -> bool {
        self.written
    }

    /// Whether a default has been resolved and cached.
    pub fn has_resolved_default(&self) -> bool {
        self.resolved_default.get().is_some()
    }

    /// Fail with `Inaccessible` unless the caller is inside the bound scope.
    pub(crate) fn check_access(&self, owner: &str, caller: Caller<'_>) -> Result<()> {
        match &self.decl.bound {
            Some(scope) if !caller.is_scope(scope) => Err(ModelError::Inaccessible {
                owner: owner.to_string(),
                property: self.decl.name.clone(),
                caller: caller.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Fail unless the declared mode allows this caller to write.
    pub(crate) fn check_writable(
        &self,
        owner: &str,
        owner_scope: &str,
        caller: Caller<'_>,
        value: Option<&Value>,
    ) -> Result<()> {
        match self.decl.mode {
            Mode::ReadOnly if !caller.is_scope(owner_scope) => Err(ModelError::Inaccessible {
                owner: owner.to_string(),
                property: self.decl.name.clone(),
                caller: caller.to_string(),
            }),
            Mode::WriteOnce if self.written => Err(ModelError::Immutable {
                owner: owner.to_string(),
                property: self.decl.name.clone(),
                value: value.cloned(),
            }),
            _ => Ok(()),
        }
    }

    /// Run nullability, the type rule and the attached modifiers.
    pub(crate) fn validate(&mut self, owner: &str, value: Value) -> Result<Value> {
        let accepted = self
            .check_rule(value)
            .map_err(|rejection| self.invalid(owner, rejection))?;

        match self.decl.pipeline.as_mut() {
            Some(pipeline) if !accepted.is_null() => {
                pipeline
                    .run(accepted.clone())
                    .map_err(|failure| ModelError::InvalidValue {
                        owner: owner.to_string(),
                        property: self.decl.name.clone(),
                        value: accepted,
                        diagnostic: Some(failure.to_string()),
                    })
            }
            _ => Ok(accepted),
        }
    }

    pub(crate) fn store(&mut self, value: Value) {
        self.value = Some(value);
        self.written = true;
    }

    /// Drop the value and the memoized default so the next read re-resolves.
    pub(crate) fn clear(&mut self) {
        self.value = None;
        self.resolved_default = OnceCell::new();
    }

    /// Whether the next read has to run the automatic derivation.
    pub(crate) fn needs_derivation(&self) -> bool {
        self.value.is_none() && self.is_automatic() && self.resolved_default.get().is_none()
    }

    pub(crate) fn automatic_fn(&self) -> Option<super::decl::AutomaticFn> {
        match &self.decl.default {
            Some(DefaultSource::Automatic(derive)) => Some(derive.clone()),
            _ => None,
        }
    }

    /// Cache the output of an automatic derivation, checked by the type rule.
    pub(crate) fn prime_default(&mut self, raw: Value) {
        let checked = self.check_rule(raw);
        let _ = self.resolved_default.set(checked);
    }

    /// Current value: the stored one, else the memoized default.
    pub(crate) fn resolve(&self, owner: &str) -> Result<Value> {
        if let Some(value) = &self.value {
            return Ok(value.clone());
        }

        let resolved = match &self.decl.default {
            Some(DefaultSource::Literal(literal)) => Some(
                self.resolved_default
                    .get_or_init(|| self.check_rule(literal.clone())),
            ),
            Some(DefaultSource::Generator(generate)) => Some(
                self.resolved_default
                    .get_or_init(|| self.check_rule(generate())),
            ),
            Some(DefaultSource::Automatic(_)) => self.resolved_default.get(),
            None => None,
        };

        match resolved {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(rejection)) => Err(self.invalid(owner, rejection.clone())),
            None => Err(ModelError::NotInitialized {
                owner: owner.to_string(),
                property: self.decl.name.clone(),
            }),
        }
    }

    fn check_rule(&self, value: Value) -> std::result::Result<Value, Rejection> {
        if value.is_null() {
            return if self.decl.nullable {
                Ok(Value::Null)
            } else {
                Err(Rejection {
                    value,
                    diagnostic: Some("property is not nullable".to_string()),
                })
            };
        }
        self.decl.rule.apply(value)
    }

    fn invalid(&self, owner: &str, rejection: Rejection) -> ModelError {
        ModelError::InvalidValue {
            owner: owner.to_string(),
            property: self.decl.name.clone(),
            value: rejection.value,
            diagnostic: rejection.diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::rules::{Converter, TypeRule};
    use crate::value::ValueKind;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn literal_default_is_checked_by_rule() {
        let prop = Property::new(
            PropertyDecl::new("count", TypeRule::coerce(Converter::Int)).default("12"),
        );
        assert_eq!(prop.resolve("Owner").unwrap(), Value::from(12));
    }

    #[test]
    fn invalid_default_reports_invalid_value() {
        let prop = Property::new(
            PropertyDecl::new("count", TypeRule::strict(ValueKind::Int)).default("x"),
        );
        let err = prop.resolve("Owner").unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { .. }));
    }

    #[test]
    fn generator_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let prop = Property::new(PropertyDecl::new("token", TypeRule::any()).generator(move || {
            counter.set(counter.get() + 1);
            Value::from("abc")
        }));

        assert_eq!(prop.resolve("Owner").unwrap(), Value::from("abc"));
        assert_eq!(prop.resolve("Owner").unwrap(), Value::from("abc"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clear_forgets_memoized_default() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut prop = Property::new(PropertyDecl::new("token", TypeRule::any()).generator(move || {
            counter.set(counter.get() + 1);
            Value::from(counter.get())
        }));

        assert_eq!(prop.resolve("Owner").unwrap(), Value::from(1));
        prop.clear();
        assert_eq!(prop.resolve("Owner").unwrap(), Value::from(2));
    }

    #[test]
    fn no_value_no_default_is_not_initialized() {
        let prop = Property::new(PropertyDecl::new("name", TypeRule::any()));
        assert!(matches!(
            prop.resolve("Owner"),
            Err(ModelError::NotInitialized { .. })
        ));
    }

    #[test]
    fn null_rejected_unless_nullable() {
        let mut strict = Property::new(PropertyDecl::new("a", TypeRule::strict(ValueKind::Int)));
        assert!(strict.validate("Owner", Value::Null).is_err());

        let mut nullable = Property::new(
            PropertyDecl::new("a", TypeRule::strict(ValueKind::Int)).nullable(),
        );
        assert_eq!(nullable.validate("Owner", Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn write_once_blocks_after_store() {
        let mut prop = Property::new(PropertyDecl::new("id", TypeRule::any()).write_once());
        assert!(prop.check_writable("Owner", "Owner", Caller::Public, None).is_ok());
        prop.store(Value::from(1));
        assert!(matches!(
            prop.check_writable("Owner", "Owner", Caller::Public, None),
            Err(ModelError::Immutable { .. })
        ));
    }

    #[test]
    fn bound_property_rejects_other_scopes() {
        let prop = Property::new(PropertyDecl::new("secret", TypeRule::any()).bind("Vault"));
        assert!(prop.check_access("Vault", Caller::Scope("Vault")).is_ok());
        assert!(matches!(
            prop.check_access("Vault", Caller::Public),
            Err(ModelError::Inaccessible { .. })
        ));
        assert!(prop.check_access("Vault", Caller::Scope("Other")).is_err());
    }
}
