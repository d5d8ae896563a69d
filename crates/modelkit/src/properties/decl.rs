//! Property declarations.
//!
//! A [`PropertyDecl`] is the schema of one property: its access mode, type
//! rule, nullability, default source, bound scope and whether it takes part in
//! the persisted view. Declarations are built with chained setters:
//!
//! ```
//! use modelkit::{Converter, PropertyDecl, TypeRule, Value};
//!
//! let age = PropertyDecl::new("age", TypeRule::coerce(Converter::Int))
//!     .nullable()
//!     .default(Value::Null);
//! assert!(age.nullable);
//! ```

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::manager::Siblings;
use super::rules::TypeRule;
use crate::modifiers::Pipeline;
use crate::value::Value;

/// How a property may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Readable by everyone, writable only from the owner's scope.
    ReadOnly,
    /// Exactly one successful `set` per property lifetime.
    WriteOnce,
    ReadWrite,
}

pub type GeneratorFn = Rc<dyn Fn() -> Value>;
pub type AutomaticFn = Rc<dyn Fn(&Siblings<'_>) -> Value>;

/// Where a property's value comes from when it was never set.
#[derive(Clone)]
pub enum DefaultSource {
    Literal(Value),
    /// Called at most once, the result is memoized.
    Generator(GeneratorFn),
    /// Derived from sibling properties on first read.
    Automatic(AutomaticFn),
}

impl fmt::Debug for DefaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSource::Literal(v) => write!(f, "Literal({})", v),
            DefaultSource::Generator(_) => f.write_str("Generator(..)"),
            DefaultSource::Automatic(_) => f.write_str("Automatic(..)"),
        }
    }
}

/// Specification for a single property.
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    /// Unique within the owning manager.
    pub name: String,

    pub mode: Mode,

    pub rule: TypeRule,

    /// Whether `Null` is accepted without consulting the type rule.
    pub nullable: bool,

    pub default: Option<DefaultSource>,

    /// Scope allowed to touch this property at all. `None` means public.
    pub bound: Option<String>,

    /// Transient properties are left out of the persisted view.
    pub transient: bool,

    /// Modifiers run after the type rule on every `set`.
    pub pipeline: Option<Pipeline>,
}

impl PropertyDecl {
    /// Create a read-write, non-nullable declaration without default.
    pub fn new(name: impl Into<String>, rule: TypeRule) -> Self {
        Self {
            name: name.into(),
            mode: Mode::ReadWrite,
            rule,
            nullable: false,
            default: None,
            bound: None,
            transient: false,
            pipeline: None,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn read_only(self) -> Self {
        self.mode(Mode::ReadOnly)
    }

    pub fn write_once(self) -> Self {
        self.mode(Mode::WriteOnce)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSource::Literal(value.into()));
        self
    }

    pub fn generator(mut self, generate: impl Fn() -> Value + 'static) -> Self {
        self.default = Some(DefaultSource::Generator(Rc::new(generate)));
        self
    }

    pub fn automatic(mut self, derive: impl Fn(&Siblings<'_>) -> Value + 'static) -> Self {
        self.default = Some(DefaultSource::Automatic(Rc::new(derive)));
        self
    }

    pub fn bind(mut self, scope: impl Into<String>) -> Self {
        self.bound = Some(scope.into());
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn modifiers(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self.default, Some(DefaultSource::Automatic(_)))
    }
}
