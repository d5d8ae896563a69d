//! # Property System
//!
//! This module turns a bag of named fields into type-checked,
//! access-controlled, lazily-initialized properties.
//!
//! - **Declarations** ([`PropertyDecl`]): mode, type rule, nullability,
//!   default source, bound scope, transient flag, optional modifiers
//! - **Type rules** ([`TypeRule`]): strict checks or coercive converters
//! - **Runtime state** ([`Property`]): current value, memoized default
//! - **Management** ([`PropertiesManager`]): lifecycle, dispatch, readonly switch
//! - **Mix-in** ([`Model`]): property support for any owner type
//!
//! ## Modes
//!
//! | Mode | Public `set` | Owner-scope `set` | Second `set` |
//! |------|--------------|-------------------|--------------|
//! | `ReadOnly` | `Inaccessible` | allowed | allowed |
//! | `WriteOnce` | allowed | allowed | `Immutable` |
//! | `ReadWrite` | allowed | allowed | allowed |
//!
//! Once a manager is switched to readonly every `set` / `unset` fails with
//! `Immutable`, whatever the property's own mode.
//!
//! ## Usage
//!
//! ```
//! use modelkit::{Converter, ManagerMode, Owner, PropertiesManager, PropertyDecl, TypeRule, Value};
//!
//! let mut props = PropertiesManager::new(Owner::new("User"));
//! props
//!     .initialize(
//!         vec![PropertyDecl::new("age", TypeRule::coerce(Converter::Int)).default(0)],
//!         ManagerMode::Mutable,
//!         false,
//!     )
//!     .unwrap();
//!
//! props.set("age", "41").unwrap();
//! assert_eq!(props.get("age").unwrap(), Value::from(41));
//! ```

mod decl;
mod manager;
mod model;
mod property;
mod rules;

pub use decl::{AutomaticFn, DefaultSource, GeneratorFn, Mode, PropertyDecl};
pub use manager::{
    BuilderFn, Caller, ManagerMode, Owner, PropertiesManager, PropertySource, Siblings,
};
pub use model::Model;
pub use property::Property;
pub use rules::{Check, ConvertFn, Converter, PredicateFn, Rejection, TypeRule};
