//! # Modifiers
//!
//! Reusable, configurable rules applied to values before they are stored.
//!
//! - **Prototypes** ([`Prototype`]): the rule itself, its configuration
//!   properties and optional capabilities
//! - **Modifiers** ([`Modifier`]): a prototype plus its configuration and the
//!   error of its last evaluation
//! - **Pipelines** ([`Pipeline`]): attached modifiers run by priority group
//! - **Registry** ([`Registry`]): resolves prototype names
//! - **Schema-data** ([`SchemaData`]): the serializable form of a modifier
//!
//! ## Priorities
//!
//! | Kind | Base priority | Built-ins |
//! |------|---------------|-----------|
//! | Filter | `filter_priority` (100) | trim, collapse_whitespace, lowercase, uppercase |
//! | Constraint | `constraint_priority` (200) | required, length, range, pattern, choice, unique |
//!
//! A modifier's priority is its kind's base plus an offset: the configured
//! `priority` option, or the prototype's own offset.
//!
//! ## Usage
//!
//! ```
//! use modelkit::{Modifier, Pipeline, Value};
//!
//! let mut pipeline = Pipeline::new()
//!     .with(Modifier::new("trim").unwrap())
//!     .with(Modifier::build("length", [("max", 5)]).unwrap());
//!
//! assert_eq!(pipeline.run(Value::from("  hello ")).unwrap(), Value::from("hello"));
//! assert!(pipeline.run(Value::from("too long")).is_err());
//! ```

pub mod builtin;
mod modifier;
mod pipeline;
mod prototype;
mod registry;
mod schema;

pub use modifier::{Modifier, PRIORITY_OPTION};
pub use pipeline::{ModifierFailure, Pipeline, ValidationFailure};
pub use prototype::{
    Capabilities, ConfigView, Describe, EvalError, ExportSchema, MessageOverride, ModifierKind,
    Prototype, PrototypeClone, PrototypeRef,
};
pub use registry::{Factory, Registry};
pub use schema::SchemaData;
