//! # Modelkit
//!
//! Modelkit gives dynamic data objects **declared, typed, access-controlled
//! properties** and runs incoming values through **prioritized modifier
//! pipelines** before they are stored.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Owners (anything implementing `Model`)                     │
//! │  - Hold a PropertiesManager, expose get/set/freeze          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Properties (properties/)                                   │
//! │  - Declarations, modes, scopes, lazy defaults and builders  │
//! │  - Type rules, then the property's own modifier pipeline    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Modifiers (modifiers/)                                     │
//! │  - Prototypes, configured modifiers, priority groups        │
//! │  - Built-in filters and constraints, schema-data export     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Modifiers configure themselves through a `PropertiesManager` of their own,
//! so option values get the same type rules, defaults and readonly switch as
//! any owner's properties.
//!
//! ## Example
//!
//! ```
//! use modelkit::{
//!     Converter, ManagerMode, Modifier, Owner, Pipeline, PropertiesManager, PropertyDecl,
//!     TypeRule, Value,
//! };
//!
//! let slug = Pipeline::new()
//!     .with(Modifier::new("trim").unwrap())
//!     .with(Modifier::new("lowercase").unwrap())
//!     .with(Modifier::build("pattern", [("pattern", "^[a-z0-9-]+$")]).unwrap());
//!
//! let mut props = PropertiesManager::new(Owner::new("Page"));
//! props
//!     .initialize(
//!         vec![
//!             PropertyDecl::new("slug", TypeRule::coerce(Converter::String)).modifiers(slug),
//!             PropertyDecl::new("views", TypeRule::coerce(Converter::Int)).default(0),
//!         ],
//!         ManagerMode::Mutable,
//!         false,
//!     )
//!     .unwrap();
//!
//! props.set("slug", "  Hello-World ").unwrap();
//! assert_eq!(props.get("slug").unwrap(), Value::from("hello-world"));
//! assert!(props.set("slug", "no spaces allowed").is_err());
//! ```
//!
//! ## Module Overview
//!
//! - [`properties`]: Declarations, the manager and the `Model` mix-in
//! - [`modifiers`]: Prototypes, modifiers, pipelines, registry, built-ins
//! - [`value`]: The dynamic [`Value`] type
//! - [`config`]: Priority settings
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod modifiers;
pub mod properties;
pub mod value;

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures;

pub use config::ModelkitConfig;
pub use error::{ModelError, Result};
pub use modifiers::{
    EvalError, Modifier, ModifierKind, Pipeline, Prototype, PrototypeRef, Registry, SchemaData,
    ValidationFailure,
};
pub use properties::{
    Caller, Converter, ManagerMode, Mode, Model, Owner, PropertiesManager, PropertyDecl,
    PropertySource, TypeRule,
};
pub use value::{Value, ValueKind};
