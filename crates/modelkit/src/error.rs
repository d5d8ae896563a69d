use thiserror::Error;

use crate::value::Value;

/// Every failure raised by properties, managers and modifiers.
///
/// Errors are raised at the violation point and never retried. Variants
/// carry the owner, the property name and, where one exists, the offending
/// value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{owner}: property '{property}' is already declared")]
    AlreadyDeclared { owner: String, property: String },

    #[error("{owner}: properties are already initialized")]
    AlreadyInitialized { owner: String },

    #[error("{owner}: properties are not initialized")]
    Uninitialized { owner: String },

    #[error("{owner}: property '{property}' not found")]
    PropertyNotFound { owner: String, property: String },

    #[error("{owner}: property '{property}' has no value and no default")]
    NotInitialized { owner: String, property: String },

    #[error("{owner}: property '{property}' is not accessible from {caller}")]
    Inaccessible {
        owner: String,
        property: String,
        caller: String,
    },

    #[error("{owner}: property '{property}' is immutable")]
    Immutable {
        owner: String,
        property: String,
        value: Option<Value>,
    },

    #[error(
        "{owner}: invalid value {value} for property '{property}'{}",
        diagnostic_suffix(.diagnostic)
    )]
    InvalidValue {
        owner: String,
        property: String,
        value: Value,
        diagnostic: Option<String>,
    },

    #[error("Invalid prototype: {0}")]
    InvalidPrototype(String),

    #[error("Invalid modifier '{modifier}': {reason}")]
    InvalidModifier { modifier: String, reason: String },

    #[error("Modifier '{modifier}' does not allow property '{property}'")]
    PropertyNotAllowed { modifier: String, property: String },

    #[error("Config error: {0}")]
    Config(String),
}

fn diagnostic_suffix(diagnostic: &Option<String>) -> String {
    match diagnostic {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl ModelError {
    /// Whether this error stems from externally supplied data.
    ///
    /// Data errors are expected and should be surfaced to whoever produced
    /// the data. Everything else is a programming error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ModelError::InvalidValue { .. }
                | ModelError::InvalidPrototype(_)
                | ModelError::InvalidModifier { .. }
                | ModelError::PropertyNotAllowed { .. }
        )
    }

    /// The property the error refers to, if any.
    pub fn property(&self) -> Option<&str> {
        match self {
            ModelError::AlreadyDeclared { property, .. }
            | ModelError::PropertyNotFound { property, .. }
            | ModelError::NotInitialized { property, .. }
            | ModelError::Inaccessible { property, .. }
            | ModelError::Immutable { property, .. }
            | ModelError::InvalidValue { property, .. }
            | ModelError::PropertyNotAllowed { property, .. } => Some(property),
            _ => None,
        }
    }
}

impl From<confique::Error> for ModelError {
    fn from(e: confique::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display_includes_diagnostic() {
        let err = ModelError::InvalidValue {
            owner: "User".into(),
            property: "age".into(),
            value: Value::from("abc"),
            diagnostic: Some("not an integer".into()),
        };
        assert_eq!(
            err.to_string(),
            "User: invalid value \"abc\" for property 'age': not an integer"
        );
    }

    #[test]
    fn invalid_value_display_without_diagnostic() {
        let err = ModelError::InvalidValue {
            owner: "User".into(),
            property: "age".into(),
            value: Value::Null,
            diagnostic: None,
        };
        assert_eq!(err.to_string(), "User: invalid value null for property 'age'");
    }

    #[test]
    fn data_errors_are_recoverable() {
        assert!(ModelError::InvalidPrototype("x".into()).is_recoverable());
        assert!(!ModelError::AlreadyInitialized {
            owner: "User".into()
        }
        .is_recoverable());
        assert!(!ModelError::Inaccessible {
            owner: "User".into(),
            property: "id".into(),
            caller: "public".into(),
        }
        .is_recoverable());
    }

    #[test]
    fn property_accessor() {
        let err = ModelError::Immutable {
            owner: "User".into(),
            property: "id".into(),
            value: None,
        };
        assert_eq!(err.property(), Some("id"));
        assert_eq!(ModelError::Config("x".into()).property(), None);
    }
}
