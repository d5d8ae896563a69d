//! Type rules.
//!
//! A type rule decides whether a value may live in a property:
//!
//! - **Strict** rules only check. A value that fails the check is rejected and
//!   a value that passes is stored exactly as given.
//! - **Coercive** rules convert. The converter may return a different value
//!   (`"42"` becomes `42`) or fail with a diagnostic.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::value::{Value, ValueKind};

pub type PredicateFn = Rc<dyn Fn(&Value) -> bool>;
pub type ConvertFn = Rc<dyn Fn(Value) -> Result<Value, String>>;

/// What a strict rule checks.
#[derive(Clone)]
pub enum Check {
    /// Accept every value.
    Any,
    /// Accept only values of one kind.
    Kind(ValueKind),
    /// Accept integers and floats.
    Number,
    /// Accept values matching a named predicate.
    Custom { name: String, predicate: PredicateFn },
}

impl Check {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Check::Any => true,
            Check::Kind(kind) => value.kind() == *kind,
            Check::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            Check::Custom { predicate, .. } => predicate(value),
        }
    }

    fn describe(&self) -> String {
        match self {
            Check::Any => "any".to_string(),
            Check::Kind(kind) => kind.to_string(),
            Check::Number => "number".to_string(),
            Check::Custom { name, .. } => name.clone(),
        }
    }
}

/// How a coercive rule converts.
#[derive(Clone)]
pub enum Converter {
    Bool,
    Int,
    Float,
    String,
    /// RFC 3339 strings, `YYYY-MM-DD` dates (midnight UTC) or Unix seconds.
    DateTime,
    Uuid,
    /// Lists pass through, anything else is wrapped in a one-element list.
    List,
    Custom { name: String, convert: ConvertFn },
}

impl Converter {
    fn convert(&self, value: Value) -> Result<Value, String> {
        match self {
            Converter::Bool => to_bool(value),
            Converter::Int => to_int(value),
            Converter::Float => to_float(value),
            Converter::String => to_string(value),
            Converter::DateTime => to_datetime(value),
            Converter::Uuid => to_uuid(value),
            Converter::List => Ok(match value {
                Value::List(items) => Value::List(items),
                other => Value::List(vec![other]),
            }),
            Converter::Custom { convert, .. } => convert(value),
        }
    }

    fn describe(&self) -> String {
        match self {
            Converter::Bool => "bool".to_string(),
            Converter::Int => "int".to_string(),
            Converter::Float => "float".to_string(),
            Converter::String => "string".to_string(),
            Converter::DateTime => "datetime".to_string(),
            Converter::Uuid => "uuid".to_string(),
            Converter::List => "list".to_string(),
            Converter::Custom { name, .. } => name.clone(),
        }
    }
}

/// The type rule of a property.
#[derive(Clone)]
pub enum TypeRule {
    Strict(Check),
    Coerce(Converter),
}

/// Why a type rule refused a value. Owners turn this into
/// [`ModelError::InvalidValue`](crate::error::ModelError::InvalidValue).
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub value: Value,
    pub diagnostic: Option<String>,
}

impl TypeRule {
    pub fn any() -> Self {
        TypeRule::Strict(Check::Any)
    }

    pub fn strict(kind: ValueKind) -> Self {
        TypeRule::Strict(Check::Kind(kind))
    }

    pub fn number() -> Self {
        TypeRule::Strict(Check::Number)
    }

    pub fn predicate(
        name: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        TypeRule::Strict(Check::Custom {
            name: name.into(),
            predicate: Rc::new(predicate),
        })
    }

    pub fn coerce(converter: Converter) -> Self {
        TypeRule::Coerce(converter)
    }

    pub fn converter(
        name: impl Into<String>,
        convert: impl Fn(Value) -> Result<Value, String> + 'static,
    ) -> Self {
        TypeRule::Coerce(Converter::Custom {
            name: name.into(),
            convert: Rc::new(convert),
        })
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, TypeRule::Strict(_))
    }

    /// Run the rule against a candidate value.
    pub fn apply(&self, value: Value) -> Result<Value, Rejection> {
        match self {
            TypeRule::Strict(check) => {
                if check.accepts(&value) {
                    Ok(value)
                } else {
                    let diagnostic = format!("expected {}, got {}", check.describe(), value.kind());
                    Err(Rejection {
                        value,
                        diagnostic: Some(diagnostic),
                    })
                }
            }
            TypeRule::Coerce(converter) => {
                converter
                    .convert(value.clone())
                    .map_err(|diagnostic| Rejection {
                        value,
                        diagnostic: Some(diagnostic),
                    })
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TypeRule::Strict(check) => check.describe(),
            TypeRule::Coerce(converter) => format!("coerce({})", converter.describe()),
        }
    }
}

impl fmt::Debug for TypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRule({})", self.describe())
    }
}

fn to_bool(value: Value) -> Result<Value, String> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Str(ref s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(format!("cannot convert {} to bool", value)),
        },
        other => Err(format!("cannot convert {} to bool", other.kind())),
    }
}

fn to_int(value: Value) -> Result<Value, String> {
    match value {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Value::Int(f as i64))
        }
        Value::Str(ref s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("cannot convert {} to int", value)),
        other => Err(format!("cannot convert {} to int", other)),
    }
}

fn to_float(value: Value) -> Result<Value, String> {
    match value {
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Str(ref s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(format!("cannot convert {} to float", value)),
        },
        other => Err(format!("cannot convert {} to float", other)),
    }
}

fn to_string(value: Value) -> Result<Value, String> {
    match value {
        Value::Str(s) => Ok(Value::Str(s)),
        Value::Bool(b) => Ok(Value::Str(b.to_string())),
        Value::Int(i) => Ok(Value::Str(i.to_string())),
        Value::Float(f) => Ok(Value::Str(f.to_string())),
        Value::DateTime(dt) => Ok(Value::Str(dt.to_rfc3339())),
        Value::Uuid(id) => Ok(Value::Str(id.to_string())),
        other => Err(format!("cannot convert {} to string", other.kind())),
    }
}

fn to_datetime(value: Value) -> Result<Value, String> {
    match value {
        Value::DateTime(dt) => Ok(Value::DateTime(dt)),
        Value::Int(secs) => DateTime::<Utc>::from_timestamp(secs, 0)
            .map(Value::DateTime)
            .ok_or_else(|| format!("timestamp {} is out of range", secs)),
        Value::Str(ref s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(Value::DateTime(dt.with_timezone(&Utc)));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Value::DateTime(naive.and_utc()))
                .ok_or_else(|| format!("cannot convert {} to datetime", value))
        }
        other => Err(format!("cannot convert {} to datetime", other.kind())),
    }
}

fn to_uuid(value: Value) -> Result<Value, String> {
    match value {
        Value::Uuid(id) => Ok(Value::Uuid(id)),
        Value::Str(ref s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|e| format!("cannot convert {} to uuid: {}", value, e)),
        other => Err(format!("cannot convert {} to uuid", other.kind())),
    }
}
