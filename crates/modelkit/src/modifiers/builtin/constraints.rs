//! Built-in constraints.
//!
//! Null passes every constraint except `required`: absence is its concern
//! alone. Error codes are `<name>.<reason>`.

use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::modifiers::prototype::{
    ConfigView, Describe, EvalError, ExportSchema, MessageOverride, ModifierKind, Prototype,
};
use crate::properties::{Converter, PropertyDecl, TypeRule};
use crate::value::Value;

fn optional(name: &str, converter: Converter) -> PropertyDecl {
    PropertyDecl::new(name, TypeRule::coerce(converter))
        .nullable()
        .default(Value::Null)
}

/// Rejects empty values: null, empty strings, empty lists and maps.
#[derive(Debug, Clone, Default)]
pub struct Required;

impl Prototype for Required {
    fn name(&self) -> &str {
        "required"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Constraint
    }

    fn config(&self) -> Vec<PropertyDecl> {
        vec![optional("message", Converter::String)]
    }

    fn process(&self, value: &mut Value, _config: &ConfigView<'_>) -> Result<(), EvalError> {
        if value.is_empty() {
            return Err(EvalError::new("required.missing", "a value is required"));
        }
        Ok(())
    }

    fn messages(&self) -> Option<&dyn MessageOverride> {
        Some(self)
    }
}

impl MessageOverride for Required {
    fn message(&self, _error: &EvalError, config: &ConfigView<'_>) -> Option<String> {
        config.str("message")
    }
}

const LENGTH_MODES: [&str; 3] = ["chars", "width", "bytes"];

/// Bounds the length of strings, lists and maps.
///
/// `mode` picks how strings are measured: `chars` (default), display
/// `width`, or `bytes`.
#[derive(Debug, Clone, Default)]
pub struct Length;

impl Length {
    fn measure(value: &Value, mode: &str) -> Option<usize> {
        match value {
            Value::Str(s) => Some(match mode {
                "width" => s.width(),
                "bytes" => s.len(),
                _ => s.chars().count(),
            }),
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }
}

impl Prototype for Length {
    fn name(&self) -> &str {
        "length"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Constraint
    }

    fn config(&self) -> Vec<PropertyDecl> {
        vec![
            optional("min", Converter::Int),
            optional("max", Converter::Int),
            PropertyDecl::new("mode", TypeRule::coerce(Converter::String)).default("chars"),
        ]
    }

    fn priority_offset(&self) -> i64 {
        10
    }

    fn prepare(&mut self, config: &ConfigView<'_>) -> Result<(), String> {
        let mode = config.str("mode").unwrap_or_default();
        if !LENGTH_MODES.contains(&mode.as_str()) {
            return Err(format!(
                "mode must be one of {}, got '{}'",
                LENGTH_MODES.join(", "),
                mode
            ));
        }
        match (config.i64("min"), config.i64("max")) {
            (Some(min), _) if min < 0 => Err(format!("min must not be negative, got {}", min)),
            (Some(min), Some(max)) if min > max => {
                Err(format!("min ({}) is greater than max ({})", min, max))
            }
            _ => Ok(()),
        }
    }

    fn process(&self, value: &mut Value, config: &ConfigView<'_>) -> Result<(), EvalError> {
        if value.is_null() {
            return Ok(());
        }
        let mode = config.str("mode").unwrap_or_default();
        let Some(length) = Self::measure(value, &mode) else {
            return Err(EvalError::new(
                "length.unsupported",
                format!("cannot measure the length of a {}", value.kind()),
            ));
        };
        let length = length as i64;

        if let Some(min) = config.i64("min") {
            if length < min {
                return Err(EvalError::new(
                    "length.too_short",
                    format!("must be at least {} long, got {}", min, length),
                )
                .with_param("min", min)
                .with_param("length", length));
            }
        }
        if let Some(max) = config.i64("max") {
            if length > max {
                return Err(EvalError::new(
                    "length.too_long",
                    format!("must be at most {} long, got {}", max, length),
                )
                .with_param("max", max)
                .with_param("length", length));
            }
        }
        Ok(())
    }

    fn describe(&self) -> Option<&dyn Describe> {
        Some(self)
    }

    fn schema(&self) -> Option<&dyn ExportSchema> {
        Some(self)
    }
}

impl Describe for Length {
    fn label(&self, config: &ConfigView<'_>) -> String {
        match (config.i64("min"), config.i64("max")) {
            (Some(min), Some(max)) => format!("Length between {} and {}", min, max),
            (Some(min), None) => format!("Length at least {}", min),
            (None, Some(max)) => format!("Length at most {}", max),
            (None, None) => "Any length".to_string(),
        }
    }

    fn description(&self, config: &ConfigView<'_>) -> Option<String> {
        config
            .str("mode")
            .map(|mode| format!("Strings are measured in {}", mode))
    }
}

impl ExportSchema for Length {
    fn schema_data(&self, config: &ConfigView<'_>) -> Value {
        let mut entries = Vec::new();
        for key in ["min", "max"] {
            if let Some(value) = config.get(key) {
                entries.push((key, value));
            }
        }
        if let Some(mode) = config.str("mode").filter(|m| m != "chars") {
            entries.push(("mode", Value::from(mode)));
        }
        Value::map(entries)
    }
}

/// Bounds numbers, inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct Range;

impl Prototype for Range {
    fn name(&self) -> &str {
        "range"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Constraint
    }

    fn config(&self) -> Vec<PropertyDecl> {
        vec![
            optional("min", Converter::Float),
            optional("max", Converter::Float),
        ]
    }

    fn priority_offset(&self) -> i64 {
        10
    }

    fn prepare(&mut self, config: &ConfigView<'_>) -> Result<(), String> {
        match (config.f64("min"), config.f64("max")) {
            (Some(min), Some(max)) if min > max => {
                Err(format!("min ({}) is greater than max ({})", min, max))
            }
            _ => Ok(()),
        }
    }

    fn process(&self, value: &mut Value, config: &ConfigView<'_>) -> Result<(), EvalError> {
        if value.is_null() {
            return Ok(());
        }
        let Some(number) = value.as_f64() else {
            return Err(EvalError::new(
                "range.not_a_number",
                format!("expected a number, got {}", value.kind()),
            ));
        };
        if let Some(min) = config.f64("min") {
            if number < min {
                return Err(EvalError::new(
                    "range.below_min",
                    format!("must be at least {}", min),
                )
                .with_param("min", min));
            }
        }
        if let Some(max) = config.f64("max") {
            if number > max {
                return Err(EvalError::new(
                    "range.above_max",
                    format!("must be at most {}", max),
                )
                .with_param("max", max));
            }
        }
        Ok(())
    }
}

/// Requires strings to match a regular expression.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    compiled: Option<Regex>,
}

impl Prototype for Pattern {
    fn name(&self) -> &str {
        "pattern"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Constraint
    }

    fn config(&self) -> Vec<PropertyDecl> {
        vec![PropertyDecl::new("pattern", TypeRule::coerce(Converter::String))]
    }

    fn priority_offset(&self) -> i64 {
        20
    }

    fn prepare(&mut self, config: &ConfigView<'_>) -> Result<(), String> {
        let source = config.str("pattern").unwrap_or_default();
        let regex = Regex::new(&source).map_err(|e| format!("invalid pattern: {}", e))?;
        self.compiled = Some(regex);
        Ok(())
    }

    fn process(&self, value: &mut Value, _config: &ConfigView<'_>) -> Result<(), EvalError> {
        if value.is_null() {
            return Ok(());
        }
        let Some(text) = value.as_str() else {
            return Err(EvalError::new(
                "pattern.not_a_string",
                format!("expected a string, got {}", value.kind()),
            ));
        };
        match &self.compiled {
            Some(regex) if regex.is_match(text) => Ok(()),
            Some(regex) => Err(EvalError::new(
                "pattern.mismatch",
                format!("does not match {}", regex.as_str()),
            )
            .with_param("pattern", regex.as_str())),
            None => Err(EvalError::new("pattern.unprepared", "no pattern configured")),
        }
    }
}

/// Requires the value to equal one of `choices`.
#[derive(Debug, Clone, Default)]
pub struct Choice;

impl Prototype for Choice {
    fn name(&self) -> &str {
        "choice"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Constraint
    }

    fn config(&self) -> Vec<PropertyDecl> {
        vec![PropertyDecl::new("choices", TypeRule::coerce(Converter::List))]
    }

    fn priority_offset(&self) -> i64 {
        20
    }

    fn prepare(&mut self, config: &ConfigView<'_>) -> Result<(), String> {
        match config.list("choices") {
            Some(choices) if !choices.is_empty() => Ok(()),
            _ => Err("choices must not be empty".to_string()),
        }
    }

    fn process(&self, value: &mut Value, config: &ConfigView<'_>) -> Result<(), EvalError> {
        if value.is_null() {
            return Ok(());
        }
        let choices = config.list("choices").unwrap_or_default();
        if choices.contains(value) {
            return Ok(());
        }
        let allowed: Vec<String> = choices.iter().map(Value::to_string).collect();
        Err(EvalError::new(
            "choice.not_allowed",
            format!("must be one of {}", allowed.join(", ")),
        )
        .with_param("choices", choices))
    }
}

/// Requires list items to be distinct.
#[derive(Debug, Clone, Default)]
pub struct Unique;

impl Prototype for Unique {
    fn name(&self) -> &str {
        "unique"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Constraint
    }

    fn priority_offset(&self) -> i64 {
        30
    }

    fn process(&self, value: &mut Value, _config: &ConfigView<'_>) -> Result<(), EvalError> {
        let Some(items) = value.as_list() else {
            return Ok(());
        };
        for (idx, item) in items.iter().enumerate() {
            if items[..idx].contains(item) {
                return Err(EvalError::new(
                    "unique.duplicate",
                    format!("{} appears more than once", item),
                )
                .with_param("item", item.clone()));
            }
        }
        Ok(())
    }
}
