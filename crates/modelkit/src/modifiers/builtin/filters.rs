//! Built-in string filters. Values that are not strings pass through
//! unchanged.

use crate::modifiers::prototype::{ConfigView, EvalError, ModifierKind, Prototype};
use crate::properties::{Converter, PropertyDecl, TypeRule};
use crate::value::Value;

fn map_str(value: &mut Value, f: impl FnOnce(&str) -> String) {
    if let Value::Str(s) = value {
        *s = f(s.as_str());
    }
}

/// Strips leading and trailing whitespace, or the characters in `chars`.
#[derive(Debug, Clone, Default)]
pub struct Trim;

impl Prototype for Trim {
    fn name(&self) -> &str {
        "trim"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Filter
    }

    fn config(&self) -> Vec<PropertyDecl> {
        vec![PropertyDecl::new("chars", TypeRule::coerce(Converter::String))
            .nullable()
            .default(Value::Null)]
    }

    fn process(&self, value: &mut Value, config: &ConfigView<'_>) -> Result<(), EvalError> {
        match config.str("chars") {
            Some(chars) => map_str(value, |s| {
                s.trim_matches(|c: char| chars.contains(c)).to_string()
            }),
            None => map_str(value, |s| s.trim().to_string()),
        }
        Ok(())
    }
}

/// Replaces every run of whitespace with a single space.
#[derive(Debug, Clone, Default)]
pub struct CollapseWhitespace;

impl Prototype for CollapseWhitespace {
    fn name(&self) -> &str {
        "collapse_whitespace"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Filter
    }

    fn priority_offset(&self) -> i64 {
        5
    }

    fn process(&self, value: &mut Value, _config: &ConfigView<'_>) -> Result<(), EvalError> {
        map_str(value, |s| {
            let mut out = String::with_capacity(s.len());
            let mut in_space = false;
            for c in s.chars() {
                if c.is_whitespace() {
                    if !in_space {
                        out.push(' ');
                    }
                    in_space = true;
                } else {
                    out.push(c);
                    in_space = false;
                }
            }
            out
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lowercase;

impl Prototype for Lowercase {
    fn name(&self) -> &str {
        "lowercase"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Filter
    }

    fn priority_offset(&self) -> i64 {
        10
    }

    fn process(&self, value: &mut Value, _config: &ConfigView<'_>) -> Result<(), EvalError> {
        map_str(value, str::to_lowercase);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Uppercase;

impl Prototype for Uppercase {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Filter
    }

    fn priority_offset(&self) -> i64 {
        10
    }

    fn process(&self, value: &mut Value, _config: &ConfigView<'_>) -> Result<(), EvalError> {
        map_str(value, str::to_uppercase);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::modifiers::Modifier;
    use crate::value::Value;

    fn run(name: &str, input: Value) -> Value {
        let mut modifier = Modifier::new(name).unwrap();
        let mut value = input;
        assert!(modifier.evaluate(&mut value));
        value
    }

    #[test]
    fn test_trim() {
        assert_eq!(run("trim", Value::from("\t hi \n")), Value::from("hi"));
    }

    #[test]
    fn test_trim_custom_chars() {
        let mut modifier = Modifier::build("trim", [("chars", "-*")]).unwrap();
        let mut value = Value::from("--*note*-");
        assert!(modifier.evaluate(&mut value));
        assert_eq!(value, Value::from("note"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            run("collapse_whitespace", Value::from("a  b\t\n c")),
            Value::from("a b c")
        );
    }

    #[test]
    fn test_case_filters() {
        assert_eq!(run("lowercase", Value::from("MiXeD")), Value::from("mixed"));
        assert_eq!(run("uppercase", Value::from("MiXeD")), Value::from("MIXED"));
    }

    #[test]
    fn test_non_strings_pass_through() {
        assert_eq!(run("trim", Value::from(3)), Value::from(3));
        assert_eq!(run("lowercase", Value::Null), Value::Null);
    }
}
