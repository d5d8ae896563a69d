//! Priority-grouped evaluation of modifiers.
//!
//! Attached modifiers are grouped by priority and groups run in ascending
//! order. Every modifier of a group is evaluated, even after one of them
//! fails, so all errors of that level are reported together. A failing group
//! stops the run; later groups are never invoked.
//!
//! Within a group, modifiers run in attach order and each one receives the
//! value left by the previous successful modifier.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::Result;
use crate::value::Value;

use super::modifier::Modifier;
use super::registry::Registry;
use super::schema::SchemaData;

#[derive(Debug, Clone)]
struct Attached {
    priority: i64,
    modifier: Modifier,
}

/// An ordered set of attached modifiers.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    entries: Vec<Attached>,
}

/// One rejected evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifierFailure {
    pub name: String,
    pub priority: i64,
    pub code: String,
    pub message: String,
}

/// The errors of the first failing priority group.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    pub priority: i64,
    pub failures: Vec<ModifierFailure>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.name, failure.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a modifier. Its configuration is frozen and its priority is
    /// captured now.
    pub fn attach(&mut self, mut modifier: Modifier) -> &mut Self {
        modifier.freeze();
        let priority = modifier.priority();
        tracing::trace!(modifier = modifier.name(), priority, "modifier attached");
        self.entries.push(Attached { priority, modifier });
        self
    }

    /// Builder-style [`Pipeline::attach`].
    pub fn with(mut self, modifier: Modifier) -> Self {
        self.attach(modifier);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attached modifiers in attach order.
    pub fn modifiers(&self) -> impl Iterator<Item = &Modifier> {
        self.entries.iter().map(|entry| &entry.modifier)
    }

    /// Attached modifiers grouped by ascending priority, attach order kept
    /// within each group.
    pub fn groups(&self) -> Vec<(i64, Vec<&Modifier>)> {
        let mut groups: BTreeMap<i64, Vec<&Modifier>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.priority).or_default().push(&entry.modifier);
        }
        groups.into_iter().collect()
    }

    /// Run `value` through every group. Returns the final value, or the
    /// errors of the first group where any modifier failed.
    pub fn run(&mut self, value: Value) -> std::result::Result<Value, ValidationFailure> {
        self.clear_errors();

        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        // Stable sort keeps attach order within a priority
        order.sort_by_key(|&idx| self.entries[idx].priority);

        let mut current = value;
        let mut start = 0;
        while start < order.len() {
            let priority = self.entries[order[start]].priority;
            let end = order[start..]
                .iter()
                .position(|&idx| self.entries[idx].priority != priority)
                .map_or(order.len(), |offset| start + offset);

            let mut failures = Vec::new();
            for &idx in &order[start..end] {
                let modifier = &mut self.entries[idx].modifier;
                if !modifier.evaluate(&mut current) {
                    failures.push(ModifierFailure {
                        name: modifier.name().to_string(),
                        priority,
                        code: modifier
                            .error()
                            .map(|e| e.code.clone())
                            .unwrap_or_default(),
                        message: modifier.message().unwrap_or_default(),
                    });
                }
            }

            if !failures.is_empty() {
                tracing::debug!(
                    priority,
                    failures = failures.len(),
                    "pipeline stopped at failing group"
                );
                return Err(ValidationFailure { priority, failures });
            }
            tracing::trace!(priority, "priority group passed");
            start = end;
        }
        Ok(current)
    }

    /// Errors recorded by the last run, in attach order.
    pub fn errors(&self) -> Vec<ModifierFailure> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let error = entry.modifier.error()?;
                Some(ModifierFailure {
                    name: entry.modifier.name().to_string(),
                    priority: entry.priority,
                    code: error.code.clone(),
                    message: entry.modifier.message().unwrap_or_default(),
                })
            })
            .collect()
    }

    pub fn clear_errors(&mut self) {
        for entry in &mut self.entries {
            entry.modifier.unset_error();
        }
    }

    /// Schema-data of every attached modifier, in attach order.
    pub fn schema_data(&self) -> Vec<SchemaData> {
        self.modifiers().map(Modifier::schema_data).collect()
    }

    /// Rebuild a pipeline from exported schema-data.
    pub fn from_schema(registry: &Registry, schemas: &[SchemaData]) -> Result<Self> {
        let mut pipeline = Self::new();
        for schema in schemas {
            pipeline.attach(Modifier::from_schema(registry, schema)?);
        }
        Ok(pipeline)
    }
}
