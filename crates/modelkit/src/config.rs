//! # Configuration
//!
//! Modelkit settings are managed by [`confique`], which handles layered
//! loading from a TOML file, environment variables and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `MODELKIT_FILTER_PRIORITY`, `MODELKIT_CONSTRAINT_PRIORITY`.
//! 2. **Config file**: `modelkit.toml` (or any path handed to [`ModelkitConfig::load`]).
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `filter_priority` | `100` | Base priority of every filter modifier |
//! | `constraint_priority` | `200` | Base priority of every constraint modifier |
//!
//! Filters must run before constraints, so a configuration where
//! `filter_priority >= constraint_priority` is rejected on load.

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::modifiers::ModifierKind;

/// Default file name looked up by [`ModelkitConfig::load_default`].
pub const CONFIG_FILE: &str = "modelkit.toml";

/// Modelkit settings, stored in `modelkit.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelkitConfig {
    /// Base priority shared by all filters.
    #[config(default = 100, env = "MODELKIT_FILTER_PRIORITY")]
    pub filter_priority: i64,

    /// Base priority shared by all constraints.
    #[config(default = 200, env = "MODELKIT_CONSTRAINT_PRIORITY")]
    pub constraint_priority: i64,
}

impl Default for ModelkitConfig {
    fn default() -> Self {
        Self {
            filter_priority: 100,
            constraint_priority: 200,
        }
    }
}

impl ModelkitConfig {
    /// Load settings from environment variables and `path`.
    ///
    /// A missing file is not an error; defaults fill the gaps.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::builder().env().file(path.as_ref()).load()?;
        config.validate()?;
        tracing::debug!(
            filter_priority = config.filter_priority,
            constraint_priority = config.constraint_priority,
            "loaded modelkit config"
        );
        Ok(config)
    }

    /// Load settings from `modelkit.toml` in the working directory.
    pub fn load_default() -> Result<Self> {
        Self::load(CONFIG_FILE)
    }

    /// The base priority of a modifier kind.
    pub fn base_priority(&self, kind: ModifierKind) -> i64 {
        match kind {
            ModifierKind::Filter => self.filter_priority,
            ModifierKind::Constraint => self.constraint_priority,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.filter_priority >= self.constraint_priority {
            return Err(ModelError::Config(format!(
                "filter_priority ({}) must be lower than constraint_priority ({})",
                self.filter_priority, self.constraint_priority
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = ModelkitConfig::default();
        assert_eq!(config.filter_priority, 100);
        assert_eq!(config.constraint_priority, 200);
    }

    #[test]
    fn test_base_priority_per_kind() {
        let config = ModelkitConfig {
            filter_priority: 10,
            constraint_priority: 50,
        };
        assert_eq!(config.base_priority(ModifierKind::Filter), 10);
        assert_eq!(config.base_priority(ModifierKind::Constraint), 50);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelkitConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.filter_priority, 100);
        assert_eq!(config.constraint_priority, 200);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "filter_priority = 5\nconstraint_priority = 500\n").unwrap();

        let config = ModelkitConfig::load(&path).unwrap();
        assert_eq!(config.filter_priority, 5);
        assert_eq!(config.constraint_priority, 500);
    }

    #[test]
    fn test_load_rejects_inverted_priorities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "filter_priority = 300\n").unwrap();

        let err = ModelkitConfig::load(&path).unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let text = toml::to_string(&ModelkitConfig::default()).unwrap();
        assert!(text.contains("filter_priority = 100"));
        assert!(text.contains("constraint_priority = 200"));
    }
}
