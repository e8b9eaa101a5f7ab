//! Atomspace configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Module used for grounded names without an explicit module.
pub const DEFAULT_MODULE: &str = "__main__";

/// Nesting bound for evaluate/execute recursion.
pub const DEFAULT_MAX_EXECUTION_DEPTH: usize = 64;

/// Largest accepted `max_execution_depth`; evaluation nests on the call stack.
pub const MAX_EXECUTION_DEPTH_CEILING: usize = 256;

/// Per-space settings. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Label used in logs and exports.
    pub name: Option<String>,
    /// Module that `lang:function` names resolve in.
    pub default_module: String,
    /// Maximum evaluate/execute nesting before failing.
    pub max_execution_depth: usize,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            name: None,
            default_module: DEFAULT_MODULE.to_string(),
            max_execution_depth: DEFAULT_MAX_EXECUTION_DEPTH,
        }
    }
}

impl SpaceConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SpaceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_module.is_empty() {
            return Err(Error::Validation("Expecting a non-empty default_module".into()));
        }
        if !(1..=MAX_EXECUTION_DEPTH_CEILING).contains(&self.max_execution_depth) {
            return Err(Error::Validation(format!(
                "Expecting max_execution_depth between 1 and {MAX_EXECUTION_DEPTH_CEILING}, got {}",
                self.max_execution_depth
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let c = SpaceConfig::default();
        assert_eq!(c.default_module, "__main__");
        assert_eq!(c.max_execution_depth, 64);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let c = SpaceConfig::from_json(r#"{"name": "kb", "max_execution_depth": 8}"#).unwrap();
        assert_eq!(
            c,
            SpaceConfig {
                name: Some("kb".into()),
                default_module: "__main__".into(),
                max_execution_depth: 8,
            }
        );
    }

    #[test]
    fn test_from_json_rejects_zero_depth() {
        let err = SpaceConfig::from_json(r#"{"max_execution_depth": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_from_json_rejects_depth_above_ceiling() {
        assert!(SpaceConfig::from_json(r#"{"max_execution_depth": 256}"#).is_ok());
        let err = SpaceConfig::from_json(r#"{"max_execution_depth": 100000}"#).unwrap_err();
        assert!(err.to_string().contains("Expecting max_execution_depth between 1 and 256"));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(SpaceConfig::from_json("{"), Err(Error::Json(_))));
    }
}
