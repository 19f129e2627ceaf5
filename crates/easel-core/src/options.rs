//! Component and global options.
//!
//! Options deserialize from camelCase TOML or JSON documents:
//!
//! ```
//! use easel_core::options::{ComponentOptions, DeepCopyStrategy, UpdateMode};
//!
//! let opts = ComponentOptions::from_toml_str(r#"
//!     pureDataPattern = "^_"
//!     dataDeepCopy = "none"
//!     updateMode = "bindingMap"
//! "#).unwrap();
//! assert!(opts.is_pure_data("_cache"));
//! assert_eq!(opts.data_deep_copy, DeepCopyStrategy::None);
//! assert_eq!(opts.update_mode, UpdateMode::Forced);
//! ```

use std::cell::Cell;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid TOML options: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON options: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Copy strategy ─────────────────────────────────────────────────────────

/// How values are copied into the inner data snapshot and across property passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum DeepCopyStrategy {
    #[serde(rename = "none")]
    None,
    #[default]
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "simple-recursion")]
    SimpleWithRecursion,
}

impl DeepCopyStrategy {
    /// Copy a value for storage.
    ///
    /// `Simple` and `SimpleWithRecursion` are equivalent here: a
    /// `serde_json::Value` owns its children and cannot hold a cycle or a
    /// non-data value, so both produce a structural clone. `None` is decided
    /// by the callers, which keep no inner snapshot and pass owned values
    /// through without copying.
    pub fn copy(self, value: &Value) -> Value {
        value.clone()
    }
}

// ── Update mode ───────────────────────────────────────────────────────────

/// Template update policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Binding map when a single covered field changed, structural diff otherwise.
    #[default]
    Enabled,
    /// Always apply changes through the binding map (`"bindingMap"`).
    Forced,
    /// Always run the structural diff (`"virtualTree"`).
    Disabled,
}

impl UpdateMode {
    pub fn parse(s: &str) -> Self {
        match s {
            "bindingMap" => UpdateMode::Forced,
            "virtualTree" => UpdateMode::Disabled,
            _ => UpdateMode::Enabled,
        }
    }
}

impl<'de> Deserialize<'de> for UpdateMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(UpdateMode::parse(&s))
    }
}

// ── Component options ─────────────────────────────────────────────────────

fn deserialize_pattern<'de, D>(deserializer: D) -> Result<Option<Regex>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) => Regex::new(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentOptions {
    /// Top-level fields matching this pattern are kept out of the inner data
    /// and out of change notifications.
    #[serde(deserialize_with = "deserialize_pattern")]
    pub pure_data_pattern: Option<Regex>,
    pub data_deep_copy: DeepCopyStrategy,
    pub property_passing_deep_copy: DeepCopyStrategy,
    pub reflect_to_attributes: bool,
    pub update_mode: UpdateMode,
}

impl ComponentOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn is_pure_data(&self, field: &str) -> bool {
        self.pure_data_pattern
            .as_ref()
            .is_some_and(|p| p.is_match(field))
    }
}

// ── Global options ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalOptions {
    /// Return callback errors to the caller instead of logging them.
    pub throw_global_error: bool,
}

impl GlobalOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(s)?)
    }
}

thread_local! {
    static GLOBAL: Cell<GlobalOptions> = const {
        Cell::new(GlobalOptions { throw_global_error: false })
    };
}

pub fn global_options() -> GlobalOptions {
    GLOBAL.with(Cell::get)
}

pub fn set_global_options(options: GlobalOptions) {
    GLOBAL.with(|g| g.set(options));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ComponentOptions::default();
        assert!(opts.pure_data_pattern.is_none());
        assert_eq!(opts.data_deep_copy, DeepCopyStrategy::Simple);
        assert_eq!(opts.property_passing_deep_copy, DeepCopyStrategy::Simple);
        assert_eq!(opts.update_mode, UpdateMode::Enabled);
    }

    #[test]
    fn test_json_options() {
        let opts = ComponentOptions::from_json_str(
            r#"{"propertyPassingDeepCopy": "simple-recursion", "reflectToAttributes": true, "updateMode": "virtualTree"}"#,
        )
        .unwrap();
        assert_eq!(opts.property_passing_deep_copy, DeepCopyStrategy::SimpleWithRecursion);
        assert!(opts.reflect_to_attributes);
        assert_eq!(opts.update_mode, UpdateMode::Disabled);
    }

    #[test]
    fn test_copy_strategies_clone_structurally() {
        let value = serde_json::json!({"a": [1, {"b": null}], "c": "x"});
        for strategy in [
            DeepCopyStrategy::None,
            DeepCopyStrategy::Simple,
            DeepCopyStrategy::SimpleWithRecursion,
        ] {
            assert_eq!(strategy.copy(&value), value);
        }
    }

    #[test]
    fn test_bad_pattern() {
        let err = ComponentOptions::from_toml_str("pureDataPattern = \"(\"").unwrap_err();
        assert!(matches!(err, OptionsError::Toml(_)));
    }

    #[test]
    fn test_unknown_update_mode_is_default() {
        assert_eq!(UpdateMode::parse(""), UpdateMode::Enabled);
        assert_eq!(UpdateMode::parse("other"), UpdateMode::Enabled);
    }

    #[test]
    fn test_global_options() {
        let g = GlobalOptions::from_toml_str("throwGlobalError = true").unwrap();
        set_global_options(g);
        assert!(global_options().throw_global_error);
        set_global_options(GlobalOptions::default());
        assert!(!global_options().throw_global_error);
    }
}
