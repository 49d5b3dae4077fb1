//! Runtime configuration for the Guardian pipeline.
//!
//! Values come from [`GuardianConfig::default`], a deserialized payload, or
//! `GUARDIAN_*` environment variables via [`GuardianConfig::from_env`].

use serde::{Deserialize, Serialize};

use crate::errors::{GuardianError, GuardianResult};

pub const DEFAULT_DIFF_CONTEXT: usize = 3;
pub const MAX_DIFF_CONTEXT: usize = 64;

/// Grammar the structural front-end parses with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    #[default]
    Python,
    Go,
}

impl SourceLanguage {
    pub fn parse(value: &str) -> GuardianResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "go" | "golang" => Ok(Self::Go),
            other => Err(GuardianError::Config(format!(
                "Unsupported language: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Go => "go",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Run the heal passes before analysis. Off unless explicitly requested.
    pub auto_heal: bool,
    /// Memory kernel capacity; `None` keeps every record.
    pub max_records: Option<usize>,
    /// Context lines around each unified-diff hunk.
    pub diff_context: usize,
    pub language: SourceLanguage,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            auto_heal: false,
            max_records: None,
            diff_context: DEFAULT_DIFF_CONTEXT,
            language: SourceLanguage::default(),
        }
    }
}

impl GuardianConfig {
    /// Build a config from `GUARDIAN_AUTO_HEAL`, `GUARDIAN_MAX_RECORDS`,
    /// `GUARDIAN_DIFF_CONTEXT` and `GUARDIAN_LANGUAGE`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> GuardianResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GuardianResult<Self> {
        let mut config = Self::default();

        if let Some(val) = lookup("GUARDIAN_AUTO_HEAL") {
            let v = val.trim().to_lowercase();
            config.auto_heal = matches!(v.as_str(), "1" | "true" | "yes" | "on");
        }

        if let Some(val) = lookup("GUARDIAN_MAX_RECORDS") {
            let v = val.trim();
            config.max_records = if v.is_empty() || matches!(v, "0" | "none" | "unbounded") {
                None
            } else {
                Some(v.parse::<usize>().map_err(|e| {
                    GuardianError::Config(format!("GUARDIAN_MAX_RECORDS={v}: {e}"))
                })?)
            };
        }

        if let Some(val) = lookup("GUARDIAN_DIFF_CONTEXT") {
            let v = val.trim();
            let parsed = v.parse::<usize>().map_err(|e| {
                GuardianError::Config(format!("GUARDIAN_DIFF_CONTEXT={v}: {e}"))
            })?;
            config.diff_context = parsed.min(MAX_DIFF_CONTEXT);
        }

        if let Some(val) = lookup("GUARDIAN_LANGUAGE") {
            if !val.trim().is_empty() {
                config.language = SourceLanguage::parse(&val)?;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GuardianConfig::default();
        assert!(!config.auto_heal);
        assert_eq!(config.max_records, None);
        assert_eq!(config.diff_context, 3);
        assert_eq!(config.language, SourceLanguage::Python);
    }

    #[test]
    fn test_empty_env_matches_default() {
        let config = GuardianConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, GuardianConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = GuardianConfig::from_lookup(lookup_from(&[
            ("GUARDIAN_AUTO_HEAL", "yes"),
            ("GUARDIAN_MAX_RECORDS", "128"),
            ("GUARDIAN_DIFF_CONTEXT", "1"),
            ("GUARDIAN_LANGUAGE", "Go"),
        ]))
        .unwrap();
        assert!(config.auto_heal);
        assert_eq!(config.max_records, Some(128));
        assert_eq!(config.diff_context, 1);
        assert_eq!(config.language, SourceLanguage::Go);
    }

    #[test]
    fn test_falsy_auto_heal() {
        for value in ["0", "false", "no", "off", ""] {
            let config =
                GuardianConfig::from_lookup(lookup_from(&[("GUARDIAN_AUTO_HEAL", value)]))
                    .unwrap();
            assert!(!config.auto_heal, "{value:?} should disable auto heal");
        }
    }

    #[test]
    fn test_unbounded_records() {
        let config =
            GuardianConfig::from_lookup(lookup_from(&[("GUARDIAN_MAX_RECORDS", "unbounded")]))
                .unwrap();
        assert_eq!(config.max_records, None);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = GuardianConfig::from_lookup(lookup_from(&[("GUARDIAN_MAX_RECORDS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, GuardianError::Config(_)));

        let err = GuardianConfig::from_lookup(lookup_from(&[("GUARDIAN_LANGUAGE", "cobol")]))
            .unwrap_err();
        assert!(matches!(err, GuardianError::Config(_)));
    }

    #[test]
    fn test_diff_context_is_capped() {
        let config =
            GuardianConfig::from_lookup(lookup_from(&[("GUARDIAN_DIFF_CONTEXT", "10000")]))
                .unwrap();
        assert_eq!(config.diff_context, MAX_DIFF_CONTEXT);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: GuardianConfig =
            serde_json::from_str(r#"{"auto_heal": true, "language": "go"}"#).unwrap();
        assert!(config.auto_heal);
        assert_eq!(config.language, SourceLanguage::Go);
        assert_eq!(config.diff_context, DEFAULT_DIFF_CONTEXT);
    }
}
