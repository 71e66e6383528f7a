//! Configuration file model

use crate::diagnostics::Severity;
use crate::{Result, RubricError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Files linted when the configuration does not say otherwise
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.rb", "**/*.rake", "**/Gemfile", "**/Rakefile"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linter: Option<LinterConfiguration>,

    /// Severity per rule id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, RuleSeverity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<FilesConfiguration>,
}

/// Linter configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinterConfiguration {
    /// Enable/disable linter
    pub enabled: Option<bool>,
}

/// File selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesConfiguration {
    /// Glob patterns to include
    pub include: Option<Vec<String>>,
    /// Glob patterns to exclude
    pub exclude: Option<Vec<String>>,
}

/// Rule severity level as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Disable the rule
    Off,
    Info,
    Warn,
    Error,
}

impl RuleSeverity {
    /// Diagnostic severity, `None` when the rule is off
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            RuleSeverity::Off => None,
            RuleSeverity::Info => Some(Severity::Info),
            RuleSeverity::Warn => Some(Severity::Warning),
            RuleSeverity::Error => Some(Severity::Error),
        }
    }
}

impl RubricConfig {
    /// Load from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RubricError::io_error(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                RubricError::config_error(format!("{}: {e}", path.display()))
            }),
            _ => Err(RubricError::config_error(format!(
                "{}: unsupported file extension (expected .toml or .json)",
                path.display()
            ))),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RubricError::config_error(e.to_string()))
    }

    pub fn linter_enabled(&self) -> bool {
        self.linter
            .as_ref()
            .and_then(|linter| linter.enabled)
            .unwrap_or(true)
    }

    /// Configured severity for `rule_id`, if any
    pub fn rule_severity(&self, rule_id: &str) -> Option<RuleSeverity> {
        self.rules.get(rule_id).copied()
    }

    pub fn include_patterns(&self) -> Vec<String> {
        self.files
            .as_ref()
            .and_then(|files| files.include.clone())
            .unwrap_or_else(|| DEFAULT_INCLUDE.iter().map(|p| p.to_string()).collect())
    }

    pub fn exclude_patterns(&self) -> Vec<String> {
        self.files
            .as_ref()
            .and_then(|files| files.exclude.clone())
            .unwrap_or_default()
    }
}
