//! Configuration file discovery and loading

use super::rubric_config::RubricConfig;
use crate::{Result, RubricError};
use std::path::{Path, PathBuf};

/// Config file names, in lookup priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[".rubric.toml", ".rubric.json"];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from `start_path`
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path.canonicalize().map_err(|e| {
            RubricError::config_error(format!("Invalid path '{}': {e}", start_path.display()))
        })?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<RubricConfig> {
        RubricConfig::load(path).map_err(|e| match e {
            RubricError::ConfigError { message } => RubricError::config_error(format!(
                "Failed to load config from '{}': {message}",
                path.display()
            )),
            other => other,
        })
    }

    /// Load config from `custom_path`, or discover one from `start_dir`
    ///
    /// An explicit path must exist. When discovery finds nothing the default
    /// configuration is used.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<RubricConfig> {
        if let Some(path) = custom_path {
            if !path.is_file() {
                return Err(RubricError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(RubricConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSeverity;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_auto_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), ".rubric.toml", "");
        let nested = temp_dir.path().join("app").join("models");
        fs::create_dir_all(&nested).unwrap();

        let found = ConfigLoader::auto_discover(&nested).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), ".rubric.toml");
    }

    #[test]
    fn test_toml_takes_priority_over_json() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), ".rubric.json", "{}");
        create_temp_config(temp_dir.path(), ".rubric.toml", "");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), ".rubric.toml");
    }

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(
            temp_dir.path(),
            ".rubric.json",
            r#"{ "rules": { "lint/rescue-exception": "warn" } }"#,
        );

        let config = ConfigLoader::load(Some(&path), None).unwrap();
        assert_eq!(
            config.rule_severity("lint/rescue-exception"),
            Some(RuleSeverity::Warn)
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("/nonexistent/.rubric.toml")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), ".rubric.toml", "[rules\n");
        let err = ConfigLoader::load(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
