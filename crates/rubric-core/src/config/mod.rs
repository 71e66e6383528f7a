//! Configuration system for rubric
//!
//! Configuration lives in `.rubric.toml` (or `.rubric.json`) and is found by
//! walking up from the working directory. Without a file every rule runs at
//! its default severity over the default file set.
//!
//! ```toml
//! [linter]
//! enabled = true
//!
//! [rules]
//! "lint/rescue-exception" = "error"
//! "lint/string-conversion-in-interpolation" = "off"
//!
//! [files]
//! include = ["**/*.rb"]
//! exclude = ["vendor/**"]
//! ```

pub mod loader;
pub mod rubric_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
pub use rubric_config::{
    DEFAULT_INCLUDE, FilesConfiguration, LinterConfiguration, RubricConfig, RuleSeverity,
};
