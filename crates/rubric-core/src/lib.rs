//! Rubric Core
//!
//! Core engine of the rubric Ruby linter: the syntax tree and its parser,
//! structural patterns, subtree search, diagnostics, text corrections and
//! configuration. Rules and the rule engine live in `rubric-rules`.

pub mod autofix;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pattern;
pub mod result;
pub mod search;
pub mod syntax;

// Re-export commonly used types
pub use autofix::{Corrector, Edit, generate_unified_diff};
pub use config::{ConfigLoader, FilesConfiguration, LinterConfiguration, RubricConfig, RuleSeverity};
pub use diagnostics::{
    CodeSuggestion, DefaultDiagnosticCollector, Diagnostic, DiagnosticCollector, Location,
    Severity, line_column,
};
pub use error::{ErrorKind, RubricError};
pub use pattern::{Captured, Captures, Pattern, PatternError};
pub use result::Result;
pub use search::{any_descendant, any_match, descendants};
pub use syntax::{Child, NodeKind, SyntaxNode, SyntaxTree, parse_ruby};

/// Initialize the tracing subscriber for logging
///
/// `RUBRIC_LOG` takes precedence; otherwise `verbosity` (the number of `-v`
/// flags) raises the default `warn` level.
pub fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("RUBRIC_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("rubric={default_level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .with_file(verbosity > 2)
                .with_line_number(verbosity > 2),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
