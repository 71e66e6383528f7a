//! CLI command implementations

use anyhow::{Context, Result};
use rayon::prelude::*;
use rubric_core::{ConfigLoader, Diagnostic, RubricConfig, RubricError, generate_unified_diff};
use rubric_rules::{LintEngine, RuleRegistry};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::OutputFormat;
use crate::discovery::{FileFilter, discover_files};
use crate::output::{FileError, LintSummary, OutputFormatter};

/// No violations remain
pub const EXIT_CLEAN: u8 = 0;
/// At least one violation remains
pub const EXIT_VIOLATIONS: u8 = 1;
/// A file could not be read, parsed or written, or the configuration is invalid
pub const EXIT_ERROR: u8 = 2;

pub struct LintOptions {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub fix: bool,
    pub dry_run: bool,
    pub config_path: Option<PathBuf>,
    pub colorize_diff: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Check,
    Fix,
    DryRun,
}

/// Lint outcome of one file
struct Checked {
    diagnostics: Vec<Diagnostic>,
    applied_edits: usize,
    diff: Option<String>,
}

/// Lint command implementation
pub fn lint_command(options: LintOptions) -> Result<u8> {
    debug!("Running lint command on paths: {:?}", options.paths);

    let config = load_config(options.config_path.as_deref(), &options.paths)?;
    if !config.linter_enabled() {
        info!("Linting is disabled by configuration");
        if options.format == OutputFormat::Human {
            println!("Linting is disabled by configuration.");
        }
        return Ok(EXIT_CLEAN);
    }

    let engine = LintEngine::new(RuleRegistry::from_config(&config)?);
    debug!("Enabled rules: {:?}", engine.registry().list_ids());

    let filter = FileFilter::from_config(&config)?;
    let files = discover_files(&options.paths, &filter)?;

    let mode = if options.fix {
        Mode::Fix
    } else if options.dry_run {
        Mode::DryRun
    } else {
        Mode::Check
    };

    let start_time = Instant::now();
    let results: Vec<(&PathBuf, rubric_core::Result<Checked>)> = files
        .par_iter()
        .map(|path| (path, process_file(&engine, path, mode, options.colorize_diff)))
        .collect();

    let mut summary = LintSummary::new();
    summary.files_checked = files.len();
    let mut diagnostics = Vec::new();
    let mut file_errors = Vec::new();

    for (path, result) in results {
        match result {
            Ok(checked) => {
                if let Some(diff) = checked.diff {
                    print!("{diff}");
                }
                summary.fixes_applied += checked.applied_edits;
                for diagnostic in &checked.diagnostics {
                    summary.record(diagnostic);
                }
                diagnostics.extend(checked.diagnostics);
            }
            Err(e) => {
                if e.is_recoverable() {
                    warn!("Skipping {}: {}", path.display(), e);
                } else {
                    error!("Failed to process {}: {}", path.display(), e);
                }
                summary.files_failed += 1;
                file_errors.push(FileError {
                    file: path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Checked {} files in {:?}: {} offenses, {} corrected",
        summary.files_checked,
        start_time.elapsed(),
        summary.total_issues(),
        summary.fixes_applied
    );

    OutputFormatter::new(options.format).print_results(&diagnostics, &file_errors, &summary)?;

    Ok(if summary.files_failed > 0 {
        EXIT_ERROR
    } else if summary.has_issues() {
        EXIT_VIOLATIONS
    } else {
        EXIT_CLEAN
    })
}

fn process_file(
    engine: &LintEngine,
    path: &Path,
    mode: Mode,
    colorize_diff: bool,
) -> rubric_core::Result<Checked> {
    let source = fs::read_to_string(path).map_err(|e| RubricError::io_error(path, e))?;

    match mode {
        Mode::Check => Ok(Checked {
            diagnostics: engine.lint(&source, path)?,
            applied_edits: 0,
            diff: None,
        }),
        Mode::Fix => {
            let outcome = engine.fix(&source, path)?;
            if outcome.changed() {
                fs::write(path, &outcome.source).map_err(|e| RubricError::io_error(path, e))?;
                info!(
                    "Corrected {} offenses in {} ({} passes)",
                    outcome.applied_edits,
                    path.display(),
                    outcome.passes
                );
            }
            Ok(Checked {
                diagnostics: outcome.diagnostics,
                applied_edits: outcome.applied_edits,
                diff: None,
            })
        }
        Mode::DryRun => {
            // nothing is written, so report what is on disk
            let diagnostics = engine.lint(&source, path)?;
            let outcome = engine.fix(&source, path)?;
            let diff = outcome
                .changed()
                .then(|| generate_unified_diff(&source, &outcome.source, path, colorize_diff));
            Ok(Checked {
                diagnostics,
                applied_edits: 0,
                diff,
            })
        }
    }
}

/// Rules command implementation
pub fn rules_command(format: OutputFormat, config_path: Option<PathBuf>) -> Result<u8> {
    let config = load_config(config_path.as_deref(), &[])?;
    let registry = RuleRegistry::from_config(&config)?;
    OutputFormatter::new(format).print_rules(&registry)?;
    Ok(EXIT_CLEAN)
}

/// Explicit `--config`, or the nearest config above the first path
fn load_config(config_path: Option<&Path>, paths: &[PathBuf]) -> Result<RubricConfig> {
    let start_dir = match paths.first() {
        Some(path) if path.is_dir() => path.as_path(),
        Some(path) if path.is_file() => match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        },
        _ => Path::new("."),
    };
    let config = ConfigLoader::load(config_path, Some(start_dir))
        .context("Failed to load configuration")?;
    debug!("Loaded configuration");
    Ok(config)
}
