//! Output formatting and reporting

use anyhow::Result;
use colored::*;
use rubric_core::{Diagnostic, Severity};
use rubric_rules::RuleRegistry;
use serde::Serialize;
use std::path::PathBuf;

use crate::OutputFormat;

/// A file that could not be linted
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: PathBuf,
    pub message: String,
}

/// Summary statistics for linting results
#[derive(Debug, Clone, Default)]
pub struct LintSummary {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub fixable: usize,
    pub fixes_applied: usize,
    pub files_failed: usize,
}

impl LintSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.info += 1,
        }
        if diagnostic.is_fixable() {
            self.fixable += 1;
        }
    }

    pub fn total_issues(&self) -> usize {
        self.errors + self.warnings + self.info
    }

    pub fn has_issues(&self) -> bool {
        self.total_issues() > 0
    }
}

/// Output formatter for different formats
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print linting results to stdout; file errors go to stderr in human
    /// format
    pub fn print_results(
        &self,
        diagnostics: &[Diagnostic],
        file_errors: &[FileError],
        summary: &LintSummary,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.print_human_format(diagnostics, file_errors, summary);
                Ok(())
            }
            OutputFormat::Json => self.print_json_format(diagnostics, file_errors, summary),
        }
    }

    fn print_human_format(
        &self,
        diagnostics: &[Diagnostic],
        file_errors: &[FileError],
        summary: &LintSummary,
    ) {
        for diagnostic in diagnostics {
            println!("{}", render_diagnostic(diagnostic));
            for suggestion in &diagnostic.suggestions {
                println!("  {} {}", "help:".cyan(), suggestion.message);
            }
        }
        for error in file_errors {
            eprintln!("{} {}: {}", "error:".red().bold(), error.file.display(), error.message);
        }
        self.print_summary_human(summary);
    }

    fn print_summary_human(&self, summary: &LintSummary) {
        if !summary.has_issues() && summary.files_failed == 0 {
            println!(
                "{} {} checked, no offenses found",
                "✓".green(),
                plural(summary.files_checked, "file")
            );
        } else {
            let mut parts = Vec::new();
            if summary.errors > 0 {
                parts.push(plural(summary.errors, "error").red().to_string());
            }
            if summary.warnings > 0 {
                parts.push(plural(summary.warnings, "warning").yellow().to_string());
            }
            if summary.info > 0 {
                parts.push(summary.info.to_string().blue().to_string() + " info");
            }
            if summary.files_failed > 0 {
                parts.push(format!("{} could not be linted", plural(summary.files_failed, "file")));
            }
            println!(
                "\n{} checked: {}",
                plural(summary.files_checked, "file"),
                parts.join(", ")
            );
            if summary.fixable > 0 {
                println!(
                    "{} can be corrected with `rubric lint --fix`",
                    plural(summary.fixable, "offense")
                );
            }
        }

        if summary.fixes_applied > 0 {
            println!(
                "{} {}",
                "Corrected".green(),
                plural(summary.fixes_applied, "offense")
            );
        }
    }

    fn print_json_format(
        &self,
        diagnostics: &[Diagnostic],
        file_errors: &[FileError],
        summary: &LintSummary,
    ) -> Result<()> {
        let result = serde_json::json!({
            "files_checked": summary.files_checked,
            "diagnostics": diagnostics,
            "errors": file_errors,
            "summary": {
                "errors": summary.errors,
                "warnings": summary.warnings,
                "info": summary.info,
                "total": summary.total_issues(),
                "fixable": summary.fixable,
                "fixes_applied": summary.fixes_applied,
                "files_failed": summary.files_failed,
            }
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }

    /// Print the enabled rules
    pub fn print_rules(&self, registry: &RuleRegistry) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                for (rule, severity) in registry.rules() {
                    let metadata = rule.metadata();
                    let fixable = if metadata.fixable { "fixable" } else { "" };
                    println!(
                        "{:<42} {:<8} {:<8} {}",
                        metadata.id.bold(),
                        severity_label(severity),
                        fixable,
                        metadata.description
                    );
                }
                println!("\n{} enabled", plural(registry.len(), "rule"));
            }
            OutputFormat::Json => {
                let rules: Vec<_> = registry
                    .rules()
                    .map(|(rule, severity)| {
                        serde_json::json!({
                            "id": rule.metadata().id,
                            "name": rule.metadata().name,
                            "description": rule.metadata().description,
                            "severity": severity,
                            "fixable": rule.metadata().fixable,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rules)?);
            }
        }
        Ok(())
    }
}

/// `path:line:col: severity[rule] message`
fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    format!(
        "{}: {}[{}] {}",
        diagnostic.location.to_string().bold(),
        severity_label(diagnostic.severity),
        diagnostic.rule_id,
        diagnostic.message
    )
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue().bold(),
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_core::Location;

    #[test]
    fn test_render_diagnostic() {
        colored::control::set_override(false);
        let location = Location::from_range(
            "lib/a.rb",
            "x\nrescue Exception\n",
            rubric_core::syntax::text_range(2, 18),
        );
        let diagnostic = Diagnostic::new(
            "lint/rescue-exception",
            Severity::Warning,
            "Avoid rescuing the `Exception` class.",
            location,
        );
        assert_eq!(
            render_diagnostic(&diagnostic),
            "lib/a.rb:2:1: warning[lint/rescue-exception] Avoid rescuing the `Exception` class."
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = LintSummary::new();
        let location = Location::from_range("a.rb", "x", rubric_core::syntax::text_range(0, 1));
        summary.record(&Diagnostic::new("r", Severity::Error, "m", location.clone()));
        summary.record(&Diagnostic::new("r", Severity::Info, "m", location));
        assert_eq!(summary.total_issues(), 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.fixable, 0);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(3, "file"), "3 files");
    }
}
