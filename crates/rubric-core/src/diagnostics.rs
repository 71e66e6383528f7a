//! Diagnostic types and the per-walk recorder
//!
//! Diagnostics keep both the byte span (for autofix) and a 1-based
//! line/column pair (for humans) of the offending source.

use biome_text_size::TextRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Represents a diagnostic message from linting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Identifier of the rule that produced this diagnostic, e.g. `lint/rescue-exception`
    pub rule_id: String,
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    pub location: Location,
    /// Code suggestions for fixing the issue
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<CodeSuggestion>,
}

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Location information for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// Byte offset in the file
    pub offset: usize,
    /// Length of the span in bytes
    pub length: usize,
}

/// A code suggestion that can be automatically applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSuggestion {
    /// Description of the suggested fix
    pub message: String,
    /// The replacement text to apply
    pub replacement: String,
    /// Location to apply the replacement
    pub location: Location,
}

impl CodeSuggestion {
    pub fn new(
        message: impl Into<String>,
        replacement: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            message: message.into(),
            replacement: replacement.into(),
            location,
        }
    }
}

impl Diagnostic {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            location,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: CodeSuggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Whether `--fix` can correct this diagnostic
    pub fn is_fixable(&self) -> bool {
        !self.suggestions.is_empty()
    }
}

impl Location {
    /// Location of `range` within `source`
    pub fn from_range(file: impl Into<PathBuf>, source: &str, range: TextRange) -> Self {
        let offset = usize::from(range.start());
        let end = usize::from(range.end());
        let (line, column) = line_column(source, offset);
        let (end_line, end_column) = line_column(source, end);
        Self {
            file: file.into(),
            line,
            column,
            end_line,
            end_column,
            offset,
            length: end.saturating_sub(offset),
        }
    }

    /// Byte span as `(start, end)`
    pub fn span(&self) -> (usize, usize) {
        (self.offset, self.offset + self.length)
    }
}

/// 1-based line and character column of a byte offset
///
/// Offsets past the end (or inside a multi-byte character) are clamped to
/// the nearest preceding character boundary.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Trait for collecting and managing diagnostics
pub trait DiagnosticCollector {
    /// Collect a diagnostic
    fn collect(&mut self, diagnostic: Diagnostic);

    /// Collect multiple diagnostics
    fn collect_all(&mut self, diagnostics: Vec<Diagnostic>) {
        for diagnostic in diagnostics {
            self.collect(diagnostic);
        }
    }

    /// All collected diagnostics, in collection order
    fn diagnostics(&self) -> &[Diagnostic];

    /// Group diagnostics by rule ID
    fn group_by_rule(&self) -> HashMap<String, Vec<&Diagnostic>>;

    /// Get count of diagnostics by severity
    fn count_by_severity(&self) -> HashMap<Severity, usize>;

    fn has_errors(&self) -> bool;

    fn total_count(&self) -> usize;

    fn clear(&mut self);
}

/// Default implementation of DiagnosticCollector
///
/// Keeps insertion order, so diagnostics recorded during one tree walk come
/// out in walk order.
#[derive(Debug, Clone, Default)]
pub struct DefaultDiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DefaultDiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort diagnostics by location (file, then line, then column)
    pub fn sort_by_location(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
        });
    }

    /// Diagnostics reported for `file`
    pub fn diagnostics_for_file(&self, file: &Path) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.location.file == file)
            .collect()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticCollector for DefaultDiagnosticCollector {
    fn collect(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn group_by_rule(&self) -> HashMap<String, Vec<&Diagnostic>> {
        let mut groups: HashMap<String, Vec<&Diagnostic>> = HashMap::new();
        for diagnostic in &self.diagnostics {
            groups
                .entry(diagnostic.rule_id.clone())
                .or_default()
                .push(diagnostic);
        }
        groups
    }

    fn count_by_severity(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.severity).or_insert(0) += 1;
        }
        counts
    }

    fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn total_count(&self) -> usize {
        self.diagnostics.len()
    }

    fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::text_range;

    #[test]
    fn test_line_column() {
        let source = "a = 1\nbb = \"é#{x}\"\n";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 6), (2, 1));
        // `#` comes after a two-byte character
        let hash = source.find('#').unwrap();
        assert_eq!(line_column(source, hash), (2, 8));
        assert_eq!(line_column(source, 1000), (3, 1));
    }

    #[test]
    fn test_location_from_range() {
        let source = "foo\n  bar.to_s\n";
        let location = Location::from_range("a.rb", source, text_range(10, 14));
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 7);
        assert_eq!(location.end_column, 11);
        assert_eq!(location.span(), (10, 14));
        assert_eq!(location.to_string(), "a.rb:2:7");
    }

    #[test]
    fn test_fixable_when_suggestion_attached() {
        let source = "\"#{x.to_s}\"";
        let location = Location::from_range("a.rb", source, text_range(5, 9));
        let diagnostic = Diagnostic::new("r", Severity::Warning, "m", location.clone());
        assert!(!diagnostic.is_fixable());

        let replace = Location::from_range("a.rb", source, text_range(3, 9));
        let diagnostic =
            diagnostic.with_suggestion(CodeSuggestion::new("Replace with `x`", "x", replace));
        assert!(diagnostic.is_fixable());
        let json = serde_json::to_value(&diagnostic.suggestions[0]).unwrap();
        assert_eq!(json["replacement"], "x");
        assert!(json.get("applicability").is_none());
    }

    #[test]
    fn test_collector_keeps_insertion_order() {
        let source = "x\ny\n";
        let mut collector = DefaultDiagnosticCollector::new();
        collector.collect(Diagnostic::new(
            "lint/b",
            Severity::Warning,
            "second line",
            Location::from_range("a.rb", source, text_range(2, 3)),
        ));
        collector.collect(Diagnostic::new(
            "lint/a",
            Severity::Error,
            "first line",
            Location::from_range("a.rb", source, text_range(0, 1)),
        ));

        let messages: Vec<_> = collector.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["second line", "first line"]);
        assert!(collector.has_errors());
        assert_eq!(collector.count_by_severity()[&Severity::Warning], 1);
        assert_eq!(collector.group_by_rule().len(), 2);

        collector.sort_by_location();
        assert_eq!(collector.diagnostics()[0].message, "first line");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }
}
