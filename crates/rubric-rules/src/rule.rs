//! Rule trait and the context rules report through

use biome_text_size::TextRange;
use rubric_core::syntax::{NodeKind, SyntaxNode};
use rubric_core::{CodeSuggestion, Corrector, Diagnostic, Location, Severity};
use serde::Serialize;
use std::path::Path;

/// Static description of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMetadata {
    /// Unique identifier, `category/slug`
    pub id: &'static str,
    /// Human-readable name for the rule
    pub name: &'static str,
    /// What the rule checks
    pub description: &'static str,
    /// Severity when the configuration does not override it
    pub default_severity: Severity,
    /// Whether the rule proposes corrections
    pub fixable: bool,
}

/// A lint rule
///
/// The engine calls [`Rule::check`] for every node whose kind is listed in
/// [`Rule::trigger_kinds`]. Rules must not keep state between calls.
pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    /// Node kinds this rule wants to see
    fn trigger_kinds(&self) -> &'static [NodeKind];

    fn check(&self, node: &SyntaxNode, ctx: &mut RuleContext<'_>);
}

/// What one rule invocation may see and report
///
/// Each invocation gets a fresh context, so violations and edits from one
/// invocation can be accepted or deferred as a unit.
pub struct RuleContext<'a> {
    source: &'a str,
    path: &'a Path,
    rule_id: &'static str,
    severity: Severity,
    autocorrect: bool,
    diagnostics: Vec<Diagnostic>,
    corrector: Corrector,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        source: &'a str,
        path: &'a Path,
        rule_id: &'static str,
        severity: Severity,
        autocorrect: bool,
    ) -> Self {
        Self {
            source,
            path,
            rule_id,
            severity,
            autocorrect,
            diagnostics: Vec::new(),
            corrector: Corrector::new(),
        }
    }

    /// Text of the file being checked
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn path(&self) -> &'a Path {
        self.path
    }

    /// Whether proposed edits will be applied
    pub fn autocorrect_requested(&self) -> bool {
        self.autocorrect
    }

    /// Record a violation of this rule at `range`
    pub fn record_violation(&mut self, message: impl Into<String>, range: TextRange) {
        let location = Location::from_range(self.path, self.source, range);
        tracing::debug!("{} at {}", self.rule_id, location);
        self.diagnostics
            .push(Diagnostic::new(self.rule_id, self.severity, message, location));
    }

    /// Propose replacing `range` with `replacement` to fix the last violation
    ///
    /// The edit is attached to that violation as a suggestion and, when
    /// autocorrection was requested, queued for application.
    pub fn propose_edit(&mut self, range: TextRange, replacement: impl Into<String>) {
        let replacement = replacement.into();
        if let Some(diagnostic) = self.diagnostics.last_mut() {
            let location = Location::from_range(self.path, self.source, range);
            diagnostic.suggestions.push(CodeSuggestion::new(
                format!("Replace with `{replacement}`"),
                replacement.clone(),
                location,
            ));
        }
        if self.autocorrect {
            self.corrector.replace(range, replacement);
        }
    }

    /// Violations and edits produced by this invocation
    pub fn finish(self) -> (Vec<Diagnostic>, Corrector) {
        (self.diagnostics, self.corrector)
    }
}
