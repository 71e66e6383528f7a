//! Rule engine implementation
//!
//! The engine walks a parsed file once per pass, hands every node to the
//! rules registered for its kind and collects what they report. In fix mode
//! the edits of each rule invocation are accepted as a unit, or deferred to
//! the next pass when they would overlap an edit already accepted. Passes
//! repeat on the corrected text until nothing changes.

use crate::builtin;
use crate::rule::{Rule, RuleContext};
use rubric_core::syntax::{NodeKind, SyntaxTree};
use rubric_core::{
    Corrector, DefaultDiagnosticCollector, Diagnostic, DiagnosticCollector, Result, RubricConfig,
    RubricError, RuleSeverity, Severity, descendants,
};
use std::collections::HashMap;
use std::path::Path;

/// Upper bound on correction passes over one file
pub const MAX_FIX_PASSES: usize = 10;

struct RegisteredRule {
    rule: Box<dyn Rule>,
    severity: Severity,
}

/// Enabled rules with their effective severity
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<RegisteredRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in rules at their default severity
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for rule in builtin::all_rules()? {
            registry.register(rule);
        }
        Ok(registry)
    }

    /// Built-in rules adjusted by the `[rules]` section of `config`
    ///
    /// Rules configured `off` are dropped. Unknown rule ids are reported and
    /// otherwise ignored.
    pub fn from_config(config: &RubricConfig) -> Result<Self> {
        let mut registry = Self::builtin()?;
        for (rule_id, severity) in &config.rules {
            if !registry.set_severity(rule_id, *severity) {
                tracing::warn!("Unknown rule '{}' in configuration", rule_id);
            }
        }
        Ok(registry)
    }

    /// Register a rule at its default severity, replacing one with the same id
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        let severity = rule.metadata().default_severity;
        let id = rule.metadata().id;
        self.rules.retain(|entry| entry.rule.metadata().id != id);
        self.rules.push(RegisteredRule { rule, severity });
    }

    /// Apply a configured severity; `off` removes the rule
    ///
    /// Returns false if no rule has this id.
    pub fn set_severity(&mut self, rule_id: &str, severity: RuleSeverity) -> bool {
        let Some(idx) = self
            .rules
            .iter()
            .position(|entry| entry.rule.metadata().id == rule_id)
        else {
            return false;
        };
        match severity.to_severity() {
            Some(severity) => self.rules[idx].severity = severity,
            None => {
                tracing::debug!("Rule '{}' disabled by configuration", rule_id);
                self.rules.remove(idx);
            }
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|entry| entry.rule.metadata().id == id)
            .map(|entry| entry.rule.as_ref())
    }

    /// Registered rules with their effective severity
    pub fn rules(&self) -> impl Iterator<Item = (&dyn Rule, Severity)> {
        self.rules
            .iter()
            .map(|entry| (entry.rule.as_ref(), entry.severity))
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .map(|entry| entry.rule.metadata().id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Result of fixing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Violations left in the fixed source
    pub diagnostics: Vec<Diagnostic>,
    /// Source after all accepted edits
    pub source: String,
    /// Number of edits applied over all passes
    pub applied_edits: usize,
    /// Number of passes that changed the source
    pub passes: usize,
}

impl FixOutcome {
    pub fn changed(&self) -> bool {
        self.applied_edits > 0
    }
}

/// Walks syntax trees and runs the registered rules
pub struct LintEngine {
    registry: RuleRegistry,
    dispatch: HashMap<NodeKind, Vec<usize>>,
}

impl LintEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        let mut dispatch: HashMap<NodeKind, Vec<usize>> = HashMap::new();
        for (idx, entry) in registry.rules.iter().enumerate() {
            for kind in entry.rule.trigger_kinds() {
                dispatch.entry(*kind).or_default().push(idx);
            }
        }
        Self { registry, dispatch }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Diagnostics for `source`, in tree-walk order
    pub fn lint(&self, source: &str, path: &Path) -> Result<Vec<Diagnostic>> {
        let tree = SyntaxTree::parse(source)?;
        let (diagnostics, _) = self.walk(&tree, path, false);
        Ok(diagnostics)
    }

    /// Apply corrections until the source is stable
    pub fn fix(&self, source: &str, path: &Path) -> Result<FixOutcome> {
        let mut current = source.to_string();
        let mut applied_edits = 0;
        let mut passes = 0;

        loop {
            let tree = SyntaxTree::parse(&current).map_err(|e| {
                if passes == 0 {
                    e
                } else {
                    RubricError::autofix_error(format!(
                        "{} no longer parses after {passes} correction pass(es): {e}",
                        path.display()
                    ))
                }
            })?;
            let (diagnostics, corrector) = self.walk(&tree, path, true);

            let done = corrector.is_empty() || passes == MAX_FIX_PASSES;
            if !done {
                let next = corrector.apply(&current)?;
                if next != current {
                    applied_edits += corrector.len();
                    passes += 1;
                    tracing::debug!(
                        "{}: pass {} applied {} edit(s)",
                        path.display(),
                        passes,
                        corrector.len()
                    );
                    current = next;
                    continue;
                }
            }

            if passes == MAX_FIX_PASSES && !corrector.is_empty() {
                tracing::warn!(
                    "{}: corrections did not settle after {} passes",
                    path.display(),
                    MAX_FIX_PASSES
                );
            }
            return Ok(FixOutcome {
                diagnostics,
                source: current,
                applied_edits,
                passes,
            });
        }
    }

    /// One pre-order walk; returns diagnostics and the accepted edits
    fn walk(
        &self,
        tree: &SyntaxTree,
        path: &Path,
        autocorrect: bool,
    ) -> (Vec<Diagnostic>, Corrector) {
        let mut collector = DefaultDiagnosticCollector::new();
        let mut accepted = Corrector::new();

        for node in descendants(tree.root()) {
            let Some(indices) = self.dispatch.get(&node.kind()) else {
                continue;
            };
            for &idx in indices {
                let entry = &self.registry.rules[idx];
                let rule_id = entry.rule.metadata().id;
                let mut ctx =
                    RuleContext::new(tree.source(), path, rule_id, entry.severity, autocorrect);
                entry.rule.check(node, &mut ctx);

                let (found, mut proposed) = ctx.finish();
                collector.collect_all(found);
                if !proposed.is_empty() && !accepted.merge(&mut proposed) {
                    tracing::debug!(
                        "{}: deferring {} overlapping edit(s) from {} to the next pass",
                        path.display(),
                        proposed.len(),
                        rule_id
                    );
                }
            }
        }

        (collector.into_diagnostics(), accepted)
    }
}
