//! Rescuing `Exception` without re-raising it

use crate::rule::{Rule, RuleContext, RuleMetadata};
use rubric_core::syntax::{NodeKind, SyntaxNode};
use rubric_core::{Captured, Captures, Pattern, Result, RubricError, Severity, any_match};

/// Rule ID for broad rescue clauses
pub const RESCUE_EXCEPTION: &str = "lint/rescue-exception";

const MESSAGE: &str =
    "Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?";

/// `raise` with no arguments, bare or through `Kernel`/`::Kernel`
const BARE_RERAISE: &str = "(send {nil? (const {nil? cbase} :Kernel)} :raise)";

/// `raise e, ...` where `e` is the variable bound by the clause
const VARIABLE_RERAISE: &str =
    "(send {nil? (const {nil? cbase} :Kernel)} :raise (lvar $variable) ...)";

/// Flags `rescue Exception` clauses that swallow the exception
///
/// A clause whose body re-raises, either with a bare `raise` or by raising
/// the rescued variable again, is left alone. The variable check compares
/// names only.
pub struct RescueException {
    metadata: RuleMetadata,
    bare_reraise: Pattern,
    variable_reraise: Pattern,
}

impl RescueException {
    pub fn new() -> Result<Self> {
        Ok(Self {
            metadata: RuleMetadata {
                id: RESCUE_EXCEPTION,
                name: "Rescue Exception",
                description: "Rescuing `Exception` also catches interrupts and system exits",
                default_severity: Severity::Warning,
                fixable: false,
            },
            bare_reraise: compile(BARE_RERAISE)?,
            variable_reraise: compile(VARIABLE_RERAISE)?,
        })
    }

    fn reraises(&self, clause: &SyntaxNode) -> bool {
        let body = clause.body();
        if any_match(body, &self.bare_reraise, &Captures::new()) {
            return true;
        }
        let Some(variable) = clause
            .exception_variable()
            .and_then(SyntaxNode::variable_name)
        else {
            return false;
        };
        let seed = Captures::new().with("variable", Captured::Name(variable));
        any_match(body, &self.variable_reraise, &seed)
    }
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::parse(pattern).map_err(|e| RubricError::rule_error(RESCUE_EXCEPTION, e.to_string()))
}

fn targets_exception(class: &SyntaxNode) -> bool {
    class.const_name().as_deref() == Some("Exception")
}

impl Rule for RescueException {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn trigger_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Resbody]
    }

    fn check(&self, node: &SyntaxNode, ctx: &mut RuleContext<'_>) {
        let Some(classes) = node.exceptions() else {
            return;
        };
        if !classes.child_nodes().any(targets_exception) {
            return;
        }
        if self.reraises(node) {
            tracing::debug!("rescue Exception re-raises, skipping");
            return;
        }
        ctx.record_violation(MESSAGE, node.range());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        let rule = RescueException::new().unwrap();
        assert_eq!(rule.metadata().id, "lint/rescue-exception");
        assert!(!rule.metadata().fixable);
    }
}
