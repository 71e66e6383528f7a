//! Redundant `to_s` inside interpolation

use crate::rule::{Rule, RuleContext, RuleMetadata};
use rubric_core::syntax::{NodeKind, SyntaxNode};
use rubric_core::{Pattern, Result, RubricError, Severity};

/// Rule ID for `#{x.to_s}`
pub const STRING_CONVERSION_IN_INTERPOLATION: &str = "lint/string-conversion-in-interpolation";

const MESSAGE: &str = "Redundant use of `Object#to_s` in interpolation.";
const MESSAGE_SELF: &str = "Use `self` instead of `Object#to_s` in interpolation.";

/// Argument-free `to_s`, receiver captured (absent for an implicit `self`)
const TO_S_CALL: &str = "(send $receiver :to_s)";

/// Flags `to_s` as the value of an interpolation segment
///
/// Interpolation already converts with `to_s`. Only the last expression of
/// a segment is interpolated, so only that one is checked. `to_s` with
/// arguments (`n.to_s(2)`) changes the output and is not flagged, and
/// neither is a safe-navigation `x&.to_s`.
pub struct StringConversionInInterpolation {
    metadata: RuleMetadata,
    to_s_call: Pattern,
}

impl StringConversionInInterpolation {
    pub fn new() -> Result<Self> {
        let to_s_call = Pattern::parse(TO_S_CALL).map_err(|e| {
            RubricError::rule_error(STRING_CONVERSION_IN_INTERPOLATION, e.to_string())
        })?;
        Ok(Self {
            metadata: RuleMetadata {
                id: STRING_CONVERSION_IN_INTERPOLATION,
                name: "String conversion in interpolation",
                description: "Interpolation calls `to_s` already; an explicit call is redundant",
                default_severity: Severity::Warning,
                fixable: true,
            },
            to_s_call,
        })
    }
}

impl Rule for StringConversionInInterpolation {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn trigger_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Interpolation]
    }

    fn check(&self, node: &SyntaxNode, ctx: &mut RuleContext<'_>) {
        let Some(last) = node.child_nodes().last() else {
            return;
        };
        let Some(captures) = self.to_s_call.matches(last) else {
            return;
        };
        let Some(selector) = last.selector() else {
            return;
        };

        let (message, replacement) = match captures.node("receiver") {
            Some(receiver) => (MESSAGE, receiver.text(ctx.source())),
            None => (MESSAGE_SELF, "self"),
        };
        ctx.record_violation(message, selector);
        // the whole call, so `to_s()` loses its parentheses too
        ctx.propose_edit(last.range(), replacement);
    }
}
