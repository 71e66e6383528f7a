//! Offense annotations for rule tests
//!
//! Expected violations are written under the offending line as carets
//! followed by the message:
//!
//! ```text
//! "a #{x.to_s}"
//!         ^^^^ Redundant use of `Object#to_s` in interpolation.
//! ```
//!
//! A violation spanning several lines is underlined to the end of its first
//! line.

#![allow(dead_code)]

use rubric_core::RuleSeverity;
use rubric_rules::{LintEngine, RuleRegistry};
use std::path::Path;

const TEST_FILE: &str = "test.rb";

/// Engine running only `rule_id`
pub fn engine_for(rule_id: &str) -> LintEngine {
    let mut registry = RuleRegistry::builtin().unwrap();
    assert!(registry.get(rule_id).is_some(), "unknown rule {rule_id}");
    for id in registry.list_ids() {
        if id != rule_id {
            registry.set_severity(id, RuleSeverity::Off);
        }
    }
    LintEngine::new(registry)
}

/// Assert that `rule_id` reports exactly the annotated violations
pub fn expect_offense(rule_id: &str, annotated: &str) {
    let annotated = annotated.strip_prefix('\n').unwrap_or(annotated);
    let source = strip_annotations(annotated);
    let diagnostics = engine_for(rule_id)
        .lint(&source, Path::new(TEST_FILE))
        .unwrap_or_else(|e| panic!("failed to lint:\n{source}\n{e}"));

    let mut marks: Vec<(usize, usize, usize, &str)> = diagnostics
        .iter()
        .map(|d| {
            let location = &d.location;
            let width = if location.end_line == location.line {
                location.end_column.saturating_sub(location.column)
            } else {
                line_width(&source, location.line).saturating_sub(location.column - 1)
            };
            (location.line, location.column, width.max(1), d.message.as_str())
        })
        .collect();
    marks.sort();

    let mut rendered = String::new();
    for (idx, line) in source.split_inclusive('\n').enumerate() {
        rendered.push_str(line);
        for (_, column, width, message) in marks.iter().filter(|m| m.0 == idx + 1) {
            rendered.push_str(&" ".repeat(column - 1));
            rendered.push_str(&"^".repeat(*width));
            rendered.push(' ');
            rendered.push_str(message);
            rendered.push('\n');
        }
    }

    assert_eq!(rendered, annotated);
}

/// Assert that `rule_id` reports nothing for `source`
pub fn expect_no_offenses(rule_id: &str, source: &str) {
    let source = source.strip_prefix('\n').unwrap_or(source);
    let diagnostics = engine_for(rule_id)
        .lint(source, Path::new(TEST_FILE))
        .unwrap_or_else(|e| panic!("failed to lint:\n{source}\n{e}"));
    assert!(
        diagnostics.is_empty(),
        "expected no offenses in:\n{source}\ngot: {diagnostics:#?}"
    );
}

/// Assert that fixing `source` with `rule_id` yields `expected`, and that
/// `expected` is left alone
pub fn expect_correction(rule_id: &str, source: &str, expected: &str) {
    let source = source.strip_prefix('\n').unwrap_or(source);
    let expected = expected.strip_prefix('\n').unwrap_or(expected);
    let engine = engine_for(rule_id);

    let outcome = engine.fix(source, Path::new(TEST_FILE)).unwrap();
    assert_eq!(outcome.source, expected);

    let again = engine.fix(expected, Path::new(TEST_FILE)).unwrap();
    assert!(!again.changed(), "correction is not stable: {}", again.source);
}

fn strip_annotations(annotated: &str) -> String {
    annotated
        .split_inclusive('\n')
        .filter(|line| !line.trim_start().starts_with('^'))
        .collect()
}

fn line_width(source: &str, line: usize) -> usize {
    source
        .lines()
        .nth(line - 1)
        .map_or(0, |text| text.chars().count())
}
