//! Rubric Rules
//!
//! Built-in Ruby lint rules and the engine that walks a syntax tree,
//! dispatches nodes to rules and turns their corrections into fixed source.

pub mod builtin;
pub mod engine;
pub mod rule;

pub use builtin::{RescueException, StringConversionInInterpolation};
pub use engine::{FixOutcome, LintEngine, MAX_FIX_PASSES, RuleRegistry};
pub use rule::{Rule, RuleContext, RuleMetadata};
