//! Built-in rules

mod rescue_exception;
mod string_conversion;

pub use rescue_exception::{RESCUE_EXCEPTION, RescueException};
pub use string_conversion::{STRING_CONVERSION_IN_INTERPOLATION, StringConversionInInterpolation};

use crate::rule::Rule;
use rubric_core::Result;

/// Every built-in rule, in registration order
pub fn all_rules() -> Result<Vec<Box<dyn Rule>>> {
    Ok(vec![
        Box::new(RescueException::new()?),
        Box::new(StringConversionInInterpolation::new()?),
    ])
}
