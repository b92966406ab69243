//! Ready-made custom constraints: string enumerations and bounded numbers.

use super::constraint::{format_number, parse_number, CustomConstraint, TypeConstraint};
use super::errors::{ConstraintError, ConstraintResult};
use super::value::Value;

/// Text restricted to a fixed set of values
#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstraint {
    values: Vec<String>,
}

impl EnumConstraint {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl CustomConstraint for EnumConstraint {
    fn name(&self) -> &str {
        "Enum"
    }

    fn validate(&self, value: &Value) -> bool {
        value
            .as_str()
            .map(|s| self.values.iter().any(|v| v == s))
            .unwrap_or(false)
    }

    fn serialize(&self, value: &Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    fn unserialize(&self, text: Option<&str>) -> ConstraintResult<Value> {
        text.map(|t| Value::String(t.to_string()))
            .ok_or(ConstraintError::Absent)
    }
}

/// Finite number within inclusive bounds, optionally integral
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRange {
    min: f64,
    max: f64,
    integer: bool,
}

impl NumberRange {
    /// Any integer
    pub fn integer() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            integer: true,
        }
    }

    /// Any finite number
    pub fn float() -> Self {
        Self {
            integer: false,
            ..Self::integer()
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = min;
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = max;
        self
    }

    pub fn is_integer(&self) -> bool {
        self.integer
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl CustomConstraint for NumberRange {
    fn name(&self) -> &str {
        if self.integer {
            "Integer"
        } else {
            "Float"
        }
    }

    fn validate(&self, value: &Value) -> bool {
        let Some(n) = value.as_f64() else {
            return false;
        };
        if !n.is_finite() || (self.integer && n.fract() != 0.0) {
            return false;
        }
        n >= self.min && n <= self.max
    }

    fn serialize(&self, value: &Value) -> Option<String> {
        value.as_f64().map(format_number)
    }

    fn unserialize(&self, text: Option<&str>) -> ConstraintResult<Value> {
        let text = text.ok_or(ConstraintError::Absent)?;
        Ok(Value::Number(parse_number(text)))
    }
}

/// `Enum(values…)` constraint
pub fn enumeration<I, S>(values: I) -> TypeConstraint
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    TypeConstraint::custom(EnumConstraint::new(values))
}

/// Integer constraint with optional bounds
pub fn integer(min: Option<f64>, max: Option<f64>) -> TypeConstraint {
    TypeConstraint::custom(bounded(NumberRange::integer(), min, max))
}

/// Float constraint with optional bounds
pub fn float(min: Option<f64>, max: Option<f64>) -> TypeConstraint {
    TypeConstraint::custom(bounded(NumberRange::float(), min, max))
}

fn bounded(mut range: NumberRange, min: Option<f64>, max: Option<f64>) -> NumberRange {
    if let Some(min) = min {
        range = range.min(min);
    }
    if let Some(max) = max {
        range = range.max(max);
    }
    range
}
