//! Type constraints
//!
//! A constraint is the validate/serialize/unserialize triad describing one
//! admissible shape of an option value. Built-in constraints carry a
//! specificity rank; custom constraints are unranked.

use std::fmt;
use std::rc::Rc;

use super::errors::{ConstraintError, ConstraintResult};
use super::value::{FunctionValue, Value};

/// A user-supplied constraint.
///
/// `serialize` returning `None` means "no attribute"; `unserialize`
/// receives `None` when the attribute is absent.
pub trait CustomConstraint {
    /// Name used in diagnostics
    fn name(&self) -> &str {
        "custom"
    }

    fn validate(&self, value: &Value) -> bool;

    fn serialize(&self, value: &Value) -> Option<String>;

    fn unserialize(&self, text: Option<&str>) -> ConstraintResult<Value>;
}

/// Reconstructs a callable from attribute text.
///
/// Evaluating attribute text as code is unsafe in any host that renders
/// untrusted markup, so the function type is only usable when the caller
/// supplies an evaluator and enables it in [`ApiConfig`].
///
/// [`ApiConfig`]: crate::config::ApiConfig
pub trait FunctionEvaluator {
    fn evaluate(&self, source: &str) -> Result<FunctionValue, String>;
}

/// One admissible type for an option
#[derive(Clone)]
pub enum TypeConstraint {
    Null,
    Bool,
    Number,
    Array,
    Record,
    Function(Rc<dyn FunctionEvaluator>),
    String,
    Custom(Rc<dyn CustomConstraint>),
}

impl TypeConstraint {
    /// Wrap a custom constraint
    pub fn custom(constraint: impl CustomConstraint + 'static) -> Self {
        TypeConstraint::Custom(Rc::new(constraint))
    }

    /// Function type backed by the given evaluator
    pub fn function(evaluator: impl FunctionEvaluator + 'static) -> Self {
        TypeConstraint::Function(Rc::new(evaluator))
    }

    /// Specificity rank, lower is more specific. Custom constraints are unranked.
    pub fn rank(&self) -> Option<u8> {
        match self {
            TypeConstraint::Null => Some(0),
            TypeConstraint::Bool => Some(1),
            TypeConstraint::Number => Some(2),
            TypeConstraint::Array => Some(3),
            TypeConstraint::Record => Some(4),
            TypeConstraint::Function(_) => Some(5),
            TypeConstraint::String => Some(6),
            TypeConstraint::Custom(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeConstraint::Null => "null",
            TypeConstraint::Bool => "Boolean",
            TypeConstraint::Number => "Number",
            TypeConstraint::Array => "Array",
            TypeConstraint::Record => "Object",
            TypeConstraint::Function(_) => "Function",
            TypeConstraint::String => "String",
            TypeConstraint::Custom(c) => c.name(),
        }
    }

    pub fn is_null_type(&self) -> bool {
        matches!(self, TypeConstraint::Null)
    }

    pub fn validate(&self, value: &Value) -> bool {
        match self {
            TypeConstraint::Null => value.is_null(),
            TypeConstraint::Bool => matches!(value, Value::Bool(_)),
            TypeConstraint::Number => matches!(value, Value::Number(n) if n.is_finite()),
            TypeConstraint::Array => matches!(value, Value::Array(_)),
            TypeConstraint::Record => matches!(value, Value::Record(_)),
            TypeConstraint::Function(_) => matches!(value, Value::Function(_)),
            TypeConstraint::String => matches!(value, Value::String(_)),
            TypeConstraint::Custom(c) => c.validate(value),
        }
    }

    /// Serialized form of a value this constraint validated.
    ///
    /// `None` means the attribute must be removed (boolean `false`).
    pub fn serialize(&self, value: &Value) -> Option<String> {
        match (self, value) {
            (TypeConstraint::Custom(c), _) => c.serialize(value),
            (TypeConstraint::Null, _) => Some("null".to_string()),
            (TypeConstraint::Bool, Value::Bool(true)) => Some(String::new()),
            (TypeConstraint::Bool, Value::Bool(false)) => None,
            (TypeConstraint::Number, Value::Number(n)) => Some(format_number(*n)),
            (TypeConstraint::Array | TypeConstraint::Record, _) => {
                Some(value.to_json().to_string())
            }
            (TypeConstraint::Function(_), Value::Function(f)) => Some(f.source().to_string()),
            (TypeConstraint::String, Value::String(s)) => Some(s.clone()),
            _ => Some(value.to_string()),
        }
    }

    /// Parses attribute text (or its absence) into a candidate value.
    ///
    /// The result is not yet validated.
    pub fn unserialize(&self, text: Option<&str>) -> ConstraintResult<Value> {
        match self {
            TypeConstraint::Custom(c) => c.unserialize(text),
            TypeConstraint::Bool => match text {
                None | Some("false") => Ok(Value::Bool(false)),
                Some("") | Some("true") => Ok(Value::Bool(true)),
                Some(other) => Err(ConstraintError::InvalidBoolean(other.to_string())),
            },
            TypeConstraint::Number => Ok(Value::Number(parse_number(
                text.ok_or(ConstraintError::Absent)?,
            ))),
            TypeConstraint::Null | TypeConstraint::Array | TypeConstraint::Record => {
                parse_json(text.ok_or(ConstraintError::Absent)?)
            }
            TypeConstraint::Function(evaluator) => {
                let source = text.ok_or(ConstraintError::Absent)?;
                evaluator
                    .evaluate(source)
                    .map(Value::Function)
                    .map_err(ConstraintError::Evaluation)
            }
            TypeConstraint::String => text
                .map(|t| Value::String(t.to_string()))
                .ok_or(ConstraintError::Absent),
        }
    }
}

impl fmt::Debug for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeConstraint::Custom(c) => write!(f, "Custom({})", c.name()),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decimal text for a number, without a trailing `.0` for integral values
pub(crate) fn format_number(n: f64) -> String {
    if n == 0.0 {
        // -0 serializes as 0
        return "0".to_string();
    }
    format!("{}", n)
}

/// Numeric parse of attribute text.
///
/// Blank text is zero and unparseable text is NaN, which the number
/// constraint then rejects.
pub(crate) fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_json(text: &str) -> ConstraintResult<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from_json)
        .map_err(|e| ConstraintError::InvalidJson {
            text: text.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ranks_follow_specificity_order() {
        let order = [
            TypeConstraint::Null,
            TypeConstraint::Bool,
            TypeConstraint::Number,
            TypeConstraint::Array,
            TypeConstraint::Record,
            TypeConstraint::String,
        ];
        let ranks: Vec<_> = order.iter().map(|c| c.rank().unwrap()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn test_boolean_triad() {
        let c = TypeConstraint::Bool;
        assert_eq!(c.serialize(&Value::Bool(true)), Some(String::new()));
        assert_eq!(c.serialize(&Value::Bool(false)), None);
        assert_eq!(c.unserialize(None), Ok(Value::Bool(false)));
        assert_eq!(c.unserialize(Some("false")), Ok(Value::Bool(false)));
        assert_eq!(c.unserialize(Some("")), Ok(Value::Bool(true)));
        assert_eq!(c.unserialize(Some("true")), Ok(Value::Bool(true)));
        assert!(c.unserialize(Some("yes")).is_err());
    }

    #[test]
    fn test_number_rejects_nan_and_infinity() {
        let c = TypeConstraint::Number;
        assert!(c.validate(&Value::Number(1.5)));
        assert!(!c.validate(&Value::Number(f64::NAN)));
        assert!(!c.validate(&Value::Number(f64::NEG_INFINITY)));
        let parsed = c.unserialize(Some("abc")).unwrap();
        assert!(!c.validate(&parsed));
    }

    #[test]
    fn test_number_text() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-2.25), "-2.25");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(parse_number(" 10 "), 10.0);
        assert_eq!(parse_number(""), 0.0);
    }

    #[test]
    fn test_null_parses_only_json_null() {
        let c = TypeConstraint::Null;
        assert_eq!(c.unserialize(Some("null")), Ok(Value::Null));
        let five = c.unserialize(Some("5")).unwrap();
        assert!(!c.validate(&five));
        assert!(c.unserialize(Some("nope")).is_err());
        assert_eq!(c.serialize(&Value::Null), Some("null".to_string()));
    }

    #[test]
    fn test_record_rejects_arrays() {
        let c = TypeConstraint::Record;
        let arr = c.unserialize(Some("[1]")).unwrap();
        assert!(!c.validate(&arr));
        let obj = c.unserialize(Some(r#"{"a":1}"#)).unwrap();
        assert!(c.validate(&obj));
        assert_eq!(c.serialize(&obj), Some(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn test_array_serializes_compact_json() {
        let c = TypeConstraint::Array;
        let value = Value::Array(vec![json!("a"), json!("b"), json!("c")]);
        assert_eq!(c.serialize(&value), Some(r#"["a","b","c"]"#.to_string()));
    }

    #[test]
    fn test_string_is_identity() {
        let c = TypeConstraint::String;
        assert_eq!(c.unserialize(Some("10")), Ok(Value::String("10".into())));
        assert_eq!(c.unserialize(None), Err(ConstraintError::Absent));
    }
}
