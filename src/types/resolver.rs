//! Specificity-aware constraint detection
//!
//! # Ordering
//!
//! Constraints are stably sorted by rank. Custom (unranked) constraints come
//! before every built-in and keep their relative order, as do ties. This is
//! what makes the text `null` resolve to the null type before a function or
//! string constraint gets a chance to claim it, and `10` resolve to a number
//! before a string.

use super::constraint::TypeConstraint;
use super::value::Value;

/// Detector over an ordered constraint set
#[derive(Debug, Clone)]
pub struct ConstraintResolver {
    constraints: Vec<TypeConstraint>,
}

impl ConstraintResolver {
    pub fn new(constraints: &[TypeConstraint]) -> Self {
        let mut sorted = constraints.to_vec();
        // Option orders None before Some, so unranked customs lead.
        sorted.sort_by_key(TypeConstraint::rank);
        Self { constraints: sorted }
    }

    /// Constraints in detection order
    pub fn constraints(&self) -> &[TypeConstraint] {
        &self.constraints
    }

    pub fn accepts_null(&self) -> bool {
        self.constraints.iter().any(TypeConstraint::is_null_type)
    }

    /// First constraint that unserializes `text` into a value it also validates.
    ///
    /// Unserialize failures count as "no match". Returns the matching
    /// constraint together with the unserialized value.
    pub fn detect_serialized(&self, text: Option<&str>) -> Option<(&TypeConstraint, Value)> {
        self.constraints.iter().find_map(|constraint| {
            let value = constraint.unserialize(text).ok()?;
            constraint.validate(&value).then_some((constraint, value))
        })
    }

    /// First constraint that validates `value`
    pub fn detect_typed(&self, value: &Value) -> Option<&TypeConstraint> {
        self.constraints.iter().find(|c| c.validate(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConstraintResult, CustomConstraint};

    struct Magic;

    impl CustomConstraint for Magic {
        fn name(&self) -> &str {
            "magic"
        }

        fn validate(&self, value: &Value) -> bool {
            value.as_f64() == Some(321.0)
        }

        fn serialize(&self, _value: &Value) -> Option<String> {
            Some("magic-keyword".to_string())
        }

        fn unserialize(&self, text: Option<&str>) -> ConstraintResult<Value> {
            match text {
                Some("magic-keyword") => Ok(Value::Number(321.0)),
                other => Err(crate::types::ConstraintError::Custom(format!(
                    "Cannot unserialize {:?}",
                    other
                ))),
            }
        }
    }

    #[test]
    fn test_number_beats_string() {
        let resolver = ConstraintResolver::new(&[TypeConstraint::String, TypeConstraint::Number]);
        let (c, v) = resolver.detect_serialized(Some("10")).unwrap();
        assert_eq!(c.name(), "Number");
        assert_eq!(v, Value::Number(10.0));

        let (c, v) = resolver.detect_serialized(Some("abc")).unwrap();
        assert_eq!(c.name(), "String");
        assert_eq!(v, Value::String("abc".into()));
    }

    #[test]
    fn test_null_text_resolves_to_null_type() {
        let resolver = ConstraintResolver::new(&[TypeConstraint::String, TypeConstraint::Null]);
        let (c, v) = resolver.detect_serialized(Some("null")).unwrap();
        assert!(c.is_null_type());
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_custom_constraints_lead_in_input_order() {
        let resolver = ConstraintResolver::new(&[
            TypeConstraint::String,
            TypeConstraint::custom(Magic),
            TypeConstraint::Null,
        ]);
        let names: Vec<_> = resolver.constraints().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["magic", "null", "String"]);

        let (c, v) = resolver.detect_serialized(Some("magic-keyword")).unwrap();
        assert_eq!(c.name(), "magic");
        assert_eq!(v, Value::Number(321.0));
    }

    #[test]
    fn test_no_match_is_none() {
        let resolver = ConstraintResolver::new(&[TypeConstraint::Number]);
        assert!(resolver.detect_serialized(Some("abc")).is_none());
        assert!(resolver.detect_typed(&Value::String("5".into())).is_none());
    }

    #[test]
    fn test_boolean_before_number() {
        let resolver = ConstraintResolver::new(&[TypeConstraint::Number, TypeConstraint::Bool]);
        let (c, _) = resolver.detect_serialized(Some("")).unwrap();
        assert_eq!(c.name(), "Boolean");
        let (c, _) = resolver.detect_serialized(Some("5")).unwrap();
        assert_eq!(c.name(), "Number");
    }
}
