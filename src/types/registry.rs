//! Built-in type constraints in specificity order.
//!
//! The function type is only listed when an evaluator has been supplied.

use std::fmt;
use std::rc::Rc;

use super::constraint::{FunctionEvaluator, TypeConstraint};

/// Built-in type names, most specific first
pub const SPECIFICITY_ORDER: [&str; 7] =
    ["null", "Boolean", "Number", "Array", "Object", "Function", "String"];

/// Lookup table for the built-in constraints
#[derive(Clone, Default)]
pub struct TypeConstraintRegistry {
    function_evaluator: Option<Rc<dyn FunctionEvaluator>>,
}

impl TypeConstraintRegistry {
    /// Registry without the function type
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose function type uses `evaluator`
    pub fn with_function_evaluator(evaluator: Rc<dyn FunctionEvaluator>) -> Self {
        Self {
            function_evaluator: Some(evaluator),
        }
    }

    pub fn has_function_type(&self) -> bool {
        self.function_evaluator.is_some()
    }

    /// All available built-ins, most specific first
    pub fn builtins(&self) -> Vec<TypeConstraint> {
        SPECIFICITY_ORDER
            .iter()
            .filter_map(|name| self.lookup(name))
            .collect()
    }

    /// Resolves a type name as written in schema files.
    ///
    /// Names are matched case-insensitively; `record` and `bool` are accepted
    /// as aliases of `Object` and `Boolean`.
    pub fn lookup(&self, name: &str) -> Option<TypeConstraint> {
        match name.to_ascii_lowercase().as_str() {
            "null" => Some(TypeConstraint::Null),
            "boolean" | "bool" => Some(TypeConstraint::Bool),
            "number" => Some(TypeConstraint::Number),
            "array" => Some(TypeConstraint::Array),
            "object" | "record" => Some(TypeConstraint::Record),
            "function" => self
                .function_evaluator
                .as_ref()
                .map(|e| TypeConstraint::Function(Rc::clone(e))),
            "string" => Some(TypeConstraint::String),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConstraintRegistry")
            .field("function_type", &self.has_function_type())
            .finish()
    }
}
