//! Type constraint engine
//!
//! - [`Value`]: typed option values
//! - [`TypeConstraint`]: validate/serialize/unserialize triads with a rank
//! - [`TypeConstraintRegistry`]: built-ins in specificity order
//! - [`ConstraintResolver`]: specificity-aware detection over a constraint set
//! - [`presets`]: enumeration and bounded number constraints

mod constraint;
mod errors;
pub mod presets;
mod registry;
mod resolver;
mod value;

pub use constraint::{CustomConstraint, FunctionEvaluator, TypeConstraint};
pub use errors::{ConstraintError, ConstraintResult};
pub use registry::{TypeConstraintRegistry, SPECIFICITY_ORDER};
pub use resolver::ConstraintResolver;
pub use value::{FunctionValue, Value};
