//! Schema validator for option definitions
//!
//! Validation semantics:
//! - Option names are identifier-like and map to attribute names
//! - Every definition admits at least one non-null type
//! - `required` and `default` are mutually exclusive
//! - Defaults satisfy the option's constraints
//! - Options that are neither required, defaulted nor nullable are widened
//!   with the null type (or rejected under the strict policy)
//!
//! Validation is deterministic and never mutates its input.

use crate::config::{ApiConfig, NullabilityPolicy};
use crate::host::naming;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{SchemaError, SchemaResult};
use super::types::{OptionDefinition, OptionSpec, Schema, SchemaDefinition};
use crate::types::{ConstraintResolver, TypeConstraint};

/// Validates and normalizes schema definitions.
pub struct SchemaValidator<'a> {
    config: &'a ApiConfig,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(config: &'a ApiConfig) -> Self {
        Self { config }
    }

    /// Validates a full schema definition.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaError` encountered, attributed to its option.
    pub fn validate(&self, definition: &SchemaDefinition) -> SchemaResult<Schema> {
        let options = definition
            .iter()
            .map(|(name, def)| self.validate_option(name, def))
            .collect::<SchemaResult<Vec<_>>>()?;

        let count = options.len().to_string();
        log_event_with_fields(Event::SchemaDefined, &[("options", count.as_str())]);

        Ok(Schema::new(options, self.config.clone()))
    }

    /// Validates `additions` and amends `base` with them.
    ///
    /// Options present in both are replaced in place; new options are appended.
    /// `base` is left untouched.
    pub fn merge(&self, base: &Schema, additions: &SchemaDefinition) -> SchemaResult<Schema> {
        let validated = additions
            .iter()
            .map(|(name, def)| self.validate_option(name, def))
            .collect::<SchemaResult<Vec<_>>>()?;

        let (mut options, _) = base.clone().into_parts();
        for spec in validated {
            match options.iter_mut().find(|o| o.name() == spec.name()) {
                Some(slot) => *slot = spec,
                None => options.push(spec),
            }
        }

        let count = options.len().to_string();
        log_event_with_fields(Event::SchemaMerged, &[("options", count.as_str())]);

        Ok(Schema::new(options, self.config.clone()))
    }

    /// Validates a single option definition.
    pub fn validate_option(&self, name: &str, definition: &OptionDefinition) -> SchemaResult<OptionSpec> {
        if !naming::is_valid_option_name(name) {
            return Err(SchemaError::invalid_option_name(name));
        }

        let mut types = definition.types().to_vec();
        self.check_constraints(name, &types)?;

        let required = definition.is_required();
        let default = definition.default_value().cloned();

        if required && default.is_some() {
            return Err(SchemaError::required_with_default(name));
        }

        let nullable = types.iter().any(TypeConstraint::is_null_type);
        if !required && default.is_none() && !nullable {
            match self.config.nullability {
                NullabilityPolicy::Widen => types.push(TypeConstraint::Null),
                NullabilityPolicy::Strict => return Err(SchemaError::not_nullable(name)),
            }
        }

        if let Some(value) = &default {
            if ConstraintResolver::new(&types).detect_typed(value).is_none() {
                return Err(SchemaError::invalid_default(name, value));
            }
        }

        Ok(OptionSpec::new(
            name,
            &self.config.attribute_prefix,
            types,
            required,
            default,
        ))
    }

    fn check_constraints(&self, name: &str, types: &[TypeConstraint]) -> SchemaResult<()> {
        if types.is_empty() {
            return Err(SchemaError::invalid_constraint(
                name,
                "Definition must have a valid type constraint",
            ));
        }

        if !self.config.allow_function_type
            && types.iter().any(|t| matches!(t, TypeConstraint::Function(_)))
        {
            return Err(SchemaError::function_type_disabled(name));
        }

        if types.iter().all(TypeConstraint::is_null_type) {
            return Err(SchemaError::null_only(name));
        }

        Ok(())
    }
}
