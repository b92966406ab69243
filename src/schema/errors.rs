//! Schema error types
//!
//! Error codes:
//! - ATTRBIND_SCHEMA_INVALID_OPTION_NAME
//! - ATTRBIND_SCHEMA_INVALID_CONSTRAINT
//! - ATTRBIND_SCHEMA_NULL_ONLY
//! - ATTRBIND_SCHEMA_REQUIRED_WITH_DEFAULT
//! - ATTRBIND_SCHEMA_INVALID_DEFAULT
//! - ATTRBIND_SCHEMA_NOT_NULLABLE
//! - ATTRBIND_SCHEMA_FUNCTION_DISABLED
//! - ATTRBIND_SCHEMA_MALFORMED
//!
//! Every schema error is raised synchronously at definition or merge time.

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Option name cannot be mapped to an attribute name
    InvalidOptionName,
    /// Type constraint missing, empty or unusable
    InvalidConstraint,
    /// Only the null type is admissible
    NullOnly,
    /// Both `required` and `default` given
    RequiredWithDefault,
    /// Default value fails the option's constraints
    InvalidDefault,
    /// Neither required, defaulted nor nullable under the strict policy
    NotNullable,
    /// Function type used without opting in
    FunctionTypeDisabled,
    /// Schema file could not be read or parsed
    Malformed,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::InvalidOptionName => "ATTRBIND_SCHEMA_INVALID_OPTION_NAME",
            SchemaErrorCode::InvalidConstraint => "ATTRBIND_SCHEMA_INVALID_CONSTRAINT",
            SchemaErrorCode::NullOnly => "ATTRBIND_SCHEMA_NULL_ONLY",
            SchemaErrorCode::RequiredWithDefault => "ATTRBIND_SCHEMA_REQUIRED_WITH_DEFAULT",
            SchemaErrorCode::InvalidDefault => "ATTRBIND_SCHEMA_INVALID_DEFAULT",
            SchemaErrorCode::NotNullable => "ATTRBIND_SCHEMA_NOT_NULLABLE",
            SchemaErrorCode::FunctionTypeDisabled => "ATTRBIND_SCHEMA_FUNCTION_DISABLED",
            SchemaErrorCode::Malformed => "ATTRBIND_SCHEMA_MALFORMED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with the offending option attached
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    option: Option<String>,
    message: String,
}

impl SchemaError {
    fn for_option(code: SchemaErrorCode, option: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            option: Some(option.to_string()),
            message: message.into(),
        }
    }

    pub fn invalid_option_name(option: &str) -> Self {
        Self::for_option(
            SchemaErrorCode::InvalidOptionName,
            option,
            "Option names must start with a lowercase letter and contain only ASCII letters and digits",
        )
    }

    pub fn invalid_constraint(option: &str, reason: impl Into<String>) -> Self {
        Self::for_option(SchemaErrorCode::InvalidConstraint, option, reason)
    }

    pub fn null_only(option: &str) -> Self {
        Self::for_option(
            SchemaErrorCode::NullOnly,
            option,
            "Definition must allow at least one type besides null",
        )
    }

    pub fn required_with_default(option: &str) -> Self {
        Self::for_option(
            SchemaErrorCode::RequiredWithDefault,
            option,
            "Option can either be required or have a default value, not both",
        )
    }

    pub fn invalid_default(option: &str, value: impl fmt::Display) -> Self {
        Self::for_option(
            SchemaErrorCode::InvalidDefault,
            option,
            format!("Default value \"{}\" is invalid", value),
        )
    }

    pub fn not_nullable(option: &str) -> Self {
        Self::for_option(
            SchemaErrorCode::NotNullable,
            option,
            "Option must be required, have a default value or allow null",
        )
    }

    pub fn function_type_disabled(option: &str) -> Self {
        Self::for_option(
            SchemaErrorCode::FunctionTypeDisabled,
            option,
            "Function type is disabled; enable allow_function_type to use it",
        )
    }

    /// Create an error for a malformed schema file
    pub fn malformed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::Malformed,
            option: None,
            message: format!("Malformed schema '{}': {}", source.into(), reason.into()),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the option the error is attributed to
    pub fn option(&self) -> Option<&str> {
        self.option.as_deref()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.option {
            Some(option) => write!(
                f,
                "{}: Option definition for option \"{}\" failed: {}",
                self.code, option, self.message
            ),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
