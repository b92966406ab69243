//! Value codec
//!
//! Applies the validate/serialize/unserialize contract of an option's
//! constraint set to one value, in either direction.
//!
//! - Absent or null input on a nullable option short-circuits: decoding
//!   yields `Null`, encoding yields the text `"null"`.
//! - An absent value for a required option is an invalid removal.
//! - Encoding to `None` means the attribute is to be removed.

mod errors;

pub use errors::{CodecError, CodecResult};

use crate::schema::OptionSpec;
use crate::types::Value;

/// Converts option values between attribute text and typed values
pub struct ValueCodec;

impl ValueCodec {
    /// Attribute text (or its absence) to a typed value
    pub fn decode(spec: &OptionSpec, text: Option<&str>) -> CodecResult<Value> {
        if spec.is_required() && text.is_none() {
            return Err(CodecError::InvalidRemoval);
        }

        if text.is_none() && spec.is_nullable() {
            return Ok(Value::Null);
        }

        spec.resolver()
            .detect_serialized(text)
            .map(|(_, value)| value)
            .ok_or_else(|| CodecError::Decode {
                text: text.unwrap_or_default().to_string(),
            })
    }

    /// Typed value (or its absence) to attribute text
    ///
    /// `Ok(None)` means the attribute must be removed.
    pub fn encode(spec: &OptionSpec, value: Option<&Value>) -> CodecResult<Option<String>> {
        if spec.is_required() && value.is_none() {
            return Err(CodecError::InvalidRemoval);
        }

        let value = value.unwrap_or(&Value::Null);
        if value.is_null() && spec.is_nullable() {
            return Ok(Some("null".to_string()));
        }

        let constraint = spec
            .resolver()
            .detect_typed(value)
            .ok_or_else(|| CodecError::Validate {
                value: value.to_string(),
            })?;
        Ok(constraint.serialize(value))
    }
}
