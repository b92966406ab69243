//! Typed option values
//!
//! The in-memory side of a binding. Arrays and records hold plain JSON
//! data because their serialized form is JSON text.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Number};

/// Callable reconstructed from source text by a [`FunctionEvaluator`].
///
/// Two function values are equal when their source text is equal.
///
/// [`FunctionEvaluator`]: super::FunctionEvaluator
#[derive(Clone)]
pub struct FunctionValue {
    source: Rc<str>,
    call: Rc<dyn Fn(&[Value]) -> Value>,
}

impl FunctionValue {
    /// Create a function value from its source text and an implementation.
    pub fn new(source: impl Into<Rc<str>>, call: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            source: source.into(),
            call: Rc::new(call),
        }
    }

    /// Source text, used verbatim as the serialized form
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Invoke the function
    pub fn call(&self, args: &[Value]) -> Value {
        (self.call)(args)
    }
}

impl PartialEq for FunctionValue {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("source", &self.source)
            .finish()
    }
}

/// A typed option value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Number (validated finite by the number constraint)
    Number(f64),
    /// Sequential container
    Array(Vec<serde_json::Value>),
    /// Keyed, non-array container
    Record(Map<String, serde_json::Value>),
    /// Callable
    Function(FunctionValue),
    /// Text
    String(String),
}

impl Value {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
            Value::String(_) => "string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts parsed JSON into a typed value.
    ///
    /// Numbers become `f64`; JSON strings become text.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items),
            serde_json::Value::Object(map) => Value::Record(map),
        }
    }

    /// Converts a typed value into JSON.
    ///
    /// Functions are represented by their source text and non-finite numbers
    /// by `null`, since JSON has no encoding for either.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Array(items) => serde_json::Value::Array(items.clone()),
            Value::Record(map) => serde_json::Value::Object(map.clone()),
            Value::Function(f) => serde_json::Value::String(f.source().to_string()),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Array(_) | Value::Record(_) => write!(f, "{}", self.to_json()),
            Value::Function(func) => write!(f, "{}", func.source()),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}
