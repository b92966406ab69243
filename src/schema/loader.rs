//! Schema loader for JSON schema files
//!
//! A schema file is a JSON object mapping option names to definitions:
//!
//! ```json
//! {
//!   "label": "String",
//!   "count": ["Number", "null"],
//!   "mode": { "type": "String", "required": true },
//!   "size": { "type": { "enum": ["small", "large"] }, "default": "small" },
//!   "ratio": { "float": { "min": 0, "max": 1 } }
//! }
//! ```
//!
//! Options are returned in key order. A directory of `*.json` files is
//! loaded into a registry keyed by file stem.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::{SchemaError, SchemaResult};
use super::types::{OptionDefinition, SchemaDefinition};
use crate::observability::{log_event_with_fields, Event};
use crate::types::{presets, TypeConstraint, TypeConstraintRegistry, Value};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawType {
    Name(String),
    Preset(RawPreset),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
enum RawPreset {
    Enum(Vec<String>),
    Integer(#[serde(default)] RawBounds),
    Float(#[serde(default)] RawBounds),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBounds {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTypes {
    One(RawType),
    Many(Vec<RawType>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    #[serde(rename = "type")]
    types: RawTypes,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDefinition {
    Record(RawRecord),
    Types(RawTypes),
}

/// Loads schema definitions from JSON files.
pub struct SchemaLoader {
    /// Directory containing schema files
    schema_dir: PathBuf,
    /// Built-ins available to type names
    registry: TypeConstraintRegistry,
    /// Loaded definitions indexed by file stem
    definitions: BTreeMap<String, SchemaDefinition>,
}

impl SchemaLoader {
    /// Creates a loader for the given directory.
    pub fn new(schema_dir: &Path) -> Self {
        Self::with_registry(schema_dir, TypeConstraintRegistry::new())
    }

    /// Creates a loader that resolves type names through `registry`.
    pub fn with_registry(schema_dir: &Path, registry: TypeConstraintRegistry) -> Self {
        Self {
            schema_dir: schema_dir.to_path_buf(),
            registry,
            definitions: BTreeMap::new(),
        }
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every `*.json` file in the schema directory.
    ///
    /// Returns the number of schemas loaded.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        let dir = self.schema_dir.display().to_string();
        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed(&dir, format!("Failed to read schema directory: {}", e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed(&dir, format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();

            // Skip non-JSON files
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        for path in &paths {
            let definition = self.load_file(path)?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.definitions.insert(name, definition);
        }

        let count = paths.len().to_string();
        log_event_with_fields(
            Event::SchemasLoaded,
            &[("count", count.as_str()), ("dir", dir.as_str())],
        );

        Ok(paths.len())
    }

    /// Loads a single schema file.
    pub fn load_file(&self, path: &Path) -> SchemaResult<SchemaDefinition> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;
        self.parse_str(&path.display().to_string(), &content)
    }

    /// Parses schema JSON. `source` names the input in error messages.
    pub fn parse_str(&self, source: &str, content: &str) -> SchemaResult<SchemaDefinition> {
        let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed(source, format!("Invalid JSON: {}", e)))?;

        let mut definition = SchemaDefinition::new();
        for (name, raw) in document {
            let raw: RawDefinition = serde_json::from_value(raw).map_err(|e| {
                SchemaError::invalid_constraint(&name, format!("Unrecognized definition: {}", e))
            })?;
            let option = self.convert(&name, raw)?;
            definition.insert(name, option);
        }
        Ok(definition)
    }

    /// Returns a loaded definition by name.
    pub fn get(&self, name: &str) -> Option<&SchemaDefinition> {
        self.definitions.get(name)
    }

    /// Names of all loaded definitions, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    fn convert(&self, option: &str, raw: RawDefinition) -> SchemaResult<OptionDefinition> {
        match raw {
            RawDefinition::Types(types) => Ok(OptionDefinition::Types(self.convert_types(option, types)?)),
            RawDefinition::Record(record) => Ok(OptionDefinition::Record {
                types: self.convert_types(option, record.types)?,
                required: record.required,
                default: record.default.map(Value::from_json),
            }),
        }
    }

    fn convert_types(&self, option: &str, types: RawTypes) -> SchemaResult<Vec<TypeConstraint>> {
        match types {
            RawTypes::One(t) => Ok(vec![self.convert_type(option, t)?]),
            RawTypes::Many(list) => list
                .into_iter()
                .map(|t| self.convert_type(option, t))
                .collect(),
        }
    }

    fn convert_type(&self, option: &str, raw: RawType) -> SchemaResult<TypeConstraint> {
        match raw {
            RawType::Name(name) => self.registry.lookup(&name).ok_or_else(|| {
                if name.eq_ignore_ascii_case("function") {
                    SchemaError::function_type_disabled(option)
                } else {
                    SchemaError::invalid_constraint(option, format!("Unknown type '{}'", name))
                }
            }),
            RawType::Preset(RawPreset::Enum(values)) => Ok(presets::enumeration(values)),
            RawType::Preset(RawPreset::Integer(b)) => Ok(presets::integer(b.min, b.max)),
            RawType::Preset(RawPreset::Float(b)) => Ok(presets::float(b.min, b.max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use tempfile::TempDir;

    fn loader() -> SchemaLoader {
        SchemaLoader::new(Path::new("."))
    }

    #[test]
    fn test_parse_all_forms() {
        let def = loader()
            .parse_str(
                "inline",
                r#"{
                    "label": "String",
                    "count": ["Number", "null"],
                    "mode": { "type": "String", "required": true },
                    "size": { "type": { "enum": ["small", "large"] }, "default": "small" },
                    "ratio": { "float": { "min": 0, "max": 1 } }
                }"#,
            )
            .unwrap();

        assert_eq!(def.len(), 5);
        let options: BTreeMap<_, _> = def.iter().collect();
        assert_eq!(options["count"].types().len(), 2);
        assert!(options["mode"].is_required());
        assert_eq!(options["size"].default_value(), Some(&Value::from("small")));
        assert_eq!(options["ratio"].types()[0].name(), "Float");
    }

    #[test]
    fn test_unknown_type_name() {
        let err = loader().parse_str("inline", r#"{"a": "Date"}"#).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::InvalidConstraint);
        assert_eq!(err.option(), Some("a"));
    }

    #[test]
    fn test_function_without_evaluator() {
        let err = loader().parse_str("inline", r#"{"cb": "Function"}"#).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::FunctionTypeDisabled);
    }

    #[test]
    fn test_invalid_json() {
        let err = loader().parse_str("inline", "[1, 2").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::Malformed);
    }

    #[test]
    fn test_load_all_from_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("button.json"), r#"{"label": "String"}"#).unwrap();
        fs::write(tmp.path().join("slider.json"), r#"{"value": "Number"}"#).unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let mut loader = SchemaLoader::new(tmp.path());
        assert_eq!(loader.load_all().unwrap(), 2);
        let names: Vec<_> = loader.names().collect();
        assert_eq!(names, ["button", "slider"]);
        assert!(loader.get("slider").is_some());
    }
}
