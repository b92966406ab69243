//! Schema type definitions
//!
//! [`SchemaDefinition`] is what callers write; [`Schema`] is what the
//! validator produces from it. Option order is preserved throughout.

use std::collections::HashMap;

use crate::config::ApiConfig;
use crate::host::naming;
use crate::types::{ConstraintResolver, TypeConstraint, Value};

/// Definition of a single option
#[derive(Debug, Clone)]
pub enum OptionDefinition {
    /// Bare constraint or list of constraints
    Types(Vec<TypeConstraint>),
    /// Constraint list with `required` / `default`
    Record {
        types: Vec<TypeConstraint>,
        required: bool,
        default: Option<Value>,
    },
}

impl OptionDefinition {
    /// Single constraint
    pub fn of(constraint: TypeConstraint) -> Self {
        OptionDefinition::Types(vec![constraint])
    }

    /// Union of constraints
    pub fn union(constraints: impl IntoIterator<Item = TypeConstraint>) -> Self {
        OptionDefinition::Types(constraints.into_iter().collect())
    }

    /// Mark the option as required
    pub fn required(self) -> Self {
        match self {
            OptionDefinition::Types(types) => OptionDefinition::Record {
                types,
                required: true,
                default: None,
            },
            OptionDefinition::Record { types, default, .. } => OptionDefinition::Record {
                types,
                required: true,
                default,
            },
        }
    }

    /// Give the option a default value
    pub fn with_default(self, value: impl Into<Value>) -> Self {
        let default = Some(value.into());
        match self {
            OptionDefinition::Types(types) => OptionDefinition::Record {
                types,
                required: false,
                default,
            },
            OptionDefinition::Record { types, required, .. } => OptionDefinition::Record {
                types,
                required,
                default,
            },
        }
    }

    pub fn types(&self) -> &[TypeConstraint] {
        match self {
            OptionDefinition::Types(types) => types,
            OptionDefinition::Record { types, .. } => types,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, OptionDefinition::Record { required: true, .. })
    }

    pub fn default_value(&self) -> Option<&Value> {
        match self {
            OptionDefinition::Types(_) => None,
            OptionDefinition::Record { default, .. } => default.as_ref(),
        }
    }
}

impl From<TypeConstraint> for OptionDefinition {
    fn from(constraint: TypeConstraint) -> Self {
        OptionDefinition::of(constraint)
    }
}

/// Ordered mapping of option names to definitions, prior to validation
#[derive(Debug, Clone, Default)]
pub struct SchemaDefinition {
    options: Vec<(String, OptionDefinition)>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, replacing an earlier definition with the same name in place
    pub fn option(mut self, name: impl Into<String>, definition: impl Into<OptionDefinition>) -> Self {
        self.insert(name, definition);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: impl Into<OptionDefinition>) {
        let name = name.into();
        let definition = definition.into();
        match self.options.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = definition,
            None => self.options.push((name, definition)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionDefinition)> {
        self.options.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// A validated, normalized option
#[derive(Debug, Clone)]
pub struct OptionSpec {
    name: String,
    attribute: String,
    constraints: Vec<TypeConstraint>,
    resolver: ConstraintResolver,
    required: bool,
    default: Option<Value>,
}

impl OptionSpec {
    pub(crate) fn new(
        name: &str,
        attribute_prefix: &str,
        constraints: Vec<TypeConstraint>,
        required: bool,
        default: Option<Value>,
    ) -> Self {
        Self {
            name: name.to_string(),
            attribute: naming::option_to_attribute(attribute_prefix, name),
            resolver: ConstraintResolver::new(&constraints),
            constraints,
            required,
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute the option is stored under
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Constraints in declaration order, including an implicit null
    pub fn constraints(&self) -> &[TypeConstraint] {
        &self.constraints
    }

    pub fn resolver(&self) -> &ConstraintResolver {
        &self.resolver
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.resolver.accepts_null()
    }
}

/// A validated schema
#[derive(Debug, Clone)]
pub struct Schema {
    options: Vec<OptionSpec>,
    index: HashMap<String, usize>,
    config: ApiConfig,
}

impl Schema {
    pub(crate) fn new(options: Vec<OptionSpec>, config: ApiConfig) -> Self {
        let index = options
            .iter()
            .enumerate()
            .map(|(i, o)| (o.name.clone(), i))
            .collect();
        Self {
            options,
            index,
            config,
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.index.get(name).map(|&i| &self.options[i])
    }

    /// Option stored under the given attribute name
    pub fn option_for_attribute(&self, attribute: &str) -> Option<&OptionSpec> {
        let name = naming::attribute_to_option(&self.config.attribute_prefix, attribute)?;
        self.get(&name).filter(|o| o.attribute == attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(OptionSpec::name)
    }

    /// Attribute names to watch on bound elements
    pub fn attribute_names(&self) -> Vec<String> {
        self.options.iter().map(|o| o.attribute.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub(crate) fn into_parts(self) -> (Vec<OptionSpec>, ApiConfig) {
        (self.options, self.config)
    }
}
