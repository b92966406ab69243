//! Schema definition entry point

use std::fmt;
use std::rc::Rc;

use crate::collection::{AttachResult, Collection, Target};
use crate::config::ApiConfig;
use crate::host::HostContext;
use crate::schema::{Schema, SchemaDefinition, SchemaError, SchemaResult, SchemaValidator};

/// A validated schema, ready to be attached to host elements.
///
/// ```ignore
/// let api = HtmlApi::define(SchemaDefinition::new().option("label", TypeConstraint::String))?;
/// let collection = api.attach(&document.context(), "button")?;
/// collection.on("change", |_, event| println!("{:?}", event));
/// ```
#[derive(Clone)]
pub struct HtmlApi {
    schema: Rc<Schema>,
}

impl HtmlApi {
    /// Validate `definition` under the default configuration
    pub fn define(definition: SchemaDefinition) -> SchemaResult<Self> {
        Self::define_with(definition, ApiConfig::default())
    }

    /// Validate `definition` under `config`
    pub fn define_with(definition: SchemaDefinition, config: ApiConfig) -> SchemaResult<Self> {
        config
            .validate()
            .map_err(|e| SchemaError::malformed("config", e.to_string()))?;
        let schema = SchemaValidator::new(&config).validate(&definition)?;
        Ok(Self {
            schema: Rc::new(schema),
        })
    }

    /// A new API whose schema is this one amended by `additions`.
    ///
    /// Collections already attached keep the schema they were attached with.
    pub fn extend(&self, additions: SchemaDefinition) -> SchemaResult<Self> {
        let schema = SchemaValidator::new(self.schema.config()).merge(&self.schema, &additions)?;
        Ok(Self {
            schema: Rc::new(schema),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Bind the schema to every element of `target`
    pub fn attach(&self, ctx: &HostContext, target: impl Into<Target>) -> AttachResult<Collection> {
        Collection::attach(Rc::clone(&self.schema), ctx, target.into())
    }
}

impl fmt::Debug for HtmlApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlApi")
            .field("options", &self.schema.names().collect::<Vec<_>>())
            .finish()
    }
}
