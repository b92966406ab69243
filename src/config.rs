//! API Configuration
//!
//! Controls attribute naming, nullability policy and the function type gate.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid attribute prefix '{0}': must be lowercase ASCII ending in '-'")]
    InvalidPrefix(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// How options that are neither required, defaulted nor nullable are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullabilityPolicy {
    /// Add the null type implicitly
    #[default]
    Widen,
    /// Reject the definition (legacy behavior)
    Strict,
}

/// Configuration shared by every schema defined through [`HtmlApi`]
///
/// [`HtmlApi`]: crate::HtmlApi
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Prefix joining option names to attribute names (default: "data-")
    #[serde(default = "default_attribute_prefix")]
    pub attribute_prefix: String,

    /// Nullability policy (default: widen)
    #[serde(default)]
    pub nullability: NullabilityPolicy,

    /// Whether `Function` constraints are accepted (default: false)
    #[serde(default)]
    pub allow_function_type: bool,
}

fn default_attribute_prefix() -> String {
    "data-".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            attribute_prefix: default_attribute_prefix(),
            nullability: NullabilityPolicy::default(),
            allow_function_type: false,
        }
    }
}

impl ApiConfig {
    /// Config with the legacy strict nullability policy
    pub fn strict() -> Self {
        Self {
            nullability: NullabilityPolicy::Strict,
            ..Self::default()
        }
    }

    /// Config that accepts the function type
    pub fn with_function_type(mut self) -> Self {
        self.allow_function_type = true;
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: ApiConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        let path = path.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let prefix = &self.attribute_prefix;
        let well_formed = prefix.ends_with('-')
            && prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !well_formed || prefix.len() < 2 {
            return Err(ConfigError::InvalidPrefix(prefix.clone()));
        }
        Ok(())
    }
}
