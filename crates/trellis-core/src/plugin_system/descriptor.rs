use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConfigError;
use crate::plugin_system::spec::{PluginOptions, PluginSpec, is_plain_name, parse_spec};

/// One plugin entry of the configuration.
///
/// ```json
/// { "name": "title", "spec": "title==0.1.1", "debug": true }
/// ```
///
/// `spec` is anything the installer understands, optionally behind a kind
/// prefix (`dir:/path/to/project`). If `name` is omitted, `spec` is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub spec: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default, alias = "pythonpath", alias = "extraSearchPaths")]
    pub search_paths: Vec<String>,
    #[serde(default, alias = "interpreterOverride")]
    pub interpreter: Option<String>,
    #[serde(default, alias = "extensions", alias = "extraInstallArgs")]
    pub extra_install_args: Vec<String>,
    #[serde(default)]
    pub track: Option<bool>,
}

impl PluginDescriptor {
    /// Validate a raw configuration entry.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let object = value.as_object().ok_or_else(|| ConfigError::NotAnObject {
            descriptor: value.to_string(),
        })?;
        let spec = object
            .get("spec")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::MissingSpec {
                descriptor: value.to_string(),
            })?;
        let descriptor: Self = serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidDescriptor {
            plugin: object
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(spec)
                .to_string(),
            reason: e.to_string(),
        })?;
        check_plugin_name(descriptor.name())?;
        Ok(descriptor)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.spec)
    }

    pub fn options(&self) -> PluginOptions {
        PluginOptions {
            debug: self.debug,
            search_paths: self.search_paths.clone(),
            interpreter: self.interpreter.clone(),
            extra_install_args: self.extra_install_args.clone(),
            track: self.track.unwrap_or(true),
        }
    }

    pub fn into_spec(self) -> PluginSpec {
        let options = self.options();
        parse_spec(self.name(), &self.spec).with_options(options)
    }
}

/// Parse a raw descriptor straight into a spec.
pub fn spec_from_config(value: &Value) -> Result<PluginSpec, ConfigError> {
    PluginDescriptor::from_value(value).map(PluginDescriptor::into_spec)
}

/// Reject names that cannot serve as an environment directory name.
///
/// The name defaults to the spec, so a path-like spec needs an explicit name.
pub fn check_plugin_name(name: &str) -> Result<(), ConfigError> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDescriptor {
            plugin: name.to_string(),
            reason: "the plugin name must be a single path component; set `name` explicitly".to_string(),
        })
    }
}
