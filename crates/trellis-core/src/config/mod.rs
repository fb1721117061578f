//! # Trellis Configuration
//!
//! The [`Config`] struct is built once at startup, either from a file
//! ([`Config::load`]) or from the host's variable store
//! ([`Config::from_host`]), and shared by reference with every component.
//!
//! Plugin entries are kept as raw JSON values so that a single malformed
//! descriptor can be rejected on its own when the orchestrator reads them,
//! instead of failing the whole configuration.
pub mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::host::Host;
use crate::kernel::constants;

pub use error::ConfigError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Subprocess and RPC timeouts, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub bootstrap: u64,
    pub install: u64,
    #[serde(alias = "compiledInstall")]
    pub compiled_install: u64,
    #[serde(alias = "healthCheck")]
    pub health_check: u64,
    pub probe: u64,
    pub rpc: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            bootstrap: constants::BOOTSTRAP_TIMEOUT_SECS,
            install: constants::INSTALL_TIMEOUT_SECS,
            compiled_install: constants::COMPILED_INSTALL_TIMEOUT_SECS,
            health_check: constants::HEALTH_CHECK_TIMEOUT_SECS,
            probe: constants::PROBE_TIMEOUT_SECS,
            rpc: constants::RPC_TIMEOUT_SECS,
        }
    }
}

impl Timeouts {
    pub fn bootstrap(&self) -> Duration {
        Duration::from_secs(self.bootstrap)
    }

    pub fn install(&self) -> Duration {
        Duration::from_secs(self.install)
    }

    pub fn compiled_install(&self) -> Duration {
        Duration::from_secs(self.compiled_install)
    }

    pub fn health_check(&self) -> Duration {
        Duration::from_secs(self.health_check)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe)
    }

    pub fn rpc(&self) -> Duration {
        Duration::from_secs(self.rpc)
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw plugin descriptors, parsed one by one during `init`
    #[serde(alias = "rplugins")]
    pub plugins: Vec<Value>,
    /// Install and activate plugins as soon as they are configured
    pub autostart: bool,
    /// Deactivate and reactivate plugins after they were updated
    pub autoreboot: bool,
    /// Let the orchestrator update its own package alongside the plugins
    #[serde(alias = "handleSelf")]
    pub handle_self: bool,
    /// Keep the outer `PYTHONPATH` for every worker, not only debug ones
    #[serde(alias = "passthroughSearchPathDebug")]
    pub passthrough_search_path_debug: bool,
    /// Base directory of the per-plugin environments
    #[serde(alias = "environmentRoot")]
    pub environment_root: Option<PathBuf>,
    /// Global interpreter override
    pub interpreter: Option<String>,
    /// Python module that runs the worker host inside an environment
    #[serde(alias = "workerModule")]
    pub worker_module: String,
    /// Bound on concurrently running bootstrap and health-check tasks
    #[serde(alias = "maxParallel")]
    pub max_parallel: Option<usize>,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            autostart: true,
            autoreboot: true,
            handle_self: true,
            passthrough_search_path_debug: false,
            environment_root: None,
            interpreter: None,
            worker_module: constants::DEFAULT_WORKER_MODULE.to_string(),
            max_parallel: Some(constants::DEFAULT_MAX_PARALLEL),
            timeouts: Timeouts::default(),
        }
    }
}

/// Setting keys read from the host variable store, without prefix
const HOST_SETTING_KEYS: &[&str] = &[
    "plugins",
    "autostart",
    "autoreboot",
    "handle_self",
    "passthrough_search_path_debug",
    "environment_root",
    "interpreter",
    "worker_module",
    "max_parallel",
    "timeouts",
];

impl Config {
    /// Load a configuration file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&data, format).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            format: format.extension().to_string(),
            message,
        })?;
        log::debug!(
            "Loaded configuration from {} with {} plugin entries",
            path.display(),
            config.plugins.len()
        );
        Ok(config)
    }

    /// Parse configuration text in the given format.
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| e.to_string()),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| e.to_string()),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| e.to_string()),
        }
    }

    /// Read the settings stored in the host's variables under `<prefix>_<key>`.
    ///
    /// Absent variables keep their defaults. A variable of the wrong type
    /// aborts with [`ConfigError::InvalidSetting`].
    pub async fn from_host(host: &dyn Host, prefix: &str) -> Result<Self, ConfigError> {
        let mut values = Map::new();
        for key in HOST_SETTING_KEYS {
            let name = format!("{}_{}", prefix, key);
            match host.var(&name).await {
                Ok(Some(value)) => {
                    values.insert((*key).to_string(), value);
                }
                Ok(None) => {}
                Err(e) => log::warn!("Could not read host variable '{}': {}", name, e),
            }
        }
        serde_json::from_value(Value::Object(values)).map_err(|e| ConfigError::InvalidSetting {
            prefix: prefix.to_string(),
            reason: e.to_string(),
        })
    }

    /// The directory holding one environment per plugin.
    ///
    /// Falls back to `$XDG_CACHE_HOME/trellis/venvs`, then `~/.cache/trellis/venvs`.
    pub fn environment_root(&self) -> PathBuf {
        if let Some(root) = &self.environment_root {
            return root.clone();
        }
        let cache = std::env::var_os("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
            .unwrap_or_else(std::env::temp_dir);
        cache.join(constants::ENVIRONMENT_DIR)
    }

    /// Create the environment root if needed and return it.
    pub fn ensure_environment_root(&self) -> Result<PathBuf, ConfigError> {
        let root = self.environment_root();
        std::fs::create_dir_all(&root).map_err(|source| ConfigError::EnvironmentRoot {
            path: root.clone(),
            source,
        })?;
        Ok(root)
    }
}
