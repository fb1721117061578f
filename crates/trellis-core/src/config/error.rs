//! # Trellis Configuration Errors
//!
//! [`ConfigError`] covers unreadable or unparseable configuration files,
//! invalid host settings and malformed plugin descriptors.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("plugin descriptor {descriptor} missing attribute `spec`")]
    MissingSpec { descriptor: String },

    #[error("plugin descriptor must be an object, got {descriptor}")]
    NotAnObject { descriptor: String },

    #[error("invalid plugin descriptor for '{plugin}': {reason}")]
    InvalidDescriptor { plugin: String, reason: String },

    #[error("failed to read configuration file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} configuration '{}': {message}", path.display())]
    Parse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("unknown or unsupported config format for path: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid setting under prefix `{prefix}`: {reason}")]
    InvalidSetting { prefix: String, reason: String },

    #[error("could not create environment directory '{}': {source}", path.display())]
    EnvironmentRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
