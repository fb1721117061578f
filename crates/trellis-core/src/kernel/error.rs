//! # Trellis Core Kernel Errors
//!
//! Defines the aggregated error type of the orchestrator.
//!
//! Every subsystem owns a typed error enum ([`ConfigError`],
//! [`EnvironmentError`], [`ActivationError`], [`RegistrationError`],
//! [`SelectionError`], [`HostError`]). [`Error`] wraps them so top-level
//! operations can use `?` across subsystem boundaries while callers can still
//! match on the specific failure.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::environment::error::EnvironmentError;
use crate::host::error::HostError;
use crate::orchestrator::error::{ActivationError, SelectionError};
use crate::rpc::error::RegistrationError;

/// Custom error type for the Trellis orchestrator
#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed configuration or plugin descriptor
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Environment bootstrap, install or health check failure
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// Worker spawn, probe or activation strategy failure
    #[error("Activation error: {0}")]
    Activation(#[from] ActivationError),

    /// Malformed procedure descriptor or failed (un)registration
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// A name filter matched no plugin
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A host primitive failed
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Whether this error came from a name filter that matched nothing.
    pub fn is_selection(&self) -> bool {
        matches!(self, Error::Selection(_))
    }
}
