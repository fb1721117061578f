use std::time::Duration;

use thiserror::Error;

use crate::host::HostError;

/// Failures bringing one plugin worker up
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("Could not start the worker of '{plugin}': {source}")]
    Spawn {
        plugin: String,
        #[source]
        source: HostError,
    },

    #[error("'{plugin}' cannot be activated: {reason}")]
    Unsupported { plugin: String, reason: String },

    #[error("The worker of '{plugin}' did not become ready within {timeout:?}")]
    ProbeTimeout { plugin: String, timeout: Duration },

    #[error("'{plugin}' has no usable environment")]
    NotReady { plugin: String },

    #[error("The environment of '{plugin}' has no interpreter to run the worker")]
    MissingInterpreter { plugin: String },
}

/// A name filter that matched no eligible plugin
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no plugins match for {operation}: {}", names.join(", "))]
pub struct SelectionError {
    pub operation: &'static str,
    pub names: Vec<String>,
}

impl SelectionError {
    pub fn new(operation: &'static str, names: &[String]) -> Self {
        Self {
            operation,
            names: names.to_vec(),
        }
    }
}
