use thiserror::Error;

use crate::host::HostError;

/// Failures while discovering, defining or removing a worker's procedures
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Malformed procedure descriptor from '{plugin}': {reason}")]
    Malformed { plugin: String, reason: String },

    #[error("Could not query the procedures of '{plugin}': {source}")]
    Discovery {
        plugin: String,
        #[source]
        source: HostError,
    },

    #[error("Could not {action} `{procedure}` of '{plugin}': {source}")]
    Command {
        plugin: String,
        procedure: String,
        action: &'static str,
        #[source]
        source: HostError,
    },
}
