//! # Trellis Host Errors
//!
//! [`HostError`] is returned by every primitive of the [`Host`](super::Host)
//! contract.
use std::time::Duration;

use thiserror::Error;

use super::ChannelId;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to spawn `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("no worker is attached to channel {0}")]
    UnknownChannel(ChannelId),

    #[error("call to `{function}` failed: {message}")]
    Call { function: String, message: String },

    #[error("call to `{function}` timed out after {timeout:?}")]
    Timeout { function: String, timeout: Duration },

    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("host does not support `{operation}`")]
    Unsupported { operation: &'static str },

    #[error("I/O error in host during '{operation}': {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}
