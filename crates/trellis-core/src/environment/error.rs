use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while creating, installing into or checking a plugin environment
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Failed to {operation} {path} for '{plugin}': {source}")]
    Io {
        plugin: String,
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not run `{program}` for '{plugin}': {source}")]
    Spawn {
        plugin: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` failed for '{plugin}' (exit code {code:?}): {stderr}")]
    Failed {
        plugin: String,
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{program}` for '{plugin}' timed out after {timeout:?}")]
    TimedOut {
        plugin: String,
        program: String,
        timeout: Duration,
    },

    #[error("Interpreter `{interpreter}` for '{plugin}' not found")]
    InterpreterNotFound { plugin: String, interpreter: String },

    #[error("Environment of '{plugin}' has no interpreter")]
    NoInterpreter { plugin: String },

    #[error("Refusing to use {path} for '{plugin}': not directly under the environment root")]
    OutsideRoot { plugin: String, path: PathBuf },
}

impl EnvironmentError {
    /// Name of the plugin whose environment failed
    pub fn plugin(&self) -> &str {
        match self {
            EnvironmentError::Io { plugin, .. }
            | EnvironmentError::Spawn { plugin, .. }
            | EnvironmentError::Failed { plugin, .. }
            | EnvironmentError::TimedOut { plugin, .. }
            | EnvironmentError::InterpreterNotFound { plugin, .. }
            | EnvironmentError::NoInterpreter { plugin }
            | EnvironmentError::OutsideRoot { plugin, .. } => plugin,
        }
    }
}
