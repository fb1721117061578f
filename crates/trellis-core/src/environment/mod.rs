//! # Trellis Dependency Environments
//!
//! Every plugin gets an isolated directory under the environment root. Python
//! plugins get a virtual environment, compiled plugins a `bin` directory their
//! executable is installed into.
//!
//! ## Key Components
//!
//! - **[`EnvironmentManager`]**: the async seam the orchestrator drives
//!   (check, bootstrap, install, health check).
//! - **[`DefaultEnvironmentManager`]**: the implementation backed by the file
//!   system and the package installers.
//! - **[`process::Invocation`]**: subprocess runner with a hard timeout.
//! - **[`interpreter`]**: interpreter lookup that ignores the active venv.
pub mod error;
pub mod health;
pub mod install;
pub mod interpreter;
pub mod manager;
pub mod process;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::plugin_system::PluginSpec;

pub use error::EnvironmentError;
pub use manager::DefaultEnvironmentManager;

const BIN_DIR: &str = "bin";

/// On-disk layout of one plugin environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    name: String,
    root: PathBuf,
    interpreter: Option<PathBuf>,
    bin_dir: PathBuf,
}

impl Environment {
    /// A virtual environment whose interpreter lives in its own `bin`.
    pub fn python(name: &str, root: PathBuf) -> Self {
        let bin_dir = root.join(BIN_DIR);
        Self {
            name: name.to_string(),
            interpreter: Some(bin_dir.join("python")),
            bin_dir,
            root,
        }
    }

    /// A directory that borrows an interpreter from outside.
    pub fn site(name: &str, root: PathBuf, interpreter: Option<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            bin_dir: root.join(BIN_DIR),
            interpreter,
            root,
        }
    }

    /// A directory holding compiled executables, no interpreter.
    pub fn compiled(name: &str, root: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            bin_dir: root.join(BIN_DIR),
            interpreter: None,
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn interpreter(&self) -> Option<&Path> {
        self.interpreter.as_deref()
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Path of `program` inside the environment's `bin`
    pub fn executable(&self, program: &str) -> PathBuf {
        self.bin_dir.join(program)
    }

    /// Existing `lib/python*/site-packages` directories
    pub async fn site_packages(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for lib in ["lib", "lib64"] {
            let Ok(mut entries) = tokio::fs::read_dir(self.root.join(lib)).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let is_python = entry.file_name().to_str().is_some_and(|n| n.starts_with("python"));
                let candidate = entry.path().join("site-packages");
                if is_python && tokio::fs::metadata(&candidate).await.is_ok_and(|m| m.is_dir()) {
                    dirs.push(candidate);
                }
            }
        }
        dirs.sort();
        dirs
    }
}

/// Result of [`EnvironmentManager::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentStatus {
    Present(Environment),
    Absent,
}

/// Result of [`EnvironmentManager::install`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The installer ran and exited successfully; carries its stdout
    Installed { output: String },
    /// The variant has no installer
    NothingToInstall,
}

/// Creates and maintains plugin environments
#[async_trait]
pub trait EnvironmentManager: Send + Sync {
    /// Look for an existing environment of `spec`.
    async fn check(&self, spec: &PluginSpec) -> Result<EnvironmentStatus, EnvironmentError>;

    /// Create a fresh environment, removing any stale one first.
    async fn bootstrap(&self, spec: &PluginSpec) -> Result<Environment, EnvironmentError>;

    /// Install or upgrade the plugin inside `env`.
    async fn install(&self, spec: &PluginSpec, env: &Environment) -> Result<InstallOutcome, EnvironmentError>;

    /// Whether the plugin is usable from `env`.
    async fn health_check(&self, env: &Environment, spec: &PluginSpec) -> bool;
}

#[cfg(test)]
mod tests;
