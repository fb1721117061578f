//! # Trellis Core
//!
//! Orchestrates remote plugins hosted by an external editor: environment
//! provisioning, worker supervision, RPC registration and the staged startup
//! handshake. The [`Orchestrator`] is the entry point; everything else is a
//! collaborator it composes.
pub mod config;
pub mod environment;
pub mod gather;
pub mod host;
pub mod kernel;
pub mod orchestrator;
pub mod plugin_system;
pub mod rpc;
pub mod stage_manager;

// Re-export key public types for the binary and embedders
pub use config::Config;
pub use environment::{DefaultEnvironmentManager, Environment, EnvironmentManager};
pub use host::{ChannelId, Host, HostSupervisor, LocalHost, WorkerCommand};
pub use kernel::error::{Error, Result};
pub use orchestrator::{Orchestrator, OrchestratorState};
pub use plugin_system::{InstallMethod, PluginOptions, PluginSpec, parse_spec};

// Crate-level scenario tests
#[cfg(test)]
mod tests;
