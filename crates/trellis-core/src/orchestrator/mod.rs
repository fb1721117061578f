//! # Trellis Activation Orchestrator
//!
//! The state machine coordinating environments, workers, procedures and the
//! startup handshake for every configured plugin.
//!
//! ## Lifecycle
//!
//! Each plugin moves `Configured -> EnvironmentReady -> Uninitialized ->
//! Running` ([`PluginPhase`]). Deactivation brings it back to
//! `EnvironmentReady`.
//!
//! ## Operations
//!
//! - `init`, `add_plugin`, `setup`, `show_configured`, `refresh`, `shutdown`
//!   (`manager.rs` and `install.rs`)
//! - `install`, `update` (`install.rs`)
//! - `activate`, `deactivate`, `reboot` (`activation.rs`)
//!
//! Batch operations never fail because of a single plugin: per-plugin
//! failures are collected into the returned report. Only a name filter that
//! matches nothing ([`SelectionError`]) aborts an operation.
mod activation;
pub mod error;
mod install;
pub mod manager;
pub mod report;
pub mod state;
pub mod strategy;

pub use error::{ActivationError, SelectionError};
pub use manager::Orchestrator;
pub use report::{
    ActivationReport, DeactivationReport, InitReport, InstallOperation, InstallReport, PluginFailure, RebootReport,
    SetupReport,
};
pub use state::{ActiveInstance, OrchestratorState, PluginPhase};
pub use strategy::worker_command;

#[cfg(test)]
mod tests;
