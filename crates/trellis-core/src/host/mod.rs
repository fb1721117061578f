//! # Trellis Host Contract
//!
//! The orchestrator never talks to the editor directly. Everything it needs
//! from the host (job control, RPC calls, commands, variables and runtime
//! loading) goes through the [`Host`] trait, so embedders plug in their own
//! transport and tests plug in recording doubles.
//!
//! - **[`supervisor`]**: [`HostSupervisor`], the thin start/stop layer used
//!   to spawn and kill plugin workers.
//! - **[`local`]**: [`LocalHost`], a standalone host with real job control and
//!   no editor attached, used by the command line tool.
pub mod error;
pub mod local;
pub mod supervisor;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

pub use error::HostError;
pub use local::LocalHost;
pub use supervisor::HostSupervisor;

/// Connection handle of a spawned worker
pub type ChannelId = u64;

/// Everything needed to spawn one plugin worker
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkerCommand {
    /// Program followed by its arguments
    pub argv: Vec<String>,
    /// Environment overrides applied on top of the host's environment
    pub env: BTreeMap<String, String>,
    /// Working directory, if the worker needs one
    pub cwd: Option<PathBuf>,
    /// Forward the worker's stderr at info level instead of debug
    pub forward_stderr: bool,
}

impl WorkerCommand {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

impl fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Primitives the editor exposes to the orchestrator
#[async_trait]
pub trait Host: Send + Sync {
    /// Start a worker process, returning its channel and OS pid.
    async fn spawn(&self, command: &WorkerCommand) -> Result<(ChannelId, u32), HostError>;

    /// Stop the worker attached to `channel`.
    async fn kill(&self, channel: ChannelId) -> Result<(), HostError>;

    /// Call a host function and wait for its value.
    async fn call(&self, function: &str, args: Vec<Value>, timeout: Duration) -> Result<Value, HostError>;

    /// Wait until `function` is defined, then call it once without arguments.
    async fn call_once_defined(&self, function: &str, timeout: Duration) -> Result<Value, HostError>;

    /// Run a host command.
    async fn run_command(&self, name: &str, args: &[String]) -> Result<(), HostError>;

    /// Whether a host command named `name` exists.
    async fn command_exists(&self, name: &str) -> Result<bool, HostError>;

    /// Read a host variable.
    async fn var(&self, name: &str) -> Result<Option<Value>, HostError>;

    /// Write a host variable.
    async fn set_var(&self, name: &str, value: Value) -> Result<(), HostError>;

    /// Load the runtime files matching `path`.
    async fn load_runtime(&self, path: &str) -> Result<(), HostError>;
}
