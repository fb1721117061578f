use std::fmt::Debug;
use std::sync::Arc;

use crate::host::{ChannelId, Host, HostError, WorkerCommand};
use crate::orchestrator::error::ActivationError;

/// Spawns and stops plugin workers through the host's job control.
///
/// Holds no state of its own: which worker belongs to which plugin is tracked
/// by the orchestrator.
#[derive(Clone)]
pub struct HostSupervisor {
    host: Arc<dyn Host>,
}

impl HostSupervisor {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Spawn the worker for `plugin`. Failures are not retried.
    pub async fn start(&self, plugin: &str, command: &WorkerCommand) -> Result<(ChannelId, u32), ActivationError> {
        log::debug!("Starting worker for '{}': {}", plugin, command);
        match self.host.spawn(command).await {
            Ok((channel, pid)) => {
                log::info!("Started worker for '{}' on channel {} (pid {})", plugin, channel, pid);
                Ok((channel, pid))
            }
            Err(source) => Err(ActivationError::Spawn {
                plugin: plugin.to_string(),
                source,
            }),
        }
    }

    /// Kill the worker attached to `channel`.
    pub async fn stop(&self, channel: ChannelId) -> Result<(), HostError> {
        log::debug!("Stopping worker on channel {}", channel);
        self.host.kill(channel).await
    }
}

impl Debug for HostSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSupervisor").finish_non_exhaustive()
    }
}
