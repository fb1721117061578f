use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::Timeouts;
use crate::host::{Host, HostError, HostSupervisor};
use crate::kernel::constants;
use crate::orchestrator::error::ActivationError;
use crate::orchestrator::state::ActiveInstance;
use crate::rpc::error::RegistrationError;
use crate::rpc::procedure::{RegisteredProcedure, RpcProcedure, decode_procedures};
use crate::stage_manager::{BarrierParticipant, BarrierReport, run_staged_barrier};

/// Procedures registered for a worker, plus the descriptors that could not be
#[derive(Debug, Default)]
pub struct ProcedureQuery {
    pub registered: Vec<RegisteredProcedure>,
    pub errors: Vec<RegistrationError>,
}

/// What happened while tearing a worker down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Un-registration commands that ran
    pub removed: Vec<String>,
    /// Steps that failed; teardown carries on past them
    pub errors: Vec<String>,
}

/// Talks to workers through the host: readiness, startup stages, procedure
/// registration and teardown.
#[derive(Clone)]
pub struct RpcBridge {
    host: Arc<dyn Host>,
    supervisor: HostSupervisor,
    rpc_timeout: Duration,
    probe_interval: Duration,
}

impl RpcBridge {
    pub fn new(host: Arc<dyn Host>, timeouts: &Timeouts) -> Self {
        Self {
            supervisor: HostSupervisor::new(Arc::clone(&host)),
            host,
            rpc_timeout: timeouts.rpc(),
            probe_interval: Duration::from_millis(constants::PROBE_INTERVAL_MILLIS),
        }
    }

    pub fn supervisor(&self) -> &HostSupervisor {
        &self.supervisor
    }

    /// Poll `<Prefix>Poll` until the worker answers ready.
    pub async fn await_ready(&self, instance: &ActiveInstance, timeout: Duration) -> Result<(), ActivationError> {
        let function = format!("{}Poll", instance.prefix());
        let probe = async {
            loop {
                match self.host.call(&function, Vec::new(), self.rpc_timeout).await {
                    Ok(value) if is_ready(&value) => return Ok(()),
                    Ok(value) => log::trace!("'{}' not ready yet: {}", instance.name, value),
                    Err(HostError::Unsupported { operation }) => {
                        return Err(ActivationError::Unsupported {
                            plugin: instance.name.clone(),
                            reason: format!("the host cannot `{}`", operation),
                        });
                    }
                    Err(e) => log::trace!("Probing '{}' failed: {}", instance.name, e),
                }
                tokio::time::sleep(self.probe_interval).await;
            }
        };

        match tokio::time::timeout(timeout, probe).await {
            Ok(result) => result,
            Err(_) => Err(ActivationError::ProbeTimeout {
                plugin: instance.name.clone(),
                timeout,
            }),
        }
    }

    /// Run the startup stages for a freshly activated batch.
    pub async fn run_staged_barrier(&self, names: &[String]) -> BarrierReport {
        let participants: Vec<_> = names.iter().map(|n| BarrierParticipant::new(n)).collect();
        run_staged_barrier(self.host.as_ref(), &participants, constants::STARTUP_STAGES).await
    }

    /// Ask the worker for its procedures and define each in the host.
    pub async fn query_procedures(&self, instance: &ActiveInstance) -> ProcedureQuery {
        let mut query = ProcedureQuery::default();
        let function = format!("{}RpcHandlers", instance.prefix());
        let answer = match self.host.call_once_defined(&function, self.rpc_timeout).await {
            Ok(answer) => answer,
            Err(source) => {
                query.errors.push(RegistrationError::Discovery {
                    plugin: instance.name.clone(),
                    source,
                });
                return query;
            }
        };

        let procedures = match decode_procedures(&instance.name, &answer) {
            Ok((procedures, malformed)) => {
                query.errors.extend(malformed);
                procedures
            }
            Err(e) => {
                query.errors.push(e);
                return query;
            }
        };

        for procedure in procedures {
            let command = procedure.define_command(instance.channel);
            match self.host.run_command(&command.name, &command.args).await {
                Ok(()) => query.registered.push(RegisteredProcedure {
                    procedure,
                    channel: instance.channel,
                }),
                Err(source) => query.errors.push(RegistrationError::Command {
                    plugin: instance.name.clone(),
                    procedure: procedure.name.clone(),
                    action: "define",
                    source,
                }),
            }
        }
        for error in &query.errors {
            log::warn!("{}", error);
        }
        log::debug!(
            "Registered {} procedures for '{}' on channel {}",
            query.registered.len(),
            instance.name,
            instance.channel
        );
        query
    }

    /// Quit and stop the worker, then remove its procedures from the host.
    ///
    /// The procedure list is asked from the worker one last time; `known` is
    /// used when it does not answer.
    pub async fn deactivate(&self, instance: &ActiveInstance, known: &[RegisteredProcedure]) -> Teardown {
        let prefix = instance.prefix();
        let mut teardown = Teardown::default();

        let procedures = match self.current_procedures(instance).await {
            Some(procedures) => procedures,
            None => known.iter().map(|r| r.procedure.clone()).collect(),
        };

        let quit = format!("{}Quit", prefix);
        if let Err(e) = self.host.run_command(&quit, &[]).await {
            teardown.errors.push(format!("{}: {}", quit, e));
        }
        if let Err(e) = self.supervisor.stop(instance.channel).await {
            teardown.errors.push(format!("stop channel {}: {}", instance.channel, e));
        }

        for procedure in procedures {
            let command = procedure.undefine_command(&prefix);
            match self.host.run_command(&command.name, &command.args).await {
                Ok(()) => teardown.removed.push(command.to_string()),
                Err(source) => teardown.errors.push(
                    RegistrationError::Command {
                        plugin: instance.name.clone(),
                        procedure: procedure.name.clone(),
                        action: "remove",
                        source,
                    }
                    .to_string(),
                ),
            }
        }

        for error in &teardown.errors {
            log::warn!("Deactivating '{}': {}", instance.name, error);
        }
        log::debug!("Deactivated '{}' (channel {})", instance.name, instance.channel);
        teardown
    }

    async fn current_procedures(&self, instance: &ActiveInstance) -> Option<Vec<RpcProcedure>> {
        let function = format!("{}RpcHandlers", instance.prefix());
        match self.host.call(&function, Vec::new(), self.rpc_timeout).await {
            Ok(answer) => match decode_procedures(&instance.name, &answer) {
                Ok((procedures, _)) => Some(procedures),
                Err(e) => {
                    log::debug!("{}", e);
                    None
                }
            },
            Err(e) => {
                log::debug!("'{}' did not report its procedures: {}", instance.name, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for RpcBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcBridge")
            .field("rpc_timeout", &self.rpc_timeout)
            .field("probe_interval", &self.probe_interval)
            .finish_non_exhaustive()
    }
}

fn is_ready(value: &Value) -> bool {
    match value {
        Value::Bool(ready) => *ready,
        Value::String(s) => s.eq_ignore_ascii_case("ok") || s == "1" || s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}
