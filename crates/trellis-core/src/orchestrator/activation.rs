use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::orchestrator::error::{ActivationError, SelectionError};
use crate::orchestrator::manager::{Orchestrator, select};
use crate::orchestrator::report::{ActivationReport, DeactivationReport, PluginFailure, RebootReport};
use crate::orchestrator::state::ActiveInstance;
use crate::orchestrator::strategy::worker_command;

impl Orchestrator {
    /// Start the workers of ready plugins matching `names` (all when empty).
    ///
    /// Plugins that already run are reported and left alone. The new batch
    /// passes the startup stages together before procedures are registered.
    pub async fn activate(&mut self, names: &[String]) -> Result<ActivationReport> {
        let (matched, unmatched) = select(self.activatable_names(), names);
        if !names.is_empty() && matched.is_empty() {
            return Err(SelectionError::new("activation", names).into());
        }

        let mut report = ActivationReport {
            unmatched,
            ..ActivationReport::default()
        };
        let (already_active, targets): (Vec<String>, Vec<String>) =
            matched.into_iter().partition(|name| self.state.is_active(name));
        if !already_active.is_empty() {
            log::info!("Already active: {}", already_active.join(", "));
        }
        report.already_active = already_active;

        for name in targets {
            match self.start_worker(&name).await {
                Ok(instance) => {
                    self.state.insert_active(instance);
                    report.activated.push(name);
                }
                Err(e) => {
                    log::error!("{}", e);
                    report.failed.push(PluginFailure::new(&name, e));
                }
            }
        }
        if report.activated.is_empty() {
            return Ok(report);
        }

        let batch = self.state.uninitialized_names();
        report.stages = self.bridge.run_staged_barrier(&batch).await;
        self.state.initialization_complete();

        for name in &report.activated {
            let Some(instance) = self.state.active(name).cloned() else {
                continue;
            };
            let query = self.bridge.query_procedures(&instance).await;
            report
                .registration_errors
                .extend(query.errors.iter().map(|e| PluginFailure::new(name, e)));
            self.state.set_procedures(name, query.registered);
        }
        log::info!("Activated {}", report.activated.join(", "));
        Ok(report)
    }

    /// Stop the workers of active plugins matching `names` (all when empty).
    pub async fn deactivate(&mut self, names: &[String]) -> Result<DeactivationReport> {
        let (matched, unmatched) = select(self.state.active_names(), names);
        if !names.is_empty() && matched.is_empty() {
            return Err(SelectionError::new("deactivation", names).into());
        }

        let mut report = DeactivationReport {
            unmatched,
            ..DeactivationReport::default()
        };
        for name in matched {
            let Some((instance, known)) = self.state.remove_active(&name) else {
                continue;
            };
            let teardown = self.bridge.deactivate(&instance, &known).await;
            report
                .warnings
                .extend(teardown.errors.into_iter().map(|e| PluginFailure::new(&name, e)));
            report.deactivated.push(name);
        }
        Ok(report)
    }

    /// Deactivate, then activate again whatever was deactivated.
    pub async fn reboot(&mut self, names: &[String]) -> Result<RebootReport> {
        let deactivation = self.deactivate(names).await?;
        let restartable: Vec<String> = deactivation
            .deactivated
            .iter()
            .filter(|name| self.state.is_ready(name))
            .cloned()
            .collect();
        let activation = if restartable.is_empty() {
            ActivationReport::default()
        } else {
            self.activate(&restartable).await?
        };
        Ok(RebootReport {
            deactivation,
            activation,
        })
    }

    // Ready or running plugins; the orchestrator's own package never runs as a worker.
    // A running plugin whose environment failed a later health check stays selectable
    // so that it is reported as already active.
    fn activatable_names(&self) -> Vec<String> {
        self.state
            .all_specs()
            .map(|spec| spec.name())
            .filter(|name| self.state.is_ready(name) || self.state.is_active(name))
            .filter(|name| !self.state.is_self(name))
            .map(str::to_string)
            .collect()
    }

    async fn start_worker(&self, name: &str) -> std::result::Result<ActiveInstance, ActivationError> {
        let not_ready = || ActivationError::NotReady {
            plugin: name.to_string(),
        };
        let spec = self.state.spec(name).ok_or_else(not_ready)?;
        let env = self.state.environment(name).ok_or_else(not_ready)?;

        let command = worker_command(spec, env, &self.config)?;
        let (channel, pid) = self.bridge.supervisor().start(name, &command).await?;
        let instance = ActiveInstance::new(name, channel, pid);

        if !spec.options().track {
            log::info!("Not waiting for untracked plugin '{}'", name);
        } else if let Err(e) = self.bridge.await_ready(&instance, self.config.timeouts.probe()).await {
            if let Err(stop) = self.bridge.supervisor().stop(channel).await {
                log::warn!("Could not stop the unresponsive worker of '{}': {}", name, stop);
            }
            return Err(e);
        }

        let runtime = format!("{}/{}/*", constants::RUNTIME_DIR, name);
        if let Err(e) = self.host.load_runtime(&runtime).await {
            log::warn!("Could not load runtime files of '{}': {}", name, e);
        }
        Ok(instance)
    }
}
