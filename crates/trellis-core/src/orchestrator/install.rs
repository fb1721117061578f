use std::convert::Infallible;
use std::sync::Arc;

use crate::environment::install::install_timeout;
use crate::environment::{Environment, EnvironmentError, EnvironmentStatus};
use crate::gather::{TaskError, bounded, gather};
use crate::kernel::error::Result;
use crate::orchestrator::error::SelectionError;
use crate::orchestrator::manager::{Orchestrator, select};
use crate::orchestrator::report::{InstallOperation, InstallReport, PluginFailure, SetupReport};
use crate::plugin_system::PluginSpec;

impl Orchestrator {
    /// Adopt healthy existing environments, install what is missing and,
    /// with `autostart`, activate every ready plugin in one batch.
    pub async fn setup(&mut self) -> Result<SetupReport> {
        let already_ready = self.derive_readiness().await;
        let candidates = self.not_ready_names();
        let mut install = self
            .install_or_update(InstallOperation::Install, candidates, &[], false)
            .await?;
        if self.config.autostart {
            let activation = self.activate(&[]).await?;
            if !activation.is_noop() || !activation.already_active.is_empty() {
                install.activation = Some(activation);
            }
        }
        Ok(SetupReport { already_ready, install })
    }

    /// Install configured plugins that are not ready yet.
    pub async fn install(&mut self, names: &[String]) -> Result<InstallReport> {
        let candidates = self.not_ready_names();
        let chain = self.config.autostart;
        self.install_or_update(InstallOperation::Install, candidates, names, chain)
            .await
    }

    /// Upgrade ready plugins, plus the orchestrator's own package when no
    /// filter is given.
    pub async fn update(&mut self, names: &[String]) -> Result<InstallReport> {
        let mut candidates = self.state.ready_names();
        if names.is_empty() {
            if let Some(own) = self.state.self_spec().map(|s| s.name().to_string()) {
                if !candidates.contains(&own) {
                    candidates.push(own);
                }
            }
        }
        self.install_or_update(InstallOperation::Update, candidates, names, false)
            .await
    }

    async fn install_or_update(
        &mut self,
        operation: InstallOperation,
        candidates: Vec<String>,
        names: &[String],
        chain_activation: bool,
    ) -> Result<InstallReport> {
        let (targets, unmatched) = select(candidates, names);
        if !names.is_empty() && targets.is_empty() {
            return Err(SelectionError::new(operation.noun(), names).into());
        }

        let mut report = InstallReport::new(operation);
        report.unmatched = unmatched;
        if targets.is_empty() {
            return Ok(report);
        }
        let specs: Vec<PluginSpec> = targets
            .iter()
            .filter_map(|name| self.state.spec(name).cloned())
            .collect();
        log::info!("Running {} for {}", operation.noun(), targets.join(", "));

        // Environments are created concurrently
        let prepared = self.prepare_environments(&specs).await;
        let mut to_install = Vec::new();
        for (spec, result) in specs.into_iter().zip(prepared) {
            match result {
                Ok(env) => to_install.push((spec, env)),
                Err(e) => report.failed.push(PluginFailure::new(spec.name(), e)),
            }
        }

        // Installers deadlock when run in parallel
        let installed = self.run_installers(to_install, &mut report).await;

        let environments = Arc::clone(&self.environments);
        let checks: Vec<_> = installed
            .iter()
            .map(|(spec, env)| {
                let environments = Arc::clone(&environments);
                async move { Ok::<bool, Infallible>(environments.health_check(env, spec).await) }
            })
            .collect();
        let health = gather(checks, &self.concurrent(self.config.timeouts.health_check())).await;

        for ((spec, env), result) in installed.into_iter().zip(health) {
            match result {
                Ok(true) => {
                    report.succeeded.push(spec.name().to_string());
                    self.state.mark_ready(env);
                }
                Ok(false) => {
                    self.state.unmark_ready(spec.name());
                    report.failed.push(PluginFailure::new(
                        spec.name(),
                        format!("health check failed after {}", operation.noun()),
                    ));
                }
                Err(e) => {
                    self.state.unmark_ready(spec.name());
                    report.failed.push(PluginFailure::new(spec.name(), e));
                }
            }
        }

        if report.is_success() {
            log::info!("{}", report.message());
        } else {
            log::error!("{}", report.message());
        }

        match operation {
            InstallOperation::Install if chain_activation => {
                let new: Vec<String> = report
                    .succeeded
                    .iter()
                    .filter(|name| !self.state.is_self(name))
                    .cloned()
                    .collect();
                if !new.is_empty() {
                    report.activation = Some(self.activate(&new).await?);
                }
            }
            InstallOperation::Update if self.config.autoreboot => {
                let rebootable: Vec<String> = report
                    .succeeded
                    .iter()
                    .filter(|name| self.state.is_active(name) && !self.state.is_self(name))
                    .cloned()
                    .collect();
                for name in rebootable {
                    log::info!("Rebooting updated plugin '{}'", name);
                    report.reboots.push(self.reboot(&[name]).await?);
                }
            }
            InstallOperation::Install | InstallOperation::Update => {}
        }
        Ok(report)
    }

    async fn prepare_environments(
        &self,
        specs: &[PluginSpec],
    ) -> Vec<std::result::Result<Environment, TaskError<EnvironmentError>>> {
        let environments = Arc::clone(&self.environments);
        let tasks: Vec<_> = specs
            .iter()
            .map(|spec| {
                let environments = Arc::clone(&environments);
                async move {
                    match environments.check(spec).await? {
                        EnvironmentStatus::Present(env) => Ok(env),
                        EnvironmentStatus::Absent => environments.bootstrap(spec).await,
                    }
                }
            })
            .collect();
        gather(tasks, &self.concurrent(self.config.timeouts.bootstrap())).await
    }

    async fn run_installers(
        &self,
        batch: Vec<(PluginSpec, Environment)>,
        report: &mut InstallReport,
    ) -> Vec<(PluginSpec, Environment)> {
        let mut installed = Vec::new();
        for (spec, env) in batch {
            let timeout = install_timeout(spec.method(), &self.config.timeouts);
            match bounded(self.environments.install(&spec, &env), timeout).await {
                Ok(outcome) => {
                    log::debug!("Installer of '{}' finished: {:?}", spec.name(), outcome);
                    installed.push((spec, env));
                }
                Err(e) => report.failed.push(PluginFailure::new(spec.name(), e)),
            }
        }
        installed
    }

    fn not_ready_names(&self) -> Vec<String> {
        self.state
            .all_specs()
            .map(PluginSpec::name)
            .filter(|name| !self.state.is_ready(name))
            .map(str::to_string)
            .collect()
    }
}
