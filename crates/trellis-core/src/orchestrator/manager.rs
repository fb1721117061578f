use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::{Config, ConfigError};
use crate::environment::{EnvironmentError, EnvironmentManager, EnvironmentStatus};
use crate::gather::{GatherOptions, gather};
use crate::host::Host;
use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::orchestrator::report::{DeactivationReport, InitReport, PluginFailure, SetupReport};
use crate::orchestrator::state::{OrchestratorState, PluginPhase};
use crate::plugin_system::{PluginOptions, PluginSpec, check_plugin_name, parse_spec, spec_from_config};
use crate::rpc::RpcBridge;

/// Drives plugins through their lifecycle.
///
/// Every operation takes `&mut self`: there is a single writer of the state,
/// and concurrency only happens inside an operation, through the gatherer.
pub struct Orchestrator {
    pub(crate) config: Arc<Config>,
    pub(crate) host: Arc<dyn Host>,
    pub(crate) environments: Arc<dyn EnvironmentManager>,
    pub(crate) bridge: RpcBridge,
    pub(crate) state: OrchestratorState,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, host: Arc<dyn Host>, environments: Arc<dyn EnvironmentManager>) -> Self {
        let bridge = RpcBridge::new(Arc::clone(&host), &config.timeouts);
        Self {
            config,
            host,
            environments,
            bridge,
            state: OrchestratorState::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn phase(&self, name: &str) -> Option<PluginPhase> {
        self.state.phase(name)
    }

    /// Register the self-managed plugin, read the configured descriptors and,
    /// with `autostart`, set everything up.
    ///
    /// Malformed descriptors are skipped and listed in the report.
    pub async fn init(&mut self) -> Result<InitReport> {
        if self.config.handle_self {
            self.state.set_self_spec(PluginSpec::simple(constants::SELF_PLUGIN_NAME));
        }

        let mut report = InitReport::default();
        let config = Arc::clone(&self.config);
        for value in &config.plugins {
            match spec_from_config(value) {
                Ok(spec) => {
                    let name = spec.name().to_string();
                    if self.state.add_spec(spec) {
                        report.configured.push(name);
                    } else {
                        log::warn!("Ignoring duplicate plugin '{}'", name);
                        report.rejected.push(PluginFailure::new(&name, "duplicate plugin name"));
                    }
                }
                Err(e) => {
                    log::warn!("Ignoring plugin descriptor: {}", e);
                    report.rejected.push(PluginFailure::new(&descriptor_label(value), e));
                }
            }
        }
        log::info!(
            "Configured {} plugins ({} rejected)",
            report.configured.len(),
            report.rejected.len()
        );

        if self.config.autostart {
            report.setup = Some(self.setup().await?);
        }
        Ok(report)
    }

    /// Configure one more plugin at runtime; runs setup with `autostart`.
    pub async fn add_plugin(
        &mut self,
        raw_spec: &str,
        name: Option<&str>,
        options: PluginOptions,
    ) -> Result<Option<SetupReport>> {
        let name = name.unwrap_or(raw_spec);
        check_plugin_name(name)?;
        let spec = parse_spec(name, raw_spec).with_options(options);
        log::info!("Adding plugin {}", spec);
        if !self.state.add_spec(spec) {
            return Err(ConfigError::InvalidDescriptor {
                plugin: name.to_string(),
                reason: "a plugin with this name is already configured".to_string(),
            }
            .into());
        }
        if self.config.autostart {
            Ok(Some(self.setup().await?))
        } else {
            Ok(None)
        }
    }

    /// Human readable listing of the configured plugins.
    pub fn show_configured(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "environment root: {}", self.config.environment_root().display());
        if self.state.specs().is_empty() {
            out.push_str("no plugins configured\n");
        }
        for spec in self.state.specs() {
            let phase = self.state.phase(spec.name()).unwrap_or(PluginPhase::Configured);
            let _ = writeln!(out, "  {} [{}]", spec, phase);
        }
        out
    }

    /// Forget cached readiness and derive it again from disk. Running workers
    /// are left alone. Returns the names that are ready afterwards.
    pub async fn refresh(&mut self) -> Vec<String> {
        let names: Vec<String> = self.state.all_specs().map(|s| s.name().to_string()).collect();
        for name in &names {
            self.state.forget_environment(name);
        }
        self.derive_readiness().await;
        self.state.ready_names()
    }

    /// Deactivate every active plugin.
    pub async fn shutdown(&mut self) -> DeactivationReport {
        log::info!("Shutting down {} active plugins", self.state.active_names().len());
        match self.deactivate(&[]).await {
            Ok(report) => report,
            Err(e) => {
                log::error!("Shutdown failed: {}", e);
                DeactivationReport::default()
            }
        }
    }

    /// Health-check existing environments of plugins not yet ready, marking
    /// the healthy ones. Returns the names that became ready.
    pub(crate) async fn derive_readiness(&mut self) -> Vec<String> {
        let specs: Vec<PluginSpec> = self
            .state
            .all_specs()
            .filter(|s| !self.state.is_ready(s.name()))
            .cloned()
            .collect();

        let environments = Arc::clone(&self.environments);
        let tasks: Vec<_> = specs
            .iter()
            .map(|spec| {
                let environments = Arc::clone(&environments);
                async move {
                    match environments.check(spec).await? {
                        EnvironmentStatus::Present(env) => {
                            let healthy = environments.health_check(&env, spec).await;
                            Ok::<_, EnvironmentError>(healthy.then_some(env))
                        }
                        EnvironmentStatus::Absent => Ok(None),
                    }
                }
            })
            .collect();
        let results = gather(tasks, &self.concurrent(self.config.timeouts.health_check())).await;

        let mut ready = Vec::new();
        for (spec, result) in specs.iter().zip(results) {
            match result {
                Ok(Some(env)) => {
                    self.state.mark_ready(env);
                    ready.push(spec.name().to_string());
                }
                Ok(None) => log::debug!("'{}' needs installation", spec.name()),
                Err(e) => log::warn!("Could not inspect the environment of '{}': {}", spec.name(), e),
            }
        }
        ready
    }

    pub(crate) fn concurrent(&self, timeout: Duration) -> GatherOptions {
        GatherOptions::concurrent(timeout, self.config.max_parallel)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Keep `names` that appear in `candidates`, in candidate order. An empty
/// filter keeps everything. Also returns the filter names left unmatched.
pub(crate) fn select(candidates: Vec<String>, filter: &[String]) -> (Vec<String>, Vec<String>) {
    if filter.is_empty() {
        return (candidates, Vec::new());
    }
    let matched: Vec<String> = candidates.into_iter().filter(|c| filter.contains(c)).collect();
    let unmatched = filter.iter().filter(|n| !matched.contains(n)).cloned().collect();
    (matched, unmatched)
}

fn descriptor_label(value: &Value) -> String {
    value
        .get("name")
        .or_else(|| value.get("spec"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}
