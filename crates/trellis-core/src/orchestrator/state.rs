use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::environment::Environment;
use crate::host::ChannelId;
use crate::plugin_system::{PluginSpec, camel_case};
use crate::rpc::RegisteredProcedure;

/// A running worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveInstance {
    pub name: String,
    pub channel: ChannelId,
    pub pid: u32,
}

impl ActiveInstance {
    pub fn new(name: &str, channel: ChannelId, pid: u32) -> Self {
        Self {
            name: name.to_string(),
            channel,
            pid,
        }
    }

    /// Prefix of the host functions and commands the worker defines
    pub fn prefix(&self) -> String {
        camel_case(&self.name)
    }
}

/// Lifecycle position of one configured plugin.
///
/// `Configured -> EnvironmentReady -> Uninitialized -> Running`, and back to
/// `EnvironmentReady` on deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginPhase {
    /// No healthy environment yet
    Configured,
    /// Installed and healthy, no worker
    EnvironmentReady,
    /// Worker running, startup stages not finished
    Uninitialized,
    /// Worker running and initialized
    Running,
}

impl PluginPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, PluginPhase::Uninitialized | PluginPhase::Running)
    }
}

impl fmt::Display for PluginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PluginPhase::Configured => "configured",
            PluginPhase::EnvironmentReady => "ready",
            PluginPhase::Uninitialized => "starting",
            PluginPhase::Running => "running",
        };
        f.write_str(label)
    }
}

/// Everything the orchestrator knows about its plugins.
///
/// Listing methods return names in configuration order, the self-managed
/// plugin last.
#[derive(Debug, Default)]
pub struct OrchestratorState {
    specs: Vec<PluginSpec>,
    self_spec: Option<PluginSpec>,
    environments: HashMap<String, Environment>,
    ready: HashSet<String>,
    active: HashMap<String, ActiveInstance>,
    uninitialized: HashSet<String>,
    procedures: HashMap<String, Vec<RegisteredProcedure>>,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configured plugin. Returns `false` if the name is taken.
    pub fn add_spec(&mut self, spec: PluginSpec) -> bool {
        if self.spec(spec.name()).is_some() {
            return false;
        }
        self.specs.push(spec);
        true
    }

    pub fn set_self_spec(&mut self, spec: PluginSpec) {
        self.self_spec = Some(spec);
    }

    pub fn self_spec(&self) -> Option<&PluginSpec> {
        self.self_spec.as_ref()
    }

    pub fn is_self(&self, name: &str) -> bool {
        self.self_spec.as_ref().is_some_and(|s| s.name() == name)
    }

    /// Plugins from configuration and `add_plugin`
    pub fn specs(&self) -> &[PluginSpec] {
        &self.specs
    }

    /// Configured plugins followed by the self-managed one
    pub fn all_specs(&self) -> impl Iterator<Item = &PluginSpec> {
        self.specs.iter().chain(self.self_spec.iter())
    }

    pub fn spec(&self, name: &str) -> Option<&PluginSpec> {
        self.all_specs().find(|s| s.name() == name)
    }

    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.get(name)
    }

    /// Record a healthy environment for `env.name()`.
    pub fn mark_ready(&mut self, env: Environment) {
        self.ready.insert(env.name().to_string());
        self.environments.insert(env.name().to_string(), env);
    }

    pub fn unmark_ready(&mut self, name: &str) {
        self.ready.remove(name);
    }

    /// Forget the environment of an inactive plugin.
    pub fn forget_environment(&mut self, name: &str) {
        if !self.is_active(name) {
            self.ready.remove(name);
            self.environments.remove(name);
        }
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.ready.contains(name)
    }

    pub fn ready_names(&self) -> Vec<String> {
        self.names_where(|name| self.ready.contains(name))
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    pub fn active(&self, name: &str) -> Option<&ActiveInstance> {
        self.active.get(name)
    }

    pub fn active_names(&self) -> Vec<String> {
        self.names_where(|name| self.active.contains_key(name))
    }

    /// Record a started worker; it stays uninitialized until its batch has
    /// passed the startup stages.
    pub fn insert_active(&mut self, instance: ActiveInstance) {
        self.uninitialized.insert(instance.name.clone());
        self.active.insert(instance.name.clone(), instance);
    }

    pub fn uninitialized_names(&self) -> Vec<String> {
        self.names_where(|name| self.uninitialized.contains(name))
    }

    pub fn initialization_complete(&mut self) {
        self.uninitialized.clear();
    }

    /// Attach registered procedures to an active plugin. Ignored otherwise.
    pub fn set_procedures(&mut self, name: &str, procedures: Vec<RegisteredProcedure>) {
        if self.is_active(name) {
            self.procedures.insert(name.to_string(), procedures);
        }
    }

    pub fn procedures(&self, name: &str) -> &[RegisteredProcedure] {
        self.procedures.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop the worker of `name` along with its procedures.
    pub fn remove_active(&mut self, name: &str) -> Option<(ActiveInstance, Vec<RegisteredProcedure>)> {
        let instance = self.active.remove(name)?;
        self.uninitialized.remove(name);
        let procedures = self.procedures.remove(name).unwrap_or_default();
        Some((instance, procedures))
    }

    pub fn phase(&self, name: &str) -> Option<PluginPhase> {
        self.spec(name)?;
        let phase = if self.active.contains_key(name) {
            if self.uninitialized.contains(name) {
                PluginPhase::Uninitialized
            } else {
                PluginPhase::Running
            }
        } else if self.ready.contains(name) {
            PluginPhase::EnvironmentReady
        } else {
            PluginPhase::Configured
        };
        Some(phase)
    }

    fn names_where(&self, keep: impl Fn(&str) -> bool) -> Vec<String> {
        self.all_specs()
            .map(PluginSpec::name)
            .filter(|name| keep(name))
            .map(str::to_string)
            .collect()
    }
}
