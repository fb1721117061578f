//! Test doubles shared by module and scenario tests.
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::environment::{
    Environment, EnvironmentError, EnvironmentManager, EnvironmentStatus, InstallOutcome,
};
use crate::host::{ChannelId, Host, HostError, WorkerCommand};
use crate::plugin_system::{InstallMethod, PluginSpec};

/// Ordered log shared by the doubles, so tests can assert on interleavings
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn positions_with_prefix(&self, prefix: &str) -> Vec<usize> {
        self.events()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.starts_with(prefix))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.positions_with_prefix(prefix).len()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Debug, Default)]
struct HostState {
    next_channel: ChannelId,
    live: HashMap<ChannelId, WorkerCommand>,
    commands: HashSet<String>,
    failing_commands: HashSet<String>,
    handlers: HashMap<String, Value>,
    never_ready: HashSet<String>,
    silent: HashSet<String>,
    failing_spawns: HashSet<String>,
    vars: HashMap<String, Value>,
}

/// A scripted editor: records every primitive it is asked to perform.
///
/// Workers spawned from a command line containing a name in `failing_spawns`
/// fail to start. `<Prefix>Poll` answers `true` unless the prefix is marked
/// never ready. `<Prefix>RpcHandlers` answers the configured handler list.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: EventLog,
    state: Arc<Mutex<HostState>>,
}

impl RecordingHost {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            state: Arc::new(Mutex::new(HostState {
                next_channel: 1,
                ..HostState::default()
            })),
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Define host commands, e.g. stage commands.
    pub fn define_commands(&self, names: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.commands.extend(names.iter().map(|n| n.to_string()));
    }

    pub fn fail_command(&self, name: &str) {
        self.state.lock().unwrap().failing_commands.insert(name.to_string());
    }

    /// The procedures a worker with `prefix` reports.
    pub fn set_handlers(&self, prefix: &str, handlers: Value) {
        self.state
            .lock()
            .unwrap()
            .handlers
            .insert(format!("{}RpcHandlers", prefix), handlers);
    }

    pub fn never_ready(&self, prefix: &str) {
        self.state.lock().unwrap().never_ready.insert(prefix.to_string());
    }

    /// Calls to functions of `prefix` fail, as if the worker had died.
    pub fn silence(&self, prefix: &str) {
        self.state.lock().unwrap().silent.insert(prefix.to_string());
    }

    pub fn fail_spawn(&self, needle: &str) {
        self.state.lock().unwrap().failing_spawns.insert(needle.to_string());
    }

    pub fn live_channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<_> = self.state.lock().unwrap().live.keys().copied().collect();
        channels.sort();
        channels
    }

    pub fn worker_command(&self, channel: ChannelId) -> Option<WorkerCommand> {
        self.state.lock().unwrap().live.get(&channel).cloned()
    }

    fn is_silent(&self, function: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.silent.iter().any(|prefix| function.starts_with(prefix.as_str()))
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn spawn(&self, command: &WorkerCommand) -> Result<(ChannelId, u32), HostError> {
        let mut state = self.state.lock().unwrap();
        let line = command.to_string();
        if state.failing_spawns.iter().any(|needle| line.contains(needle.as_str())) {
            self.log.push(format!("spawn-failed {}", line));
            return Err(HostError::Spawn {
                command: line,
                message: "scripted failure".to_string(),
            });
        }
        let channel = state.next_channel;
        state.next_channel += 1;
        state.live.insert(channel, command.clone());
        self.log.push(format!("spawn {} {}", channel, line));
        Ok((channel, 1000 + channel as u32))
    }

    async fn kill(&self, channel: ChannelId) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        state.live.remove(&channel).ok_or(HostError::UnknownChannel(channel))?;
        self.log.push(format!("kill {}", channel));
        Ok(())
    }

    async fn call(&self, function: &str, _args: Vec<Value>, timeout: Duration) -> Result<Value, HostError> {
        self.log.push(format!("call {}", function));
        if self.is_silent(function) {
            return Err(HostError::Timeout {
                function: function.to_string(),
                timeout,
            });
        }
        let state = self.state.lock().unwrap();
        if let Some(prefix) = function.strip_suffix("Poll") {
            return Ok(json!(!state.never_ready.contains(prefix)));
        }
        state.handlers.get(function).cloned().ok_or_else(|| HostError::Call {
            function: function.to_string(),
            message: "undefined function".to_string(),
        })
    }

    async fn call_once_defined(&self, function: &str, timeout: Duration) -> Result<Value, HostError> {
        self.log.push(format!("call-once {}", function));
        if self.is_silent(function) {
            return Err(HostError::Timeout {
                function: function.to_string(),
                timeout,
            });
        }
        let state = self.state.lock().unwrap();
        Ok(state.handlers.get(function).cloned().unwrap_or_else(|| json!([])))
    }

    async fn run_command(&self, name: &str, args: &[String]) -> Result<(), HostError> {
        let line = if args.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", name, args.join(" "))
        };
        self.log.push(format!("cmd {}", line));
        if self.state.lock().unwrap().failing_commands.contains(name) {
            return Err(HostError::Command {
                command: line,
                message: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    async fn command_exists(&self, name: &str) -> Result<bool, HostError> {
        Ok(self.state.lock().unwrap().commands.contains(name))
    }

    async fn var(&self, name: &str) -> Result<Option<Value>, HostError> {
        Ok(self.state.lock().unwrap().vars.get(name).cloned())
    }

    async fn set_var(&self, name: &str, value: Value) -> Result<(), HostError> {
        self.state.lock().unwrap().vars.insert(name.to_string(), value);
        Ok(())
    }

    async fn load_runtime(&self, path: &str) -> Result<(), HostError> {
        self.log.push(format!("runtime {}", path));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct EnvState {
    existing: HashSet<String>,
    healthy: HashSet<String>,
    failing_bootstraps: HashSet<String>,
    failing_installs: HashSet<String>,
    /// Installs that succeed without leaving a usable plugin behind
    broken_installs: HashSet<String>,
    delay: Duration,
    in_flight: HashMap<&'static str, usize>,
    peaks: HashMap<&'static str, usize>,
}

/// In-memory environment manager; nothing touches the disk.
#[derive(Debug, Clone)]
pub struct FakeEnvironmentManager {
    root: PathBuf,
    log: EventLog,
    state: Arc<Mutex<EnvState>>,
}

impl FakeEnvironmentManager {
    pub fn new(root: impl Into<PathBuf>, log: EventLog) -> Self {
        Self {
            root: root.into(),
            log,
            state: Arc::new(Mutex::new(EnvState::default())),
        }
    }

    /// Pretend `name` already has a healthy environment.
    pub fn preinstall(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.existing.insert(name.to_string());
        state.healthy.insert(name.to_string());
    }

    pub fn fail_bootstrap(&self, name: &str) {
        self.state.lock().unwrap().failing_bootstraps.insert(name.to_string());
    }

    pub fn fail_install(&self, name: &str) {
        self.state.lock().unwrap().failing_installs.insert(name.to_string());
    }

    pub fn break_install(&self, name: &str) {
        self.state.lock().unwrap().broken_installs.insert(name.to_string());
    }

    /// Make every bootstrap, install and health check take `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    /// Most calls of `operation` that were running at the same time
    pub fn peak(&self, operation: &str) -> usize {
        self.state.lock().unwrap().peaks.get(operation).copied().unwrap_or(0)
    }

    async fn occupy(&self, operation: &'static str) {
        let delay = {
            let mut state = self.state.lock().unwrap();
            let running = state.in_flight.entry(operation).or_default();
            *running += 1;
            let running = *running;
            let peak = state.peaks.entry(operation).or_default();
            *peak = (*peak).max(running);
            state.delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(running) = self.state.lock().unwrap().in_flight.get_mut(operation) {
            *running -= 1;
        }
    }

    fn layout(&self, spec: &PluginSpec) -> Environment {
        let dir = self.root.join(spec.name());
        match spec.method() {
            InstallMethod::Distribution(_) | InstallMethod::Directory(_) => Environment::python(spec.name(), dir),
            InstallMethod::Site(_) => Environment::site(spec.name(), dir, Some(PathBuf::from("/usr/bin/python3"))),
            InstallMethod::Hackage(_) | InstallMethod::Stackage(_) | InstallMethod::StackProject(_) => {
                Environment::compiled(spec.name(), dir)
            }
        }
    }
}

#[async_trait]
impl EnvironmentManager for FakeEnvironmentManager {
    async fn check(&self, spec: &PluginSpec) -> Result<EnvironmentStatus, EnvironmentError> {
        if self.state.lock().unwrap().existing.contains(spec.name()) {
            Ok(EnvironmentStatus::Present(self.layout(spec)))
        } else {
            Ok(EnvironmentStatus::Absent)
        }
    }

    async fn bootstrap(&self, spec: &PluginSpec) -> Result<Environment, EnvironmentError> {
        self.log.push(format!("bootstrap {}", spec.name()));
        self.occupy("bootstrap").await;
        let mut state = self.state.lock().unwrap();
        if state.failing_bootstraps.contains(spec.name()) {
            return Err(EnvironmentError::Failed {
                plugin: spec.name().to_string(),
                program: "python3".to_string(),
                code: Some(1),
                stderr: "no venv module".to_string(),
            });
        }
        state.existing.insert(spec.name().to_string());
        state.healthy.remove(spec.name());
        Ok(self.layout(spec))
    }

    async fn install(&self, spec: &PluginSpec, _env: &Environment) -> Result<InstallOutcome, EnvironmentError> {
        self.log.push(format!("install {}", spec.name()));
        self.occupy("install").await;
        let mut state = self.state.lock().unwrap();
        if state.failing_installs.contains(spec.name()) {
            return Err(EnvironmentError::Failed {
                plugin: spec.name().to_string(),
                program: "pip".to_string(),
                code: Some(1),
                stderr: format!("No matching distribution found for {}", spec.name()),
            });
        }
        if state.broken_installs.contains(spec.name()) {
            state.healthy.remove(spec.name());
        } else {
            state.healthy.insert(spec.name().to_string());
        }
        Ok(InstallOutcome::Installed {
            output: format!("Successfully installed {}", spec.name()),
        })
    }

    async fn health_check(&self, _env: &Environment, spec: &PluginSpec) -> bool {
        self.log.push(format!("health {}", spec.name()));
        self.occupy("health").await;
        self.state.lock().unwrap().healthy.contains(spec.name())
    }
}
