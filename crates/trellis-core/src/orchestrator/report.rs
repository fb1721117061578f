use std::fmt;

use crate::stage_manager::BarrierReport;

/// A plugin that failed inside a batch, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFailure {
    pub plugin: String,
    pub message: String,
}

impl PluginFailure {
    pub fn new(plugin: &str, message: impl fmt::Display) -> Self {
        Self {
            plugin: plugin.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for PluginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.plugin, self.message)
    }
}

fn failure_list(failures: &[PluginFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Outcome of one `activate` call
#[derive(Debug, Clone, Default)]
pub struct ActivationReport {
    pub activated: Vec<String>,
    /// Matched the filter but already had a worker
    pub already_active: Vec<String>,
    /// Named in the filter but not ready
    pub unmatched: Vec<String>,
    pub failed: Vec<PluginFailure>,
    /// Procedure descriptors or definitions that went wrong
    pub registration_errors: Vec<PluginFailure>,
    pub stages: BarrierReport,
}

impl ActivationReport {
    /// User-facing notices, e.g. about plugins that were already active
    pub fn notices(&self) -> Vec<String> {
        let mut notices = Vec::new();
        if !self.already_active.is_empty() {
            notices.push(format!("already active: {}", self.already_active.join(", ")));
        }
        if !self.unmatched.is_empty() {
            notices.push(format!("not installed: {}", self.unmatched.join(", ")));
        }
        if !self.failed.is_empty() {
            notices.push(format!("failed to activate: {}", failure_list(&self.failed)));
        }
        notices
    }

    pub fn is_noop(&self) -> bool {
        self.activated.is_empty() && self.failed.is_empty()
    }
}

/// Outcome of one `deactivate` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeactivationReport {
    pub deactivated: Vec<String>,
    /// Named in the filter but not active
    pub unmatched: Vec<String>,
    /// Teardown steps that failed; the plugin is deactivated regardless
    pub warnings: Vec<PluginFailure>,
}

/// Outcome of `reboot`
#[derive(Debug, Clone, Default)]
pub struct RebootReport {
    pub deactivation: DeactivationReport,
    pub activation: ActivationReport,
}

/// Whether a batch installs missing plugins or upgrades installed ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOperation {
    Install,
    Update,
}

impl InstallOperation {
    pub fn noun(&self) -> &'static str {
        match self {
            InstallOperation::Install => "installation",
            InstallOperation::Update => "update",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            InstallOperation::Install => "installed",
            InstallOperation::Update => "updated",
        }
    }
}

/// Outcome of `install` or `update`
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub operation: InstallOperation,
    pub succeeded: Vec<String>,
    pub failed: Vec<PluginFailure>,
    pub unmatched: Vec<String>,
    /// Activation chained after a successful install
    pub activation: Option<ActivationReport>,
    /// Reboots performed after an update
    pub reboots: Vec<RebootReport>,
}

impl InstallReport {
    pub fn new(operation: InstallOperation) -> Self {
        Self {
            operation,
            succeeded: Vec::new(),
            failed: Vec::new(),
            unmatched: Vec::new(),
            activation: None,
            reboots: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// The combined message shown once per batch
    pub fn message(&self) -> String {
        let verb = self.operation.past_tense();
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (true, true) => format!("nothing {}", verb),
            (false, true) => format!("{} {}", verb, self.succeeded.join(", ")),
            (true, false) => format!("{} failed for {}", self.operation.noun(), failure_list(&self.failed)),
            (false, false) => format!(
                "{} {}; {} failed for {}",
                verb,
                self.succeeded.join(", "),
                self.operation.noun(),
                failure_list(&self.failed)
            ),
        }
    }
}

/// Outcome of `setup`
#[derive(Debug, Clone)]
pub struct SetupReport {
    /// Plugins whose existing environment passed the health check
    pub already_ready: Vec<String>,
    pub install: InstallReport,
}

/// Outcome of `init`
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    pub configured: Vec<String>,
    /// Descriptors that could not be used, skipped with a warning
    pub rejected: Vec<PluginFailure>,
    /// Present when `autostart` ran setup
    pub setup: Option<SetupReport>,
}
