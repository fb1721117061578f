/// Application name
pub const APP_NAME: &str = "trellis";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name under which the orchestrator manages its own package
pub const SELF_PLUGIN_NAME: &str = "trellis";

/// Prefix of host variables holding orchestrator settings
pub const SETTINGS_PREFIX: &str = "trellis";

/// Cache subdirectory holding plugin environments
pub const ENVIRONMENT_DIR: &str = "trellis/venvs";

/// Runtime directory loaded by the host once a plugin is activated
pub const RUNTIME_DIR: &str = "trellis";

/// Interpreter used when neither the plugin nor the config overrides it
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Module that starts a python worker host inside a plugin environment
pub const DEFAULT_WORKER_MODULE: &str = "ribosome.host";

/// Manifest used by directory plugins
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Startup stages run for every newly activated batch (upper bound exclusive)
pub const STARTUP_STAGES: std::ops::Range<u8> = 1..5;

/// Default bound on concurrently running IO tasks
pub const DEFAULT_MAX_PARALLEL: usize = 4;

// Timeouts, in seconds
pub const BOOTSTRAP_TIMEOUT_SECS: u64 = 30;
pub const INSTALL_TIMEOUT_SECS: u64 = 120;
pub const COMPILED_INSTALL_TIMEOUT_SECS: u64 = 600;
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 30;
pub const PROBE_TIMEOUT_SECS: u64 = 10;
pub const RPC_TIMEOUT_SECS: u64 = 3;

/// Interval between two readiness probes of a starting worker
pub const PROBE_INTERVAL_MILLIS: u64 = 100;
