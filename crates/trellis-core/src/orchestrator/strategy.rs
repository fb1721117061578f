use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;
use crate::environment::Environment;
use crate::host::WorkerCommand;
use crate::orchestrator::error::ActivationError;
use crate::plugin_system::{InstallMethod, PluginSpec};

/// Build the command line starting the worker of `spec`.
///
/// Python plugins run the worker module inside their environment; compiled
/// plugins run the executable installed into the environment's `bin`.
pub fn worker_command(spec: &PluginSpec, env: &Environment, config: &Config) -> Result<WorkerCommand, ActivationError> {
    let debug = spec.options().debug.unwrap_or(false) || config.passthrough_search_path_debug;

    let target = match spec.method() {
        InstallMethod::Distribution(_) => spec.module_name(),
        InstallMethod::Directory(dir) => dir.clone(),
        InstallMethod::Site(module) => module.clone(),
        InstallMethod::Hackage(_) | InstallMethod::Stackage(_) | InstallMethod::StackProject(_) => {
            let executable = env.executable(spec.name());
            let mut command = WorkerCommand::new([executable.display().to_string()]);
            command.forward_stderr = debug;
            return Ok(command);
        }
    };

    let interpreter = env.interpreter().ok_or_else(|| ActivationError::MissingInterpreter {
        plugin: spec.name().to_string(),
    })?;

    let mut search_paths: Vec<PathBuf> = Vec::new();
    if let InstallMethod::Directory(dir) = spec.method() {
        search_paths.push(PathBuf::from(dir));
    }
    search_paths.extend(spec.options().search_paths.iter().map(PathBuf::from));
    if debug {
        if let Some(outer) = std::env::var_os("PYTHONPATH") {
            search_paths.extend(std::env::split_paths(&outer));
        }
    }

    let mut command = WorkerCommand::new([
        interpreter.display().to_string(),
        "-m".to_string(),
        config.worker_module.clone(),
        target,
    ])
    .env("VIRTUAL_ENV", env.root().display().to_string())
    .env("PATH", prepend_path(env.bin_dir().to_path_buf()));
    // Always set, so the outer PYTHONPATH only leaks in debug mode
    let joined = std::env::join_paths(&search_paths).unwrap_or_default();
    command = command.env("PYTHONPATH", joined.to_string_lossy());
    command.forward_stderr = debug;
    Ok(command)
}

fn prepend_path(bin: PathBuf) -> String {
    let mut entries = vec![bin];
    if let Some(path) = std::env::var_os("PATH") {
        entries.extend(std::env::split_paths(&path));
    }
    std::env::join_paths(entries)
        .unwrap_or_else(|_| OsString::new())
        .to_string_lossy()
        .into_owned()
}
