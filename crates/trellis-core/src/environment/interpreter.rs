use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::environment::error::EnvironmentError;
use crate::kernel::constants;
use crate::plugin_system::PluginSpec;

/// The interpreter requested for `spec`: its own override, else the global
/// one, else `python3`.
pub fn requested_interpreter(spec: &PluginSpec, config: &Config) -> String {
    spec.options()
        .interpreter
        .clone()
        .or_else(|| config.interpreter.clone())
        .unwrap_or_else(|| constants::DEFAULT_INTERPRETER.to_string())
}

/// Resolve `requested` to an executable path.
///
/// Anything that looks like a path is used as given. Bare names are looked up
/// on `PATH`, skipping entries inside `$VIRTUAL_ENV` so the orchestrator's
/// own environment never becomes the base of a plugin environment.
pub fn resolve_interpreter(plugin: &str, requested: &str) -> Result<PathBuf, EnvironmentError> {
    let not_found = || EnvironmentError::InterpreterNotFound {
        plugin: plugin.to_string(),
        interpreter: requested.to_string(),
    };

    let candidate = Path::new(requested);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let path = std::env::var_os("PATH").ok_or_else(not_found)?;
    let virtual_env = std::env::var_os("VIRTUAL_ENV").map(PathBuf::from);
    search_path(requested, &path, virtual_env.as_deref()).ok_or_else(not_found)
}

/// Find `program` in the `PATH`-style list `path`, ignoring directories
/// under `excluded`.
pub fn search_path(program: &str, path: &OsStr, excluded: Option<&Path>) -> Option<PathBuf> {
    std::env::split_paths(path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .filter(|dir| excluded.is_none_or(|venv| !dir.starts_with(venv)))
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
