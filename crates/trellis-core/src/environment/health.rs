use crate::config::Timeouts;
use crate::environment::Environment;
use crate::environment::error::EnvironmentError;
use crate::environment::process::Invocation;
use crate::plugin_system::{InstallMethod, PluginSpec, requirement_key};

/// Whether `requirement` has installed package metadata in `env`.
///
/// Only looks at `*.dist-info` and `*.egg-info` entries, nothing is imported.
pub async fn has_distribution_metadata(env: &Environment, requirement: &str) -> bool {
    let key = requirement_key(requirement);
    for dir in env.site_packages().await {
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_str().and_then(metadata_key).is_some_and(|name| name == key) {
                return true;
            }
        }
    }
    false
}

// `Foo_Bar-1.0.dist-info` -> `foo-bar`
fn metadata_key(entry: &str) -> Option<String> {
    let stem = entry
        .strip_suffix(".dist-info")
        .or_else(|| entry.strip_suffix(".egg-info"))?;
    stem.split('-').next().map(requirement_key)
}

/// The `import <module>` probe for directory and site plugins.
pub fn import_check(spec: &PluginSpec, env: &Environment, timeouts: &Timeouts) -> Result<Invocation, EnvironmentError> {
    let interpreter = env.interpreter().ok_or_else(|| EnvironmentError::NoInterpreter {
        plugin: spec.name().to_string(),
    })?;

    let mut search_paths = Vec::new();
    if let InstallMethod::Directory(dir) = spec.method() {
        search_paths.push(dir.clone());
    }
    search_paths.extend(spec.options().search_paths.iter().cloned());

    let mut invocation = Invocation::new(interpreter, timeouts.health_check())
        .arg("-c")
        .arg(format!("import {}", spec.module_name()));
    if let Ok(joined) = std::env::join_paths(&search_paths) {
        invocation = invocation.env("PYTHONPATH", joined.to_string_lossy());
    }
    Ok(invocation)
}
