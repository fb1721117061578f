use std::path::Path;
use std::time::Duration;

use crate::config::Timeouts;
use crate::environment::Environment;
use crate::environment::process::Invocation;
use crate::kernel::constants;
use crate::plugin_system::{InstallMethod, PluginSpec};

/// Build the installer invocation for `spec` inside `env`.
///
/// `None` means the variant has nothing to install.
pub fn installer_command(spec: &PluginSpec, env: &Environment, timeouts: &Timeouts) -> Option<Invocation> {
    let extra = &spec.options().extra_install_args;
    let bin = env.bin_dir().display().to_string();

    let invocation = match spec.method() {
        InstallMethod::Distribution(requirement) => pip(env, timeouts).arg(requirement.as_str()),
        InstallMethod::Directory(dir) => {
            let manifest = Path::new(dir).join(constants::REQUIREMENTS_FILE);
            pip(env, timeouts).arg("-r").arg(manifest.display().to_string())
        }
        InstallMethod::Site(_) => return None,
        InstallMethod::Hackage(package) => Invocation::new("cabal", install_timeout(spec.method(), timeouts))
            .args(["install", "--installdir"])
            .arg(bin)
            .arg(package.as_str()),
        InstallMethod::Stackage(package) => Invocation::new("stack", install_timeout(spec.method(), timeouts))
            .args(["install", "--local-bin-path"])
            .arg(bin)
            .arg(package.as_str()),
        InstallMethod::StackProject(project) => Invocation::new("stack", install_timeout(spec.method(), timeouts))
            .args(["install", "--local-bin-path"])
            .arg(bin)
            .current_dir(project.as_str()),
    };
    Some(invocation.args(extra.iter().cloned()))
}

/// Time the installer of `method` may take. Compiled plugins build from source.
pub fn install_timeout(method: &InstallMethod, timeouts: &Timeouts) -> Duration {
    match method {
        InstallMethod::Hackage(_) | InstallMethod::Stackage(_) | InstallMethod::StackProject(_) => {
            timeouts.compiled_install()
        }
        InstallMethod::Distribution(_) | InstallMethod::Directory(_) | InstallMethod::Site(_) => timeouts.install(),
    }
}

fn pip(env: &Environment, timeouts: &Timeouts) -> Invocation {
    Invocation::new(env.executable("pip"), timeouts.install())
        .env("VIRTUAL_ENV", env.root().display().to_string())
        .args(["install", "-U", "--no-cache"])
}
