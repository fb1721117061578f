use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::environment::error::EnvironmentError;
use crate::environment::health::{has_distribution_metadata, import_check};
use crate::environment::install::installer_command;
use crate::environment::interpreter::{requested_interpreter, resolve_interpreter};
use crate::environment::process::Invocation;
use crate::environment::{Environment, EnvironmentManager, EnvironmentStatus, InstallOutcome};
use crate::plugin_system::{InstallMethod, PluginSpec, is_plain_name};

/// Environments under `Config::environment_root`, one directory per plugin
#[derive(Debug, Clone)]
pub struct DefaultEnvironmentManager {
    config: Arc<Config>,
    root: PathBuf,
}

impl DefaultEnvironmentManager {
    pub fn new(config: Arc<Config>) -> Self {
        let root = config.environment_root();
        Self { config, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the environment of `spec`
    pub fn environment_dir(&self, spec: &PluginSpec) -> PathBuf {
        self.root.join(spec.name())
    }

    // Only a plain plugin name keeps the directory inside the root
    fn contained_dir(&self, spec: &PluginSpec) -> Result<PathBuf, EnvironmentError> {
        let dir = self.environment_dir(spec);
        if is_plain_name(spec.name()) && dir.parent() == Some(self.root.as_path()) {
            Ok(dir)
        } else {
            Err(EnvironmentError::OutsideRoot {
                plugin: spec.name().to_string(),
                path: dir,
            })
        }
    }

    async fn remove_stale(&self, spec: &PluginSpec, dir: &Path) -> Result<(), EnvironmentError> {
        if tokio::fs::symlink_metadata(dir).await.is_err() {
            return Ok(());
        }
        log::info!("Removing stale environment of '{}' at {}", spec.name(), dir.display());
        tokio::fs::remove_dir_all(dir).await.map_err(|source| EnvironmentError::Io {
            plugin: spec.name().to_string(),
            operation: "remove".to_string(),
            path: dir.to_path_buf(),
            source,
        })
    }

    fn layout(&self, spec: &PluginSpec) -> Environment {
        let dir = self.environment_dir(spec);
        match spec.method() {
            InstallMethod::Distribution(_) | InstallMethod::Directory(_) => Environment::python(spec.name(), dir),
            InstallMethod::Site(_) => {
                let interpreter = resolve_interpreter(spec.name(), &requested_interpreter(spec, &self.config)).ok();
                Environment::site(spec.name(), dir, interpreter)
            }
            InstallMethod::Hackage(_) | InstallMethod::Stackage(_) | InstallMethod::StackProject(_) => {
                Environment::compiled(spec.name(), dir)
            }
        }
    }

    async fn create_dir(&self, spec: &PluginSpec, path: &Path) -> Result<(), EnvironmentError> {
        tokio::fs::create_dir_all(path).await.map_err(|source| EnvironmentError::Io {
            plugin: spec.name().to_string(),
            operation: "create".to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl EnvironmentManager for DefaultEnvironmentManager {
    async fn check(&self, spec: &PluginSpec) -> Result<EnvironmentStatus, EnvironmentError> {
        let dir = self.contained_dir(spec)?;
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(EnvironmentStatus::Present(self.layout(spec))),
            Ok(_) => Ok(EnvironmentStatus::Absent),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EnvironmentStatus::Absent),
            Err(source) => Err(EnvironmentError::Io {
                plugin: spec.name().to_string(),
                operation: "inspect".to_string(),
                path: dir,
                source,
            }),
        }
    }

    async fn bootstrap(&self, spec: &PluginSpec) -> Result<Environment, EnvironmentError> {
        let dir = self.contained_dir(spec)?;

        match spec.method() {
            InstallMethod::Distribution(_) | InstallMethod::Directory(_) => {
                // A missing interpreter leaves the old environment in place
                let interpreter = resolve_interpreter(spec.name(), &requested_interpreter(spec, &self.config))?;
                self.remove_stale(spec, &dir).await?;
                self.create_dir(spec, &self.root).await?;
                Invocation::new(interpreter, self.config.timeouts.bootstrap())
                    .args(["-m", "venv"])
                    .arg(dir.display().to_string())
                    .arg("--upgrade")
                    .run(spec.name())
                    .await?;
                log::info!("Created virtual environment for '{}' at {}", spec.name(), dir.display());
                Ok(Environment::python(spec.name(), dir))
            }
            InstallMethod::Site(_) => {
                self.remove_stale(spec, &dir).await?;
                self.create_dir(spec, &dir).await?;
                Ok(self.layout(spec))
            }
            InstallMethod::Hackage(_) | InstallMethod::Stackage(_) | InstallMethod::StackProject(_) => {
                self.remove_stale(spec, &dir).await?;
                let env = Environment::compiled(spec.name(), dir);
                self.create_dir(spec, env.bin_dir()).await?;
                Ok(env)
            }
        }
    }

    async fn install(&self, spec: &PluginSpec, env: &Environment) -> Result<InstallOutcome, EnvironmentError> {
        let Some(invocation) = installer_command(spec, env, &self.config.timeouts) else {
            log::debug!("Nothing to install for '{}'", spec.name());
            return Ok(InstallOutcome::NothingToInstall);
        };
        log::info!("Installing '{}' ({})", spec.name(), spec.method());
        let output = invocation.run(spec.name()).await?;
        Ok(InstallOutcome::Installed { output: output.stdout })
    }

    async fn health_check(&self, env: &Environment, spec: &PluginSpec) -> bool {
        let healthy = match spec.method() {
            InstallMethod::Distribution(requirement) => has_distribution_metadata(env, requirement).await,
            InstallMethod::Directory(_) | InstallMethod::Site(_) => {
                match import_check(spec, env, &self.config.timeouts) {
                    Ok(invocation) => match invocation.output(spec.name()).await {
                        Ok(output) => output.success(),
                        Err(e) => {
                            log::debug!("Import check of '{}' did not run: {}", spec.name(), e);
                            false
                        }
                    },
                    Err(e) => {
                        log::debug!("Import check of '{}' impossible: {}", spec.name(), e);
                        false
                    }
                }
            }
            InstallMethod::Hackage(_) | InstallMethod::Stackage(_) | InstallMethod::StackProject(_) => {
                env.executable(spec.name()).is_file()
            }
        };
        log::debug!("Health check of '{}': {}", spec.name(), if healthy { "ok" } else { "failed" });
        healthy
    }
}
