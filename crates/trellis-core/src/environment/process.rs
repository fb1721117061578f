use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::environment::error::EnvironmentError;

/// Captured result of a finished subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A subprocess run on behalf of a plugin: venv creation, installers and
/// import checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Run to completion and capture the output, whatever the exit code.
    ///
    /// When the timeout elapses the process is left running and
    /// [`EnvironmentError::TimedOut`] is returned.
    pub async fn output(&self, plugin: &str) -> Result<ProcessOutput, EnvironmentError> {
        log::debug!("[{}] running {}", plugin, self);
        let mut command = Command::new(&self.program);
        command.args(&self.args).envs(&self.env).stdin(Stdio::null());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|source| EnvironmentError::Spawn {
                plugin: plugin.to_string(),
                program: self.program_name(),
                source,
            })?,
            Err(_) => {
                log::warn!("[{}] abandoning `{}` after {:?}", plugin, self.program_name(), self.timeout);
                return Err(EnvironmentError::TimedOut {
                    plugin: plugin.to_string(),
                    program: self.program_name(),
                    timeout: self.timeout,
                });
            }
        };

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Like [`Invocation::output`], but a non-zero exit is an error carrying stderr.
    pub async fn run(&self, plugin: &str) -> Result<ProcessOutput, EnvironmentError> {
        let output = self.output(plugin).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(EnvironmentError::Failed {
                plugin: plugin.to_string(),
                program: self.program_name(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
