use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::host::{ChannelId, Host, HostError, WorkerCommand};

/// A host without an editor attached.
///
/// Job control is real: workers are spawned with `tokio::process` and killed
/// on request (or when the host is dropped). Variables live in memory. The
/// RPC primitives report [`HostError::Unsupported`], so plugins can be
/// installed and updated through this host but not activated.
#[derive(Debug, Default)]
pub struct LocalHost {
    next_channel: AtomicU64,
    workers: Mutex<HashMap<ChannelId, Child>>,
    vars: Mutex<HashMap<String, Value>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self {
            next_channel: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Create a host whose variable store starts with `vars`.
    pub fn with_vars(vars: HashMap<String, Value>) -> Self {
        Self {
            next_channel: AtomicU64::new(1),
            workers: Mutex::new(HashMap::new()),
            vars: Mutex::new(vars),
        }
    }

    /// Number of workers currently attached.
    pub async fn worker_count(&self) -> usize {
        self.workers.lock().await.len()
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn spawn(&self, command: &WorkerCommand) -> Result<(ChannelId, u32), HostError> {
        let program = command.program().ok_or_else(|| HostError::Spawn {
            command: command.to_string(),
            message: "empty command line".to_string(),
        })?;

        let mut process = Command::new(program);
        process
            .args(&command.argv[1..])
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            process.current_dir(cwd);
        }

        let mut child = process.spawn().map_err(|e| HostError::Spawn {
            command: command.to_string(),
            message: e.to_string(),
        })?;
        let pid = child.id().ok_or_else(|| HostError::Spawn {
            command: command.to_string(),
            message: "process exited immediately".to_string(),
        })?;
        let channel = self.next_channel.fetch_add(1, Ordering::SeqCst);

        if let Some(stderr) = child.stderr.take() {
            let forward = command.forward_stderr;
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if forward {
                        log::info!("[channel {}] {}", channel, line);
                    } else {
                        log::debug!("[channel {}] {}", channel, line);
                    }
                }
            });
        }

        self.workers.lock().await.insert(channel, child);
        Ok((channel, pid))
    }

    async fn kill(&self, channel: ChannelId) -> Result<(), HostError> {
        let mut child = self
            .workers
            .lock()
            .await
            .remove(&channel)
            .ok_or(HostError::UnknownChannel(channel))?;
        child.kill().await.map_err(|source| HostError::Io {
            operation: format!("kill channel {}", channel),
            source,
        })
    }

    async fn call(&self, _function: &str, _args: Vec<Value>, _timeout: Duration) -> Result<Value, HostError> {
        Err(HostError::Unsupported { operation: "call" })
    }

    async fn call_once_defined(&self, _function: &str, _timeout: Duration) -> Result<Value, HostError> {
        Err(HostError::Unsupported {
            operation: "call_once_defined",
        })
    }

    async fn run_command(&self, _name: &str, _args: &[String]) -> Result<(), HostError> {
        Err(HostError::Unsupported { operation: "run_command" })
    }

    async fn command_exists(&self, _name: &str) -> Result<bool, HostError> {
        Err(HostError::Unsupported {
            operation: "command_exists",
        })
    }

    async fn var(&self, name: &str) -> Result<Option<Value>, HostError> {
        Ok(self.vars.lock().await.get(name).cloned())
    }

    async fn set_var(&self, name: &str, value: Value) -> Result<(), HostError> {
        self.vars.lock().await.insert(name.to_string(), value);
        Ok(())
    }

    async fn load_runtime(&self, path: &str) -> Result<(), HostError> {
        log::debug!("No runtime to load '{}' into", path);
        Ok(())
    }
}
