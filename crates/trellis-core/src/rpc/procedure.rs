use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::host::ChannelId;
use crate::rpc::error::RegistrationError;

/// What a remote procedure is bound to in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Command,
    Function,
    Autocmd,
}

/// One procedure a worker asks the host to expose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcProcedure {
    #[serde(alias = "method")]
    pub kind: ProcedureKind,
    /// Command or function name, or event name for autocmds
    pub name: String,
    #[serde(default)]
    pub sync: bool,
    /// Autocmd group; the plugin prefix when absent
    #[serde(default)]
    pub group: Option<String>,
    /// Definition options (`nargs`, `range`, `pattern`, ...)
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// A host command line: the command name and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub name: String,
    pub args: Vec<String>,
}

impl HostCommand {
    fn new<I, S>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

impl RpcProcedure {
    pub fn decode(plugin: &str, value: &Value) -> Result<Self, RegistrationError> {
        serde_json::from_value(value.clone()).map_err(|e| RegistrationError::Malformed {
            plugin: plugin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Autocmd file pattern, `*` unless given
    pub fn pattern(&self) -> &str {
        self.options.get("pattern").and_then(Value::as_str).unwrap_or("*")
    }

    /// Command binding this procedure to `channel`.
    pub fn define_command(&self, channel: ChannelId) -> HostCommand {
        let definer = match self.kind {
            ProcedureKind::Command => "CommandOnChannel",
            ProcedureKind::Function => "FunctionOnChannel",
            ProcedureKind::Autocmd => "AutocmdOnChannel",
        };
        let options = Value::Object(self.options.clone());
        let call = match self.kind {
            ProcedureKind::Function => format!(
                "remote#define#{}({}, '{}', {}, 0, {})",
                definer, channel, self.name, self.sync as u8, options
            ),
            ProcedureKind::Command | ProcedureKind::Autocmd => format!(
                "remote#define#{}({}, '{}', {}, {})",
                definer, channel, self.name, self.sync as u8, options
            ),
        };
        HostCommand::new("call", [call])
    }

    /// Command removing this procedure from the host.
    pub fn undefine_command(&self, default_group: &str) -> HostCommand {
        match self.kind {
            ProcedureKind::Command => HostCommand::new("delcommand", [self.name.as_str()]),
            ProcedureKind::Function => HostCommand::new("delfunction", [self.name.as_str()]),
            ProcedureKind::Autocmd => HostCommand::new(
                "autocmd!",
                [
                    self.group.as_deref().unwrap_or(default_group),
                    self.name.as_str(),
                    self.pattern(),
                ],
            ),
        }
    }
}

/// Decode the answer of `<Prefix>RpcHandlers`.
///
/// The worker may answer a list or a JSON string holding one. Malformed
/// entries are returned as errors next to the valid procedures.
pub fn decode_procedures(plugin: &str, value: &Value) -> Result<(Vec<RpcProcedure>, Vec<RegistrationError>), RegistrationError> {
    let parsed;
    let list = match value {
        Value::Array(items) => items,
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text).map_err(|e| RegistrationError::Malformed {
                plugin: plugin.to_string(),
                reason: e.to_string(),
            })?;
            parsed.as_array().ok_or_else(|| RegistrationError::Malformed {
                plugin: plugin.to_string(),
                reason: "handler list is not an array".to_string(),
            })?
        }
        Value::Null => return Ok((Vec::new(), Vec::new())),
        other => {
            return Err(RegistrationError::Malformed {
                plugin: plugin.to_string(),
                reason: format!("expected a handler list, got {}", other),
            });
        }
    };

    let mut procedures = Vec::new();
    let mut errors = Vec::new();
    for item in list {
        match RpcProcedure::decode(plugin, item) {
            Ok(procedure) => procedures.push(procedure),
            Err(e) => errors.push(e),
        }
    }
    Ok((procedures, errors))
}

/// A procedure defined in the host, bound to the worker's channel
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredProcedure {
    pub procedure: RpcProcedure,
    pub channel: ChannelId,
}
