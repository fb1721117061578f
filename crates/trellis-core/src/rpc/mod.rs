//! # Trellis RPC Registration Bridge
//!
//! A worker announces the commands, functions and autocmds it serves through
//! `<Prefix>RpcHandlers`. The bridge defines them in the host bound to the
//! worker's channel, and removes them again when the worker goes away.
pub mod bridge;
pub mod error;
pub mod procedure;

pub use bridge::{ProcedureQuery, RpcBridge, Teardown};
pub use error::RegistrationError;
pub use procedure::{HostCommand, ProcedureKind, RegisteredProcedure, RpcProcedure, decode_procedures};
