//! # Trellis Core Kernel
//!
//! Shared foundations for every other module: the aggregated [`Error`] type
//! with its `Result` alias, and the system-wide constants (names, defaults,
//! timeouts) in [`constants`].
pub mod constants;
pub mod error;

pub use error::{Error, Result};
