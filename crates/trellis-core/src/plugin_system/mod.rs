//! # Trellis Plugin Spec Model
//!
//! Represents what a plugin is and how it gets installed.
//!
//! - **[`spec`]**: [`PluginSpec`], the closed [`InstallMethod`] union and the
//!   `<kind>:<payload>` grammar implemented by [`parse_spec`].
//! - **[`descriptor`]**: [`PluginDescriptor`], one validated configuration
//!   entry, converted into a [`PluginSpec`].
pub mod descriptor;
pub mod spec;

pub use descriptor::{PluginDescriptor, check_plugin_name, spec_from_config};
pub use spec::{InstallMethod, PluginOptions, PluginSpec, camel_case, is_plain_name, parse_spec, requirement_key};

// Test module declaration
#[cfg(test)]
mod tests;
