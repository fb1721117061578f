use std::fmt;
use std::path::{Component, Path};

/// How a plugin gets installed, and therefore how it is health-checked and
/// activated.
///
/// Every operation that depends on the variant matches on it exhaustively, so
/// adding a variant forces each of them to decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstallMethod {
    /// A requirement string handed to the package installer (`name==1.0`)
    Distribution(String),
    /// A local project directory with a requirements manifest
    Directory(String),
    /// A module importable by the global interpreter, nothing to install
    Site(String),
    /// A Haskell package installed with cabal from Hackage
    Hackage(String),
    /// A Haskell package installed with stack from Stackage
    Stackage(String),
    /// A local stack project directory
    StackProject(String),
}

impl InstallMethod {
    /// Construct a variant from a spec prefix. Unknown prefixes yield `None`.
    pub fn from_kind(kind: &str, payload: &str) -> Option<Self> {
        let payload = payload.to_string();
        match kind {
            "venv" | "dist" => Some(InstallMethod::Distribution(payload)),
            "dir" => Some(InstallMethod::Directory(payload)),
            "site" => Some(InstallMethod::Site(payload)),
            "hackage" => Some(InstallMethod::Hackage(payload)),
            "stackage" => Some(InstallMethod::Stackage(payload)),
            "stack" => Some(InstallMethod::StackProject(payload)),
            _ => None,
        }
    }

    /// Canonical spec prefix of this variant
    pub fn kind(&self) -> &'static str {
        match self {
            InstallMethod::Distribution(_) => "dist",
            InstallMethod::Directory(_) => "dir",
            InstallMethod::Site(_) => "site",
            InstallMethod::Hackage(_) => "hackage",
            InstallMethod::Stackage(_) => "stackage",
            InstallMethod::StackProject(_) => "stack",
        }
    }

    /// The part of the spec after the prefix
    pub fn payload(&self) -> &str {
        match self {
            InstallMethod::Distribution(p)
            | InstallMethod::Directory(p)
            | InstallMethod::Site(p)
            | InstallMethod::Hackage(p)
            | InstallMethod::Stackage(p)
            | InstallMethod::StackProject(p) => p,
        }
    }

    /// Whether the worker runs inside a python interpreter
    pub fn is_python(&self) -> bool {
        match self {
            InstallMethod::Distribution(_) | InstallMethod::Directory(_) | InstallMethod::Site(_) => true,
            InstallMethod::Hackage(_) | InstallMethod::Stackage(_) | InstallMethod::StackProject(_) => false,
        }
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.payload())
    }
}

/// Per-plugin options from the descriptor or `add_plugin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOptions {
    /// Run the worker in debug mode; `None` defers to the global setting
    pub debug: Option<bool>,
    /// Extra entries for the worker's module search path
    pub search_paths: Vec<String>,
    /// Interpreter used to create this plugin's environment
    pub interpreter: Option<String>,
    /// Appended to the installer's command line
    pub extra_install_args: Vec<String>,
    /// Whether startup waits for this plugin
    pub track: bool,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            debug: None,
            search_paths: Vec::new(),
            interpreter: None,
            extra_install_args: Vec::new(),
            track: true,
        }
    }
}

/// A configured plugin. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSpec {
    name: String,
    method: InstallMethod,
    options: PluginOptions,
}

impl PluginSpec {
    pub fn new(name: impl Into<String>, method: InstallMethod, options: PluginOptions) -> Self {
        Self {
            name: name.into(),
            method,
            options,
        }
    }

    /// A distribution plugin whose requirement is its own name.
    pub fn simple(name: &str) -> Self {
        Self::new(name, InstallMethod::Distribution(name.to_string()), PluginOptions::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &InstallMethod {
        &self.method
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Replace the options, keeping name and install method.
    pub fn with_options(self, options: PluginOptions) -> Self {
        Self { options, ..self }
    }

    /// Prefix of the functions and commands the worker defines in the host.
    pub fn prefix(&self) -> String {
        camel_case(&self.name)
    }

    /// Python module the worker imports for directory plugins.
    pub fn module_name(&self) -> String {
        match &self.method {
            InstallMethod::Site(module) => module.clone(),
            _ => self.name.replace('-', "_"),
        }
    }
}

impl fmt::Display for PluginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.method)
    }
}

/// Parse `<kind>:<payload>` into a spec named `name`.
///
/// Never fails: a missing or unknown prefix makes the whole string a
/// distribution requirement, so `git+https://host/repo` stays intact.
pub fn parse_spec(name: &str, raw: &str) -> PluginSpec {
    let method = raw
        .split_once(':')
        .and_then(|(kind, payload)| InstallMethod::from_kind(kind, payload))
        .unwrap_or_else(|| InstallMethod::Distribution(raw.to_string()));
    PluginSpec::new(name, method, PluginOptions::default())
}

/// Normalized project name of a requirement string (`Foo_Bar>=1.0` -> `foo-bar`).
pub fn requirement_key(requirement: &str) -> String {
    let requirement = match requirement.split_once("#egg=") {
        Some((_, egg)) => egg,
        None => requirement,
    };
    let end = requirement
        .find(|c: char| "<>=!~;[ @(".contains(c))
        .unwrap_or(requirement.len());
    requirement[..end]
        .trim()
        .to_lowercase()
        .replace(['_', '.'], "-")
}

/// `my-plugin` -> `MyPlugin`
pub fn camel_case(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Whether `name` is a single normal path component, so that the plugin's
/// environment directory stays directly under the environment root.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
