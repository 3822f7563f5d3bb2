//! Core types for conda environment reconciliation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment used when none is given.
pub const DEFAULT_ENVIRONMENT: &str = "base";

/// Target lifecycle state for a set of packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PackageState {
    /// Packages are installed (at the pinned version, if any)
    #[default]
    Present,
    /// Packages are updated to the newest available version
    Latest,
    /// Packages are not installed
    Absent,
}

impl PackageState {
    /// Lowercase name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageState::Present => "present",
            PackageState::Latest => "latest",
            PackageState::Absent => "absent",
        }
    }
}

impl std::fmt::Display for PackageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conda subcommands used by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    /// `conda list`
    List,
    /// `conda install`
    Install,
    /// `conda update`
    Update,
    /// `conda create`
    Create,
    /// `conda remove`
    Remove,
}

impl Subcommand {
    /// Name passed on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcommand::List => "list",
            Subcommand::Install => "install",
            Subcommand::Update => "update",
            Subcommand::Create => "create",
            Subcommand::Remove => "remove",
        }
    }
}

impl std::fmt::Display for Subcommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an environment is addressed on the conda command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSelector {
    /// `--name <env>`
    Name(String),
    /// `--prefix <path>`
    Prefix(String),
}

impl EnvSelector {
    /// Pick `--prefix` when the identifier contains a path separator, `--name` otherwise.
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier.contains(std::path::is_separator) {
            EnvSelector::Prefix(identifier.to_string())
        } else {
            EnvSelector::Name(identifier.to_string())
        }
    }

    /// The flag selecting the environment.
    pub fn flag(&self) -> &'static str {
        match self {
            EnvSelector::Name(_) => "--name",
            EnvSelector::Prefix(_) => "--prefix",
        }
    }

    /// The environment identifier as given.
    pub fn value(&self) -> &str {
        match self {
            EnvSelector::Name(v) | EnvSelector::Prefix(v) => v,
        }
    }

    /// The flag/value pair.
    pub fn args(&self) -> Vec<String> {
        vec![self.flag().to_string(), self.value().to_string()]
    }
}

/// Environment-level settings shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Environment name or filesystem path
    pub environment: String,
    /// Explicit path to the conda executable
    pub executable: Option<PathBuf>,
    /// Extra channels, in priority order
    pub channels: Vec<String>,
    /// Ask conda to only report what it would do
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            executable: None,
            channels: Vec::new(),
            dry_run: false,
        }
    }
}

impl Settings {
    /// Settings targeting the given environment.
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            ..Self::default()
        }
    }

    /// Use an explicit conda executable.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Add an extra channel.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.push(channel.into());
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// A requested package environment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    /// Package names or specifiers like `flask=1.0`
    pub packages: Vec<String>,
    /// Target state of the packages
    pub state: PackageState,
    /// Environment settings
    pub settings: Settings,
}

impl DesiredState {
    /// Packages in the given state within the default environment.
    pub fn new<I, S>(packages: I, state: PackageState) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
            state,
            settings: Settings::default(),
        }
    }

    /// Replace the environment settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

/// Captured output of one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    /// Exit code, `-1` when the process was killed by a signal
    pub rc: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl RawOutput {
    /// Build an output record.
    pub fn new(rc: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            rc,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with code zero.
    pub fn success(&self) -> bool {
        self.rc == 0
    }
}

/// Outcome of one conda invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResult {
    /// Whether conda reported any actions
    pub changed: bool,
    /// The exact argument vector executed (empty if nothing ran)
    pub cmd: Vec<String>,
    /// Process exit code
    pub rc: i32,
    /// Parsed JSON output
    pub stdout_json: serde_json::Value,
    /// Raw standard error
    pub stderr: String,
}

impl InvocationResult {
    /// Result for an operation that had nothing to do and ran no command.
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            cmd: Vec::new(),
            rc: 0,
            stdout_json: serde_json::Value::Object(serde_json::Map::new()),
            stderr: String::new(),
        }
    }

    /// The command line as a single display string.
    pub fn command_line(&self) -> String {
        self.cmd.join(" ")
    }
}

/// A package record as reported by `conda list --json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstalledPackage {
    /// Package name
    pub name: String,
    /// Installed version
    #[serde(default)]
    pub version: Option<String>,
    /// Channel the package came from
    #[serde(default)]
    pub channel: Option<String>,
    /// Build string
    #[serde(default)]
    pub build_string: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_selector_name_or_prefix() {
        assert_eq!(
            EnvSelector::from_identifier("myenv").args(),
            vec!["--name", "myenv"]
        );
        assert_eq!(
            EnvSelector::from_identifier("./myenv").args(),
            vec!["--prefix", "./myenv"]
        );
        assert_eq!(
            EnvSelector::from_identifier("/opt/conda/envs/foo").args(),
            vec!["--prefix", "/opt/conda/envs/foo"]
        );
    }

    #[test]
    fn test_package_state_display() {
        assert_eq!(PackageState::default(), PackageState::Present);
        assert_eq!(PackageState::Absent.to_string(), "absent");
    }

    #[test]
    fn test_settings_default_environment() {
        let settings = Settings::default();
        assert_eq!(settings.environment, "base");
        assert!(settings.executable.is_none());
        assert!(settings.channels.is_empty());
        assert!(!settings.dry_run);
    }

    #[test]
    fn test_unchanged_result() {
        let result = InvocationResult::unchanged();
        assert!(!result.changed);
        assert!(result.cmd.is_empty());
        assert_eq!(result.rc, 0);
        assert_eq!(result.stdout_json, serde_json::json!({}));
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn test_installed_package_tolerates_missing_fields() {
        let pkg: InstalledPackage = serde_json::from_str(r#"{"name": "click"}"#).unwrap();
        assert_eq!(pkg.name, "click");
        assert!(pkg.version.is_none());
    }
}
