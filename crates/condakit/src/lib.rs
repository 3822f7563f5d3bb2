//! # condakit
//!
//! Pure Rust library for reconciling conda environments against a desired
//! state.
//!
//! This crate provides functionality for:
//! - Locating the conda executable
//! - Detecting whether an environment exists
//! - Installing, updating and removing packages, creating the environment
//!   when it is missing
//! - Reporting whether conda actually changed anything
//!
//! ## Example
//!
//! ```no_run
//! use condakit::{DesiredState, PackageState, Settings};
//!
//! let desired = DesiredState::new(["python=3.11", "flask"], PackageState::Present)
//!     .with_settings(Settings::new("myapp").with_channel("conda-forge"));
//!
//! let result = condakit::reconcile(&desired).expect("reconcile failed");
//! println!("changed: {} ({})", result.changed, result.command_line());
//! ```
//!
//! ## Testing
//!
//! Every process goes through a [`backend::Runner`]. Use
//! [`backend::stub::StubRunner`] with [`Client::with_runner`] to exercise the
//! reconciler without conda installed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod discovery;
pub mod error;
pub mod specifier;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{
    DesiredState, EnvSelector, InstalledPackage, InvocationResult, PackageState, RawOutput,
    Settings, Subcommand,
};

use backend::Runner;
use std::path::{Path, PathBuf};

/// Flags passed to every conda invocation.
const OUTPUT_FLAGS: [&str; 2] = ["--quiet", "--json"];

/// Whether a conda JSON response reports any change.
///
/// conda lists what it did under `actions`; an "already installed"
/// acknowledgement has no such key. Only the presence of the key counts,
/// an empty `actions` object is still a change.
pub fn changed(stdout_json: &serde_json::Value) -> bool {
    stdout_json.get("actions").is_some()
}

/// Bring an environment to the desired state with the real conda.
pub fn reconcile(desired: &DesiredState) -> Result<InvocationResult> {
    Client::new(&desired.settings)?.ensure(desired.state, &desired.packages)
}

/// Per-invocation switches.
#[derive(Debug, Clone, Copy)]
struct RunOptions {
    /// Raise [`Error::CommandFailed`] on a non-zero exit code
    fail_on_error: bool,
    /// Merge the client's default arguments
    add_default_args: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fail_on_error: true,
            add_default_args: true,
        }
    }
}

/// Reconciler for one conda environment.
///
/// The client resolves the executable once and builds the arguments shared
/// by every mutating call. It keeps no state between calls: each operation
/// asks conda afresh.
pub struct Client {
    runner: Box<dyn Runner>,
    executable: PathBuf,
    env: EnvSelector,
    default_args: Vec<String>,
}

impl Client {
    /// Create a client that runs real conda processes.
    ///
    /// Returns an error if no executable is given and conda cannot be found.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_runner(settings, Box::new(backend::default_runner()))
    }

    /// Create a client with a custom runner (useful for testing).
    pub fn with_runner(settings: &Settings, runner: Box<dyn Runner>) -> Result<Self> {
        let executable = discovery::resolve(settings.executable.as_deref())?;
        let env = EnvSelector::from_identifier(&settings.environment);

        let mut default_args = vec!["-y".to_string()];
        default_args.extend(env.args());
        for channel in &settings.channels {
            default_args.push("--channel".to_string());
            default_args.push(channel.clone());
        }
        if settings.dry_run {
            default_args.push("--dry-run".to_string());
        }

        Ok(Self {
            runner,
            executable,
            env,
            default_args,
        })
    }

    /// Path of the conda executable in use.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The environment selector.
    pub fn env(&self) -> &EnvSelector {
        &self.env
    }

    /// Arguments merged into every mutating invocation.
    pub fn default_args(&self) -> &[String] {
        &self.default_args
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check whether the environment exists.
    ///
    /// Runs `conda list` against the environment; any non-zero exit code
    /// means it does not exist.
    pub fn env_exists(&self) -> Result<bool> {
        // Tolerated failure: unparsable stdout on a non-zero exit still means "absent"
        let result = self.run_conda(
            Subcommand::List,
            &self.env.args(),
            RunOptions {
                fail_on_error: false,
                add_default_args: false,
            },
        )?;
        Ok(result.rc == 0)
    }

    /// List the packages installed in the environment.
    pub fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let result = self.run_conda(
            Subcommand::List,
            &self.env.args(),
            RunOptions {
                fail_on_error: true,
                add_default_args: false,
            },
        )?;
        serde_json::from_value(result.stdout_json).map_err(|e| Error::UnexpectedOutput {
            cmd: result.cmd,
            message: format!("expected a list of package records: {e}"),
        })
    }

    /// Names of the packages installed in the environment, as conda reports them.
    pub fn list_packages(&self) -> Result<Vec<String>> {
        Ok(self
            .list_installed()?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    // =========================================================================
    // Package Operations
    // =========================================================================

    /// Install packages into the existing environment.
    pub fn install<S: AsRef<str>>(&self, packages: &[S]) -> Result<InvocationResult> {
        let mut args = vec!["-S".to_string()];
        args.extend(to_args(packages));
        self.run_conda(Subcommand::Install, &args, RunOptions::default())
    }

    /// Update packages in the existing environment.
    pub fn update<S: AsRef<str>>(&self, packages: &[S]) -> Result<InvocationResult> {
        self.run_conda(Subcommand::Update, &to_args(packages), RunOptions::default())
    }

    /// Create the environment with the given packages.
    pub fn create<S: AsRef<str>>(&self, packages: &[S]) -> Result<InvocationResult> {
        self.run_conda(Subcommand::Create, &to_args(packages), RunOptions::default())
    }

    /// Remove packages from the environment.
    ///
    /// Only the requested packages that are installed are passed to conda,
    /// by bare name. When none are installed nothing runs and an unchanged
    /// result is returned.
    pub fn remove<S: AsRef<str>>(&self, packages: &[S]) -> Result<InvocationResult> {
        let installed = self.list_packages()?;
        let to_remove = specifier::removal_set(packages, &installed);
        if to_remove.is_empty() {
            log::info!(
                "None of the requested packages are installed in {}",
                self.env.value()
            );
            return Ok(InvocationResult::unchanged());
        }
        self.run_conda(Subcommand::Remove, &to_remove, RunOptions::default())
    }

    /// Bring the packages to the given state.
    ///
    /// `present` and `latest` create the environment when it does not
    /// exist; `absent` never checks for it.
    pub fn ensure<S: AsRef<str>>(
        &self,
        state: PackageState,
        packages: &[S],
    ) -> Result<InvocationResult> {
        match state {
            PackageState::Present => {
                if self.env_exists()? {
                    self.install(packages)
                } else {
                    self.create(packages)
                }
            }
            PackageState::Latest => {
                if self.env_exists()? {
                    self.update(packages)
                } else {
                    self.create(packages)
                }
            }
            PackageState::Absent => self.remove(packages),
        }
    }

    // =========================================================================
    // Invocation
    // =========================================================================

    fn build_command(
        &self,
        subcommand: Subcommand,
        args: &[String],
        opts: RunOptions,
    ) -> Vec<String> {
        let mut cmd = vec![
            self.executable.to_string_lossy().to_string(),
            subcommand.as_str().to_string(),
        ];
        cmd.extend(OUTPUT_FLAGS.iter().map(|f| (*f).to_string()));
        if opts.add_default_args {
            cmd.extend(self.default_args.iter().cloned());
        }
        cmd.extend(args.iter().cloned());
        cmd
    }

    fn run_conda(
        &self,
        subcommand: Subcommand,
        args: &[String],
        opts: RunOptions,
    ) -> Result<InvocationResult> {
        let cmd = self.build_command(subcommand, args, opts);
        log::debug!("conda {subcommand}: {}", cmd.join(" "));

        let output = self.runner.run(&cmd)?;
        if !output.success() {
            if opts.fail_on_error {
                return Err(Error::CommandFailed {
                    cmd,
                    rc: output.rc,
                    stdout: output.stdout,
                    stderr: output.stderr,
                });
            }
            log::debug!("conda {subcommand} exited with {} (tolerated)", output.rc);
        }

        let stdout_json: serde_json::Value = match serde_json::from_str(&output.stdout) {
            Ok(json) => json,
            // A tolerated failure is judged by its exit code alone
            Err(_) if !output.success() => serde_json::Value::Object(serde_json::Map::new()),
            Err(source) => {
                return Err(Error::OutputParse {
                    cmd,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    source,
                });
            }
        };

        Ok(InvocationResult {
            changed: changed(&stdout_json),
            cmd,
            rc: output.rc,
            stdout_json,
            stderr: output.stderr,
        })
    }
}

fn to_args<S: AsRef<str>>(packages: &[S]) -> Vec<String> {
    packages.iter().map(|p| p.as_ref().to_string()).collect()
}
