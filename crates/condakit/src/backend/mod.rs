//! Process abstraction for conda invocations.
//!
//! The [`Runner`] trait is the single seam between the reconciler and the
//! operating system, allowing for different implementations (real
//! subprocess, recording stub for testing).

pub mod process;
pub mod stub;

use crate::error::Result;
use crate::types::RawOutput;

/// Runs one external command to completion.
///
/// `argv[0]` is the program, the rest are its arguments. Implementations
/// return the exit code and both streams whatever the exit code is; only a
/// failure to start the process is an error.
pub trait Runner: Send + Sync {
    /// Run the argument vector and capture its output.
    fn run(&self, argv: &[String]) -> Result<RawOutput>;
}

/// Get the default runner (real subprocesses).
pub fn default_runner() -> process::ProcessRunner {
    process::ProcessRunner::new()
}
