//! Subprocess-backed runner.

use crate::backend::Runner;
use crate::error::{Error, Result};
use crate::types::RawOutput;
use std::process::Command;

/// Runner that executes real processes and waits for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new ProcessRunner.
    pub fn new() -> Self {
        Self
    }
}

impl Runner for ProcessRunner {
    fn run(&self, argv: &[String]) -> Result<RawOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::Spawn {
                program: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;

        // No exit code means the process was terminated by a signal
        let rc = output.status.code().unwrap_or(-1);
        log::debug!("{program} exited with {rc}");

        Ok(RawOutput {
            rc,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_captures_streams_and_code() {
        let out = ProcessRunner::new()
            .run(&argv(&["sh", "-c", "echo '{}'; echo oops >&2; exit 3"]))
            .unwrap();
        assert_eq!(out.rc, 3);
        assert_eq!(out.stdout.trim(), "{}");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = ProcessRunner::new()
            .run(&argv(&["/nonexistent/condakit-test-binary"]))
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn test_empty_argv() {
        assert!(ProcessRunner::new().run(&[]).is_err());
    }
}
