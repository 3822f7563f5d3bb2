//! Error types for conda operations.
//!
//! Every failure is fatal to the operation that raised it. Errors carry
//! the command line, exit code and both output streams where they exist,
//! so a failure can be diagnosed without re-running it.

use thiserror::Error;

/// Categories of conda errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The conda executable could not be located
    ToolNotFound,
    /// conda ran and exited with a non-zero code
    ToolFailure,
    /// conda output was not the expected JSON document
    Output,
    /// The process could not be started
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ToolNotFound => "conda not installed",
            Self::ToolFailure => "conda command failed",
            Self::Output => "Unreadable conda output",
            Self::Io => "Could not run conda",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::ToolNotFound => {
                "Install conda, add it to PATH, or pass the executable path explicitly"
            }
            Self::ToolFailure => "Check the conda error output above",
            Self::Output => "Make sure the executable is conda 4.6 or newer",
            Self::Io => "Check that the executable exists and is runnable",
        }
    }
}

/// Errors that can occur while reconciling a conda environment.
#[derive(Debug, Error)]
pub enum Error {
    /// conda was not given and not found on the search path
    #[error("conda executable not found (searched: {searched})")]
    ToolNotFound {
        /// The directories that were searched
        searched: String,
    },

    /// A fail-fast invocation exited with a non-zero code
    #[error("command failed with exit code {rc}: {}", .cmd.join(" "))]
    CommandFailed {
        /// The argument vector that was executed
        cmd: Vec<String>,
        /// Exit code
        rc: i32,
        /// Standard output
        stdout: String,
        /// Standard error
        stderr: String,
    },

    /// Standard output was not valid JSON
    #[error("failed to parse the output of the command: {}", .cmd.join(" "))]
    OutputParse {
        /// The argument vector that was executed
        cmd: Vec<String>,
        /// Standard output
        stdout: String,
        /// Standard error
        stderr: String,
        /// The JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON with an unexpected shape
    #[error("unexpected output from {}: {message}", .cmd.join(" "))]
    UnexpectedOutput {
        /// The argument vector that was executed
        cmd: Vec<String>,
        /// What was wrong with the output
        message: String,
    },

    /// The process could not be started
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program that was run
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ToolNotFound { .. } => ErrorCategory::ToolNotFound,
            Error::CommandFailed { .. } => ErrorCategory::ToolFailure,
            Error::OutputParse { .. } | Error::UnexpectedOutput { .. } => ErrorCategory::Output,
            Error::Spawn { .. } => ErrorCategory::Io,
        }
    }

    /// The command line involved, if any.
    pub fn cmd(&self) -> Option<&[String]> {
        match self {
            Error::CommandFailed { cmd, .. }
            | Error::OutputParse { cmd, .. }
            | Error::UnexpectedOutput { cmd, .. } => Some(cmd),
            _ => None,
        }
    }

    /// Exit code of the failed command, if it ran to completion.
    pub fn rc(&self) -> Option<i32> {
        match self {
            Error::CommandFailed { rc, .. } => Some(*rc),
            _ => None,
        }
    }

    /// Captured standard output and standard error, if any.
    pub fn streams(&self) -> Option<(&str, &str)> {
        match self {
            Error::CommandFailed { stdout, stderr, .. }
            | Error::OutputParse { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }

    /// The diagnostic conda embeds in its JSON error document.
    ///
    /// With `--json`, conda reports failures on stdout as an object with
    /// `exception_name` and `message` (older releases use `error`).
    pub fn tool_message(&self) -> Option<String> {
        let Error::CommandFailed { stdout, .. } = self else {
            return None;
        };
        let json: serde_json::Value = serde_json::from_str(stdout).ok()?;
        let message = json["message"]
            .as_str()
            .or_else(|| json["error"].as_str())?
            .trim();
        match json["exception_name"].as_str() {
            Some(name) if !message.starts_with(name) => Some(format!("{name}: {message}")),
            _ => Some(message.to_string()),
        }
    }
}

/// Result type for conda operations.
pub type Result<T> = std::result::Result<T, Error>;
