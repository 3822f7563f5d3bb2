//! Recording runner for tests.

use crate::backend::Runner;
use crate::error::Result;
use crate::types::RawOutput;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Runner that records every argument vector and replays canned outputs.
///
/// Outputs are returned in the order they were queued; once the queue is
/// empty every call succeeds with `{}` on stdout. Clones share state, so a
/// test can keep a handle after boxing one into a [`crate::Client`].
#[derive(Debug, Clone, Default)]
pub struct StubRunner {
    responses: Arc<Mutex<VecDeque<RawOutput>>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl StubRunner {
    /// Create a stub with no queued outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an output for the next unanswered call.
    pub fn push(&self, rc: i32, stdout: impl Into<String>, stderr: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(RawOutput::new(rc, stdout, stderr));
    }

    /// Queue an output, builder style.
    pub fn with_response(
        self,
        rc: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.push(rc, stdout, stderr);
        self
    }

    /// Every argument vector run so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Runner for StubRunner {
    fn run(&self, argv: &[String]) -> Result<RawOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(argv.to_vec());
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(next.unwrap_or_else(|| RawOutput::new(0, "{}", "")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order_then_defaults() {
        let stub = StubRunner::new()
            .with_response(1, "[]", "first")
            .with_response(2, "{}", "second");
        let argv = vec!["conda".to_string()];

        assert_eq!(stub.run(&argv).unwrap().stderr, "first");
        assert_eq!(stub.run(&argv).unwrap().rc, 2);
        assert_eq!(stub.run(&argv).unwrap(), RawOutput::new(0, "{}", ""));
        assert_eq!(stub.call_count(), 3);
    }

    #[test]
    fn test_clones_share_calls() {
        let stub = StubRunner::new();
        let handle = stub.clone();
        stub.run(&["conda".to_string(), "list".to_string()]).unwrap();
        assert_eq!(handle.calls(), vec![vec!["conda", "list"]]);
    }
}
