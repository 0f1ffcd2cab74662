//! Per-execution console capture.
//!
//! Every run gets its own [`ConsoleSink`]; executors write into the handle they were
//! given instead of swapping a process-wide channel, so leaving the scope (normally,
//! through an error, or by unwinding) has nothing to restore and nested captures never
//! see each other's lines.

use std::sync::{Arc, Mutex, PoisonError};

/// Append-only line buffer shared between the capture scope and an executor
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    pub(crate) fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Lines collected during one execution, in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    lines: Vec<String>,
}

impl CapturedOutput {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with a single newline, `None` when nothing was emitted
    pub fn into_text(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.lines.join("\n"))
        }
    }
}

/// Run `f` against a fresh sink and hand back its result with everything it emitted.
///
/// The sink is drained when `f` returns; clones kept by `f` past that point write into
/// a buffer nobody reads.
pub fn with_capture<T>(f: impl FnOnce(&ConsoleSink) -> T) -> (T, CapturedOutput) {
    let sink = ConsoleSink::new();
    let value = f(&sink);
    let lines = sink.take();
    (value, CapturedOutput { lines })
}
