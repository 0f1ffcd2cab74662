//! Language-specific executor implementations

mod javascript;
mod python;

pub use javascript::JavaScriptExecutor;
pub use python::{PythonLoader, PythonProcess};

use crate::{capture::ConsoleSink, error::Error};

/// In-process evaluation of source text.
///
/// Implementations report everything the program prints through `console` and return
/// `Error::Interpreter` with the program's own error message when it raises.
pub trait NativeExecutor: Send + Sync {
    fn execute(&self, code: &str, console: &ConsoleSink) -> Result<(), Error>;
}

#[cfg(test)]
pub(crate) fn skip_if_not_available(tools: &[&str]) -> bool {
    use which::which;

    let missing: Vec<_> = tools
        .iter()
        .filter(|tool| which(**tool).is_err())
        .map(|s| (*s).to_string())
        .collect();

    if !missing.is_empty() {
        eprintln!("Skipping test: {} not available", missing.join(", "));
        return true;
    }
    false
}
