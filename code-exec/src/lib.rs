//! # Code Execution
//!
//! Runs source text from an interactive session and turns the result into one display
//! string. JavaScript is evaluated in-process by an embedded engine, with everything the
//! program prints captured per run; Python is delegated to a long-lived interpreter whose
//! asynchronous start-up is tracked by a readiness state machine.
//!
//! ```rust,no_run
//! use code_exec::{CodeExecutionService, ExecConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), code_exec::Error> {
//!     let service = CodeExecutionService::new(ExecConfig::default()).await?;
//!     println!("{}", service.run("javascript", "console.log('hi')").await);
//!     Ok(())
//! }
//! ```

mod capture;
mod config;
mod error;
mod executor;
mod format;
mod languages;
mod registry;
mod runtime;
mod service;
mod types;

pub use capture::{with_capture, CapturedOutput, ConsoleSink};
pub use config::{ExecConfig, Messages, PythonConfig};
pub use error::Error;
pub use executor::ExecutionDispatcher;
pub use format::ResultFormatter;
pub use languages::{JavaScriptExecutor, NativeExecutor, PythonLoader, PythonProcess};
pub use registry::RuntimeRegistry;
pub use runtime::{HostedRuntimeManager, Interpreter, InterpreterLoader, ReadyHandle};
pub use service::CodeExecutionService;
pub use types::{
    ErrorKind, ExecutionOutcome, ExecutionRequest, LanguageId, RuntimeReadiness, Strategy,
};

/// Result type for code execution operations
pub type Result<T> = std::result::Result<T, Error>;
