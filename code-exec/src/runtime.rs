//! Lifecycle of the hosted interpreter.
//!
//! ```text
//! Uninitialized --begin()--> Loading --ok--> Ready --interpreter lost--> Failed(reason)
//!                                    \--err--> Failed(reason)
//! ```
//!
//! The authoritative state lives in a `watch` channel. Only the caller that moves it out
//! of `Uninitialized` spawns the initialization task, so at most one initialization ever
//! runs. `Failed` is final: a runtime that dies after loading is never restarted.

use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

use crate::{
    error::Error,
    types::{ErrorKind, ExecutionOutcome, RuntimeReadiness},
};

/// Produces a fresh interpreter instance, the expensive first step of initialization
#[async_trait]
pub trait InterpreterLoader: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn Interpreter>, Error>;
}

/// A live interpreter. Calls are serialized by the manager.
#[async_trait]
pub trait Interpreter: Send {
    /// Make packages importable before the first user run
    async fn load_packages(&mut self, packages: &[String]) -> Result<(), Error>;

    /// Run source text. `Ok(None)` means the program produced no value.
    /// A fault in the user's program is `Error::Interpreter` carrying its message.
    /// Any other error means the interpreter itself is gone.
    async fn run(&mut self, code: &str) -> Result<Option<String>, Error>;
}

/// Access to the initialized interpreter
#[derive(Clone)]
pub struct ReadyHandle {
    interpreter: Arc<Mutex<Box<dyn Interpreter>>>,
}

impl ReadyHandle {
    fn new(interpreter: Box<dyn Interpreter>) -> Self {
        Self {
            interpreter: Arc::new(Mutex::new(interpreter)),
        }
    }
}

struct Inner {
    loader: Arc<dyn InterpreterLoader>,
    packages: Vec<String>,
    state: watch::Sender<RuntimeReadiness>,
    handle: OnceLock<ReadyHandle>,
}

impl Inner {
    async fn initialize(&self) {
        match self.load().await {
            Ok(interpreter) => {
                // The handle must exist before anyone can observe Ready.
                let _ = self.handle.set(ReadyHandle::new(interpreter));
                self.state.send_replace(RuntimeReadiness::Ready);
                info!("Hosted runtime ready");
            }
            Err(e) => {
                error!("Hosted runtime failed to load: {}", e);
                self.state.send_replace(RuntimeReadiness::Failed(e.to_string()));
            }
        }
    }

    async fn load(&self) -> Result<Box<dyn Interpreter>, Error> {
        let mut interpreter = self.loader.acquire().await?;
        debug!("Interpreter acquired");

        if !self.packages.is_empty() {
            interpreter.load_packages(&self.packages).await?;
            debug!("Loaded packages: {:?}", self.packages);
        }
        Ok(interpreter)
    }
}

/// Owns the one hosted interpreter of a session
#[derive(Clone)]
pub struct HostedRuntimeManager {
    inner: Arc<Inner>,
}

impl HostedRuntimeManager {
    pub fn new(loader: Arc<dyn InterpreterLoader>, packages: Vec<String>) -> Self {
        let (state, _) = watch::channel(RuntimeReadiness::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                loader,
                packages,
                state,
                handle: OnceLock::new(),
            }),
        }
    }

    /// Current state without waiting
    pub fn readiness(&self) -> RuntimeReadiness {
        self.inner.state.borrow().clone()
    }

    /// Start initialization if nobody has yet, and report the state afterwards.
    ///
    /// Must be called from within a tokio runtime.
    pub fn begin(&self) -> RuntimeReadiness {
        let started = self.inner.state.send_if_modified(|state| {
            if *state == RuntimeReadiness::Uninitialized {
                *state = RuntimeReadiness::Loading;
                true
            } else {
                false
            }
        });

        if started {
            info!("Loading hosted runtime");
            let inner = self.inner.clone();
            tokio::spawn(async move { inner.initialize().await });
        }

        self.readiness()
    }

    /// Wait until the runtime is usable. There is no deadline.
    pub async fn ensure_ready(&self) -> Result<ReadyHandle, Error> {
        self.begin();

        let mut state = self.inner.state.subscribe();
        let settled = state
            .wait_for(RuntimeReadiness::is_terminal)
            .await
            .map_err(|_| Error::RuntimeInitialization("runtime manager dropped".to_string()))?
            .clone();

        match settled {
            RuntimeReadiness::Failed(reason) => Err(Error::RuntimeInitialization(reason)),
            _ => self.try_handle().ok_or_else(|| {
                Error::RuntimeInitialization("runtime ready without an interpreter".to_string())
            }),
        }
    }

    /// The handle, if the runtime is already ready
    pub fn try_handle(&self) -> Option<ReadyHandle> {
        self.inner.handle.get().cloned()
    }

    /// Run source on the hosted interpreter. Faults never escape as errors; they become
    /// an `InterpreterError` outcome. A user fault leaves readiness untouched, losing the
    /// interpreter moves it to `Failed`.
    pub async fn execute(&self, handle: &ReadyHandle, code: &str) -> ExecutionOutcome {
        let mut interpreter = handle.interpreter.lock().await;
        if let RuntimeReadiness::Failed(reason) = self.readiness() {
            return ExecutionOutcome::error(ErrorKind::InterpreterError, reason);
        }

        match interpreter.run(code).await {
            Ok(value) => ExecutionOutcome::success(value),
            Err(Error::Interpreter(message)) => {
                ExecutionOutcome::error(ErrorKind::InterpreterError, message)
            }
            Err(e) => {
                let reason = e.to_string();
                error!("Hosted interpreter lost: {}", reason);
                self.inner
                    .state
                    .send_replace(RuntimeReadiness::Failed(reason.clone()));
                ExecutionOutcome::error(ErrorKind::InterpreterError, reason)
            }
        }
    }
}
