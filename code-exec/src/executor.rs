use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

use crate::{
    capture::with_capture,
    config::{ExecConfig, Messages},
    error::Error,
    languages::{JavaScriptExecutor, NativeExecutor, PythonLoader},
    registry::RuntimeRegistry,
    runtime::{HostedRuntimeManager, ReadyHandle},
    types::{ErrorKind, ExecutionOutcome, ExecutionRequest, RuntimeReadiness, Strategy},
};

/// Routes a request to its strategy and folds whatever happens into one outcome
pub struct ExecutionDispatcher {
    registry: RuntimeRegistry,
    native: Arc<dyn NativeExecutor>,
    runtime: HostedRuntimeManager,
    wait_for_runtime: bool,
    messages: Messages,
}

impl ExecutionDispatcher {
    pub fn new(
        native: Arc<dyn NativeExecutor>,
        runtime: HostedRuntimeManager,
        config: &ExecConfig,
    ) -> Self {
        Self {
            registry: RuntimeRegistry,
            native,
            runtime,
            wait_for_runtime: config.wait_for_runtime,
            messages: config.messages.clone(),
        }
    }

    /// Production wiring: embedded JavaScript engine and a `python3` worker
    pub fn from_config(config: &ExecConfig) -> Self {
        let loader = PythonLoader::new(Some(config.python.command.clone()));
        let runtime = HostedRuntimeManager::new(Arc::new(loader), config.python.packages.clone());
        Self::new(Arc::new(JavaScriptExecutor::new()), runtime, config)
    }

    pub fn runtime(&self) -> &HostedRuntimeManager {
        &self.runtime
    }

    pub fn registry(&self) -> &RuntimeRegistry {
        &self.registry
    }

    pub async fn run(&self, request: &ExecutionRequest) -> ExecutionOutcome {
        let span = info_span!("run", id = %request.id, language = %request.language);
        self.dispatch(request).instrument(span).await
    }

    async fn dispatch(&self, request: &ExecutionRequest) -> ExecutionOutcome {
        let strategy = match self.registry.resolve(&request.language) {
            Ok((_, strategy)) => strategy,
            Err(e) => {
                debug!("{}", e);
                return ExecutionOutcome::error(
                    ErrorKind::UnsupportedLanguage,
                    self.messages.unsupported.clone(),
                );
            }
        };

        debug!("Dispatching {} bytes via {:?} strategy", request.code.len(), strategy);
        match strategy {
            Strategy::Native => self.run_native(&request.code),
            Strategy::Hosted => self.run_hosted(&request.code).await,
        }
    }

    fn run_native(&self, code: &str) -> ExecutionOutcome {
        let (result, captured) = with_capture(|console| self.native.execute(code, console));
        match result {
            Ok(()) => ExecutionOutcome::success(captured.into_text()),
            Err(e) => {
                debug!(
                    discarded = captured.lines().len(),
                    "Native execution raised: {}", e
                );
                ExecutionOutcome::error(ErrorKind::RuntimeError, fault_message(e))
            }
        }
    }

    async fn run_hosted(&self, code: &str) -> ExecutionOutcome {
        let handle = match self.hosted_handle().await {
            Ok(handle) => handle,
            Err(outcome) => return outcome,
        };
        self.runtime.execute(&handle, code).await
    }

    async fn hosted_handle(&self) -> Result<ReadyHandle, ExecutionOutcome> {
        if self.wait_for_runtime {
            return self.runtime.ensure_ready().await.map_err(|e| {
                warn!("Hosted runtime unavailable: {}", e);
                self.not_ready(&RuntimeReadiness::Failed(fault_message(e)))
            });
        }

        match self.runtime.begin() {
            RuntimeReadiness::Ready => self
                .runtime
                .try_handle()
                .ok_or_else(|| self.not_ready(&RuntimeReadiness::Loading)),
            other => {
                debug!("Hosted runtime not ready: {:?}", other);
                Err(self.not_ready(&other))
            }
        }
    }

    fn not_ready(&self, readiness: &RuntimeReadiness) -> ExecutionOutcome {
        let message = match readiness {
            RuntimeReadiness::Failed(reason) => {
                format!("{} {}", self.messages.load_failed, reason)
            }
            _ => self.messages.not_ready.clone(),
        };
        ExecutionOutcome::error(ErrorKind::RuntimeNotReady, message)
    }
}

/// The user-facing part of an execution error
fn fault_message(error: Error) -> String {
    match error {
        Error::Interpreter(message) | Error::RuntimeInitialization(message) => message,
        other => other.to_string(),
    }
}
