use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    config::ExecConfig,
    error::Error,
    executor::ExecutionDispatcher,
    format::ResultFormatter,
    types::{ErrorKind, ExecutionOutcome, ExecutionRequest, LanguageId, RuntimeReadiness, Strategy},
};

/// One interactive session: the outermost boundary every run request goes through.
///
/// Each run executes on its own task, so even a panic inside an executor comes back as a
/// `General Error` outcome instead of taking the caller down.
#[derive(Clone)]
pub struct CodeExecutionService {
    dispatcher: Arc<ExecutionDispatcher>,
    formatter: ResultFormatter,
}

impl CodeExecutionService {
    /// Build the production session and start loading the hosted runtime in the background
    pub async fn new(config: ExecConfig) -> Result<Self, Error> {
        config.validate()?;
        let service = Self::with_dispatcher(ExecutionDispatcher::from_config(&config), &config);
        service.start_runtime();
        Ok(service)
    }

    /// Session over an already wired dispatcher. Nothing is started.
    pub fn with_dispatcher(dispatcher: ExecutionDispatcher, config: &ExecConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            formatter: ResultFormatter::new(config.messages.clone()),
        }
    }

    /// Kick off hosted runtime initialization without waiting for it
    pub fn start_runtime(&self) -> RuntimeReadiness {
        self.dispatcher.runtime().begin()
    }

    pub fn readiness(&self) -> RuntimeReadiness {
        self.dispatcher.runtime().readiness()
    }

    /// Text for the display's loading slot
    pub fn loading_message(&self) -> String {
        self.formatter.loading_message(&self.readiness())
    }

    pub fn languages(&self) -> &'static [(LanguageId, Strategy)] {
        self.dispatcher.registry().entries()
    }

    pub fn formatter(&self) -> &ResultFormatter {
        &self.formatter
    }

    /// Execute a request. Always yields exactly one outcome.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionOutcome {
        let dispatcher = self.dispatcher.clone();
        let id = request.id;

        let outcome = match tokio::spawn(async move { dispatcher.run(&request).await }).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                error!(%id, "Execution panicked: {}", message);
                ExecutionOutcome::error(ErrorKind::General, message)
            }
            Err(e) => {
                error!(%id, "Execution task failed: {}", e);
                ExecutionOutcome::error(ErrorKind::General, e.to_string())
            }
        };

        match &outcome {
            ExecutionOutcome::Success { .. } => info!(%id, "Code execution completed successfully"),
            ExecutionOutcome::Error { kind, message } => {
                debug!(%id, ?kind, "Code execution failed: {}", message)
            }
        }
        outcome
    }

    /// Run source text and return exactly what the display should show
    pub async fn run(&self, language: &str, code: &str) -> String {
        let outcome = self.execute(ExecutionRequest::new(language, code)).await;
        self.formatter.format(&outcome)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "execution aborted".to_string()
    }
}
