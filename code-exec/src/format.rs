use crate::{
    config::Messages,
    types::{ExecutionOutcome, RuntimeReadiness},
};

/// Turns outcomes and readiness into the strings the display surface shows
#[derive(Debug, Clone, Default)]
pub struct ResultFormatter {
    messages: Messages,
}

impl ResultFormatter {
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    pub fn format(&self, outcome: &ExecutionOutcome) -> String {
        match outcome {
            ExecutionOutcome::Error { kind, message } => match kind.label() {
                Some(label) => format!("{}: {}", label, message),
                None => message.clone(),
            },
            ExecutionOutcome::Success { value: None } => self.messages.no_output.clone(),
            ExecutionOutcome::Success { value: Some(value) } => value.clone(),
        }
    }

    /// Text for the loading slot, empty once the runtime is usable
    pub fn loading_message(&self, readiness: &RuntimeReadiness) -> String {
        match readiness {
            RuntimeReadiness::Uninitialized | RuntimeReadiness::Loading => {
                self.messages.loading.clone()
            }
            RuntimeReadiness::Failed(_) => self.messages.load_failed.clone(),
            RuntimeReadiness::Ready => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    #[test]
    fn test_labeled_errors() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.format(&ExecutionOutcome::error(
                ErrorKind::RuntimeError,
                "x is not defined"
            )),
            "JavaScript Error: x is not defined"
        );
        assert_eq!(
            formatter.format(&ExecutionOutcome::error(
                ErrorKind::InterpreterError,
                "NameError: name 'x' is not defined"
            )),
            "Python Error: NameError: name 'x' is not defined"
        );
        assert_eq!(
            formatter.format(&ExecutionOutcome::error(ErrorKind::General, "oops")),
            "General Error: oops"
        );
    }

    #[test]
    fn test_unlabeled_errors_show_message_only() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.format(&ExecutionOutcome::error(
                ErrorKind::UnsupportedLanguage,
                "Language not supported for browser execution."
            )),
            "Language not supported for browser execution."
        );
        assert_eq!(
            formatter.format(&ExecutionOutcome::error(
                ErrorKind::RuntimeNotReady,
                "Please wait..."
            )),
            "Please wait..."
        );
    }

    #[test]
    fn test_success_values() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.format(&ExecutionOutcome::success(None)),
            "No output generated"
        );
        assert_eq!(
            formatter.format(&ExecutionOutcome::success(Some("a\nb".to_string()))),
            "a\nb"
        );
        assert_eq!(
            formatter.format(&ExecutionOutcome::success(Some(String::new()))),
            ""
        );
    }

    #[test]
    fn test_format_is_idempotent() {
        let formatter = ResultFormatter::default();
        let outcomes = [
            ExecutionOutcome::success(Some("42".to_string())),
            ExecutionOutcome::success(None),
            ExecutionOutcome::error(ErrorKind::RuntimeError, "boom"),
        ];
        for outcome in &outcomes {
            assert_eq!(formatter.format(outcome), formatter.format(outcome));
        }
    }

    #[test]
    fn test_custom_placeholder() {
        let formatter = ResultFormatter::new(Messages {
            no_output: "(empty)".to_string(),
            ..Messages::default()
        });
        assert_eq!(formatter.format(&ExecutionOutcome::success(None)), "(empty)");
    }

    #[test]
    fn test_loading_message() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.loading_message(&RuntimeReadiness::Loading),
            "IDE is loading..."
        );
        assert_eq!(
            formatter.loading_message(&RuntimeReadiness::Failed("gone".to_string())),
            "Error loading Python runtime."
        );
        assert_eq!(formatter.loading_message(&RuntimeReadiness::Ready), "");
    }
}
