use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Languages the session knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    JavaScript,
    Python,
}

impl LanguageId {
    /// Identifier used by the editor surface and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::JavaScript => "javascript",
            LanguageId::Python => "python",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "javascript" => Ok(LanguageId::JavaScript),
            "python" => Ok(LanguageId::Python),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}

/// How source text for a language gets executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Evaluated in-process, result is whatever the program printed
    Native,
    /// Delegated to the hosted interpreter owned by the runtime manager
    Hosted,
}

/// A single run request coming from the editor surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Raw language identifier, validated by the registry
    pub language: String,
    /// Source code to execute
    pub code: String,
    /// Correlates log lines of one run
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
}

impl ExecutionRequest {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            id: Uuid::new_v4(),
        }
    }
}

/// Classification of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedLanguage,
    RuntimeNotReady,
    /// The user's JavaScript raised
    RuntimeError,
    /// The user's Python raised
    InterpreterError,
    /// Internal fault caught at the session boundary
    General,
}

impl ErrorKind {
    /// Prefix shown before the message, `None` when the message stands alone
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ErrorKind::UnsupportedLanguage | ErrorKind::RuntimeNotReady => None,
            ErrorKind::RuntimeError => Some("JavaScript Error"),
            ErrorKind::InterpreterError => Some("Python Error"),
            ErrorKind::General => Some("General Error"),
        }
    }
}

/// Normalized result of exactly one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Success { value: Option<String> },
    Error { kind: ErrorKind, message: String },
}

impl ExecutionOutcome {
    pub fn success(value: Option<String>) -> Self {
        ExecutionOutcome::Success { value }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ExecutionOutcome::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success { .. } => "success",
            ExecutionOutcome::Error { .. } => "error",
        }
    }
}

/// Lifecycle of the hosted interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum RuntimeReadiness {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

impl RuntimeReadiness {
    /// Ready and Failed are never left once reached
    pub fn is_terminal(&self) -> bool {
        matches!(self, RuntimeReadiness::Ready | RuntimeReadiness::Failed(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, RuntimeReadiness::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing_is_exact() {
        assert_eq!("python".parse::<LanguageId>(), Ok(LanguageId::Python));
        assert_eq!(
            "javascript".parse::<LanguageId>(),
            Ok(LanguageId::JavaScript)
        );
        assert!("Python".parse::<LanguageId>().is_err());
        assert!("js".parse::<LanguageId>().is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ExecutionOutcome::error(ErrorKind::RuntimeError, "boom");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "runtime_error");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_readiness_terminal_states() {
        assert!(!RuntimeReadiness::Uninitialized.is_terminal());
        assert!(!RuntimeReadiness::Loading.is_terminal());
        assert!(RuntimeReadiness::Ready.is_terminal());
        assert!(RuntimeReadiness::Failed("x".into()).is_terminal());
    }
}
