use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

/// Session configuration, loadable from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Hosted Python runtime
    pub python: PythonConfig,
    /// Suspend hosted runs until the runtime settles instead of answering "still loading"
    pub wait_for_runtime: bool,
    /// Texts shown to the user
    pub messages: Messages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Interpreter executable, looked up on PATH
    pub command: String,
    /// Modules that must import before the runtime counts as ready
    pub packages: Vec<String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            packages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub no_output: String,
    pub loading: String,
    pub load_failed: String,
    pub not_ready: String,
    pub unsupported: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            no_output: "No output generated".to_string(),
            loading: "IDE is loading...".to_string(),
            load_failed: "Error loading Python runtime.".to_string(),
            not_ready: "Python runtime is still loading. Please wait...".to_string(),
            unsupported: "Language not supported for browser execution.".to_string(),
        }
    }
}

impl ExecConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let config: ExecConfig =
            toml::from_str(contents).map_err(|e| Error::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_python_command(mut self, command: String) -> Self {
        self.python.command = command;
        self
    }

    pub fn with_wait_for_runtime(mut self, wait: bool) -> Self {
        self.wait_for_runtime = wait;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.python.command.trim().is_empty() {
            return Err(Error::Configuration(
                "python.command must not be empty".to_string(),
            ));
        }
        if let Some(bad) = self.python.packages.iter().find(|p| p.trim().is_empty()) {
            return Err(Error::Configuration(format!(
                "python.packages contains an empty name: {:?}",
                bad
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_defaults() {
        let config = ExecConfig::default();
        assert_eq!(config.python.command, "python3");
        assert!(config.python.packages.is_empty());
        assert!(!config.wait_for_runtime);
        assert_eq!(config.messages.no_output, "No output generated");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExecConfig::from_toml_str(
            r#"
            wait_for_runtime = true

            [python]
            packages = ["json", "math"]

            [messages]
            no_output = "(nothing)"
            "#,
        )
        .unwrap();

        assert!(config.wait_for_runtime);
        assert_eq!(config.python.command, "python3");
        assert_eq!(config.python.packages, ["json", "math"]);
        assert_eq!(config.messages.no_output, "(nothing)");
        assert_eq!(config.messages.loading, "IDE is loading...");
    }

    #[test]
    fn test_rejects_empty_command() {
        let result = ExecConfig::from_toml_str("[python]\ncommand = \"  \"\n");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = ExecConfig::from_toml_str("wait_for_runtime = \"maybe\"");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let file = assert_fs::NamedTempFile::new("exec.toml")?;
        file.write_str("[python]\ncommand = \"python3.12\"\n")?;

        let config = ExecConfig::from_file(file.path())?;
        assert_eq!(config.python.command, "python3.12");
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = ExecConfig::from_file("/nonexistent/exec.toml");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
