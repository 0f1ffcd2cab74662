//! Interactive front end for the execution core.
//!
//! Lines typed into the session accumulate in a buffer; `:run` sends the buffer to the
//! selected language and prints exactly one result.

use code_exec::{CodeExecutionService, RuntimeReadiness};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub const DEFAULT_LANGUAGE: &str = "javascript";

const HELP: &str = "\
Commands:
  :lang <id>   switch language (javascript, python)
  :run         execute the buffer and clear it
  :show        print the buffer
  :clear       discard the buffer
  :status      show the Python runtime state
  :help        this text
  :quit        leave the session
Any other line is appended to the buffer.";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] code_exec::Error),

    #[error("Cannot infer language of {0}, pass --language")]
    UnknownExtension(String),
}

/// A parsed session input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Language(String),
    Run,
    Show,
    Clear,
    Status,
    Help,
    Quit,
    Unknown(String),
    Source(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Source(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("lang"), Some(language)) => Command::Language(language.to_string()),
            (Some("run"), None) => Command::Run,
            (Some("show"), None) => Command::Show,
            (Some("clear"), None) => Command::Clear,
            (Some("status"), None) => Command::Status,
            (Some("help"), None) => Command::Help,
            (Some("quit") | Some("q"), None) => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Language for a source file, from its extension
pub fn language_for_path(path: &Path) -> Result<&'static str, CliError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js") | Some("mjs") => Ok("javascript"),
        Some("py") => Ok("python"),
        _ => Err(CliError::UnknownExtension(path.display().to_string())),
    }
}

/// Editor state of one interactive session
pub struct Session<W: Write> {
    service: CodeExecutionService,
    language: String,
    buffer: Vec<String>,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn new(service: CodeExecutionService, language: impl Into<String>, out: W) -> Self {
        Self {
            service,
            language: language.into(),
            buffer: Vec::new(),
            out,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Apply one command. Returns `false` once the session should end.
    pub async fn handle(&mut self, command: Command) -> Result<bool, CliError> {
        match command {
            Command::Source(line) => self.buffer.push(line),
            Command::Language(language) => {
                debug!("Switching language to {}", language);
                self.language = language;
                writeln!(self.out, "[{}]", self.language)?;
            }
            Command::Run => {
                let code = self.buffer.join("\n");
                self.buffer.clear();
                let display = self.service.run(&self.language, &code).await;
                writeln!(self.out, "{}", display)?;
            }
            Command::Show => {
                for line in &self.buffer {
                    writeln!(self.out, "{}", line)?;
                }
            }
            Command::Clear => self.buffer.clear(),
            Command::Status => {
                let message = self.service.loading_message();
                match self.service.readiness() {
                    RuntimeReadiness::Ready => writeln!(self.out, "python: ready")?,
                    RuntimeReadiness::Failed(reason) => {
                        writeln!(self.out, "{} ({})", message, reason)?
                    }
                    _ => writeln!(self.out, "{}", message)?,
                }
            }
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(false),
            Command::Unknown(line) => writeln!(self.out, "Unknown command: {} (try :help)", line)?,
        }
        self.out.flush()?;
        Ok(true)
    }
}

/// Drive a session from line-oriented input until `:quit` or end of input.
/// A non-empty buffer left at end of input is run once.
pub async fn run_interactive<R, W>(session: &mut Session<W>, input: R) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if !session.handle(Command::parse(&line)).await? {
            return Ok(());
        }
    }

    if !session.buffer.is_empty() {
        session.handle(Command::Run).await?;
    }
    Ok(())
}

/// Execute one file and return the display text
pub async fn run_file(
    service: &CodeExecutionService,
    path: &Path,
    language: Option<&str>,
) -> Result<String, CliError> {
    let language = match language {
        Some(language) => language,
        None => language_for_path(path)?,
    };
    let code = tokio::fs::read_to_string(path).await?;
    Ok(service.run(language, &code).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(":lang python"),
            Command::Language("python".to_string())
        );
        assert_eq!(Command::parse(":run"), Command::Run);
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(
            Command::parse(":lang"),
            Command::Unknown(":lang".to_string())
        );
        assert_eq!(
            Command::parse("console.log(1)"),
            Command::Source("console.log(1)".to_string())
        );
        assert_eq!(Command::parse(""), Command::Source(String::new()));
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path(Path::new("a.js")).unwrap(), "javascript");
        assert_eq!(language_for_path(Path::new("dir/b.py")).unwrap(), "python");
        assert!(matches!(
            language_for_path(Path::new("c.rb")),
            Err(CliError::UnknownExtension(_))
        ));
    }
}
