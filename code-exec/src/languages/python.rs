use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, process::Stdio};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    process::{Child, ChildStdin, ChildStdout, Command},
};
use tracing::{debug, info};
use which::which;

use crate::{
    error::Error,
    runtime::{Interpreter, InterpreterLoader},
};

/// Worker loop run inside `python3 -c`. Speaks one JSON object per line over private
/// duplicates of fds 0 and 1. Fd 1 is then pointed at stderr and fd 0 at /dev/null, so
/// nothing user code or its child processes write or read can touch the protocol.
const DRIVER: &str = r#"
import ast, contextlib, importlib, io, json, os, sys, traceback

_proto_in = os.fdopen(os.dup(0), "r")
_proto_out = os.fdopen(os.dup(1), "w")
os.dup2(2, 1)
_null = os.open(os.devnull, os.O_RDONLY)
os.dup2(_null, 0)
os.close(_null)
sys.stdin = io.StringIO()
_namespace = {"__name__": "__main__"}

def _reply(payload):
    _proto_out.write(json.dumps(payload) + "\n")
    _proto_out.flush()

def _describe(exc):
    lines = "".join(traceback.format_exception_only(type(exc), exc)).strip().splitlines()
    return lines[-1] if lines else type(exc).__name__

def _run(code):
    tree = ast.parse(code, "<exec>", "exec")
    tail = None
    if tree.body and isinstance(tree.body[-1], ast.Expr):
        tail = ast.Expression(tree.body.pop().value)
    exec(compile(tree, "<exec>", "exec"), _namespace)
    if tail is None:
        return None
    return eval(compile(tail, "<exec>", "eval"), _namespace)

_reply({"ok": True, "version": sys.version.split()[0]})
while True:
    _line = _proto_in.readline()
    if not _line:
        break
    if not _line.strip():
        continue
    _request = json.loads(_line)
    _output = io.StringIO()
    try:
        with contextlib.redirect_stdout(_output), contextlib.redirect_stderr(_output):
            if _request["op"] == "load":
                for _name in _request["packages"]:
                    importlib.import_module(_name)
                _value = None
            else:
                _value = _run(_request["code"])
        _value = None if _value is None else str(_value)
        _reply({"ok": True, "value": _value, "output": _output.getvalue()})
    except BaseException as _exc:
        _reply({"ok": False, "error": _describe(_exc), "output": _output.getvalue()})
"#;

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum WorkerRequest<'a> {
    Load { packages: &'a [String] },
    Run { code: &'a str },
}

#[derive(Debug, Deserialize)]
struct WorkerReply {
    ok: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    output: String,
    #[serde(default)]
    version: Option<String>,
}

/// Starts `python3` worker processes
pub struct PythonLoader {
    command: String,
}

impl PythonLoader {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.unwrap_or_else(|| "python3".to_string()),
        }
    }

    fn resolve(&self) -> Result<PathBuf, Error> {
        which(&self.command)
            .map_err(|e| Error::System(format!("Command not found: {} ({})", self.command, e)))
    }
}

#[async_trait]
impl InterpreterLoader for PythonLoader {
    async fn acquire(&self) -> Result<Box<dyn Interpreter>, Error> {
        let path = self.resolve()?;
        debug!("Starting Python worker: {}", path.display());

        let mut child = Command::new(&path)
            .args(["-u", "-c", DRIVER])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::System(format!("Failed to spawn {}: {}", path.display(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::System("Python worker has no stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::System("Python worker has no stdout".to_string()))?;

        let mut process = PythonProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let handshake = process.read_reply().await?;
        info!(
            "Python {} worker started",
            handshake.version.as_deref().unwrap_or("unknown")
        );

        Ok(Box::new(process))
    }
}

/// A running worker holding the session's Python namespace
pub struct PythonProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl PythonProcess {
    async fn request(&mut self, request: &WorkerRequest<'_>) -> Result<WorkerReply, Error> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = self.read_reply().await?;
        for printed in reply.output.lines() {
            info!(target: "python", "{}", printed);
        }
        Ok(reply)
    }

    async fn read_reply(&mut self) -> Result<WorkerReply, Error> {
        match self.stdout.next_line().await? {
            Some(line) => Ok(serde_json::from_str(&line)?),
            None => {
                let status = self.child.try_wait()?;
                Err(Error::Protocol(format!(
                    "Python worker exited (status: {:?})",
                    status
                )))
            }
        }
    }
}

fn into_result(reply: WorkerReply) -> Result<Option<String>, Error> {
    if reply.ok {
        Ok(reply.value)
    } else {
        Err(Error::Interpreter(
            reply
                .error
                .unwrap_or_else(|| "Unknown Python error".to_string()),
        ))
    }
}

#[async_trait]
impl Interpreter for PythonProcess {
    async fn load_packages(&mut self, packages: &[String]) -> Result<(), Error> {
        let reply = self.request(&WorkerRequest::Load { packages }).await?;
        into_result(reply).map(|_| ())
    }

    async fn run(&mut self, code: &str) -> Result<Option<String>, Error> {
        let reply = self.request(&WorkerRequest::Run { code }).await?;
        into_result(reply)
    }
}
