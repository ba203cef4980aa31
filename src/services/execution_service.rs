//! Runs submitted code in a short-lived child process.
//!
//! WARNING: this is not a sandbox. Submitted code runs with the same user,
//! filesystem, network access and resource limits as the server itself. The
//! only protection is the wall-clock timeout. Replace [`SubprocessRunner`]
//! with an isolating [`CodeRunner`] before exposing the service to anyone
//! untrusted.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;

use crate::error::{Error, Result};

/// Result of running one program against one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    TimedOut,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Runs `code` with `input` on stdin. Implementations must not outlive
    /// `timeout`; a child still running at the deadline is killed.
    async fn run(&self, code: &str, input: &str, timeout: Duration) -> Result<ExecutionOutcome>;
}

// Executes the submission with stdin swapped for the case input. A callable
// `solve` is invoked with the stripped input and its return value printed.
const PYTHON_HARNESS: &str = r#"
import io
import sys

_source = sys.argv[1]
_data = sys.stdin.read()
sys.stdin = io.StringIO(_data)
_scope = {"__name__": "__main__"}
exec(compile(_source, "<submission>", "exec"), _scope)
_solve = _scope.get("solve")
if callable(_solve):
    _out = _solve(_data.strip())
    if _out is not None:
        sys.stdout.write(str(_out))
"#;

#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    interpreter: String,
}

impl SubprocessRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }
}

#[async_trait]
impl CodeRunner for SubprocessRunner {
    async fn run(&self, code: &str, input: &str, timeout: Duration) -> Result<ExecutionOutcome> {
        let mut command = Command::new(&self.interpreter);
        command
            .arg("-c")
            .arg(PYTHON_HARNESS)
            .arg(code)
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so anything the submission forks can be killed with it.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            Error::Execution(format!("failed to spawn '{}': {}", self.interpreter, e))
        })?;

        let stdin_task = child.stdin.take().map(|mut stdin| {
            let input = input.as_bytes().to_vec();
            tokio::spawn(async move {
                // The child may exit without reading; a broken pipe is not an error here.
                let _ = stdin.write_all(&input).await;
                let _ = stdin.shutdown().await;
            })
        });
        let stdout_task = child.stdout.take().map(drain);
        let stderr_task = child.stderr.take().map(drain);

        let mut guard = RunGuard {
            pgid: child.id(),
            tasks: Vec::new(),
        };
        guard.tasks.extend(stdin_task.iter().map(JoinHandle::abort_handle));
        guard.tasks.extend(stdout_task.iter().map(JoinHandle::abort_handle));
        guard.tasks.extend(stderr_task.iter().map(JoinHandle::abort_handle));

        let deadline = Instant::now() + timeout;
        let status = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(status) => status
                .map_err(|e| Error::Execution(format!("failed to wait for child: {}", e)))?,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "submission timed out, killing child"
                );
                guard.kill_group();
                if let Err(e) = child.kill().await {
                    tracing::error!(error = %e, "failed to kill timed out child");
                }
                return Ok(ExecutionOutcome::TimedOut);
            }
        };

        if let Some(task) = stdin_task {
            let _ = task.await;
        }
        // Grandchildren can keep the pipes open after the child exits.
        let output = tokio::time::timeout_at(deadline, async {
            Ok::<_, Error>((collect(stdout_task).await?, collect(stderr_task).await?))
        })
        .await;
        let (stdout, stderr) = match output {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("submission output still open at deadline, killing its group");
                return Ok(ExecutionOutcome::TimedOut);
            }
        };

        Ok(ExecutionOutcome::Completed {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

/// Tears down everything a run started, on every exit path: the child's
/// process group is killed and the pipe tasks are aborted.
struct RunGuard {
    pgid: Option<u32>,
    tasks: Vec<AbortHandle>,
}

impl RunGuard {
    fn kill_group(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.kill_group();
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::error!(pgid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

fn drain<R>(mut reader: R) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

async fn collect(task: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<String> {
    let Some(task) = task else {
        return Ok(String::new());
    };
    let bytes = task
        .await
        .map_err(|e| Error::Execution(format!("output reader failed: {}", e)))?
        .map_err(|e| Error::Execution(format!("failed to read child output: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
