use crate::utils::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Exit status and diagnostic stream of one finished tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Lines read from stderr, in order of appearance.
    pub stderr: Vec<String>,
    pub stdout: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Seam between the capture pipeline and the external frame extractor.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Whether `program` resolves to an executable, either as a path or via `PATH`.
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    /// Runs `program` to completion and collects its stderr line by line.
    /// Only a failure to launch (or a timeout) is an `Err`; a non-zero exit is not.
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout_seconds: Option<u64>) -> Self {
        Self {
            timeout: timeout_seconds.map(Duration::from_secs),
        }
    }

    async fn spawn_and_collect(program: &str, args: &[String]) -> Result<ToolOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ffmpeg(format!("Failed to spawn {}: {}", program, e)))?;

        let stderr_pipe = child.stderr.take();
        let stdout_pipe = child.stdout.take();

        let read_stderr = async move {
            let mut stderr = Vec::new();
            if let Some(pipe) = stderr_pipe {
                let mut lines = BufReader::new(pipe).lines();
                while let Some(line) = lines.next_line().await? {
                    stderr.push(line);
                }
            }
            Ok::<_, std::io::Error>(stderr)
        };
        let read_stdout = async move {
            let mut stdout = String::new();
            if let Some(mut pipe) = stdout_pipe {
                pipe.read_to_string(&mut stdout).await?;
            }
            Ok::<_, std::io::Error>(stdout)
        };

        let (stderr, stdout) = tokio::try_join!(read_stderr, read_stdout)?;
        let status = child.wait().await?;

        Ok(ToolOutput {
            status: status.code(),
            stderr,
            stdout,
        })
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput> {
        debug!("Running: {} {}", program, args.join(" "));

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, Self::spawn_and_collect(program, args))
                .await
                .map_err(|_| Error::timeout(program, limit.as_secs()))?,
            None => Self::spawn_and_collect(program, args).await,
        }
    }
}
