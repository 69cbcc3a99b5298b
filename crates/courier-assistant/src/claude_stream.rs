//! Assistant CLI subprocess exposed as a text fragment source.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use courier_core::{truncate_for_error, TextFragmentSource};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::stream_record::parse_stream_record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeStreamConfig {
    pub command: String,
    /// Wall-clock budget for the whole subprocess, after which it is killed.
    pub timeout_ms: u64,
    pub anthropic_base_url: Option<String>,
    pub anthropic_auth_token: Option<String>,
    pub project_dir: Option<PathBuf>,
    pub skip_permissions: bool,
    pub extra_args: Vec<String>,
}

impl Default for ClaudeStreamConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            timeout_ms: 300_000,
            anthropic_base_url: None,
            anthropic_auth_token: None,
            project_dir: None,
            skip_permissions: false,
            extra_args: Vec::new(),
        }
    }
}

impl ClaudeStreamConfig {
    pub fn command_args(&self, prompt: &str) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            prompt.to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
        ];
        if self.skip_permissions {
            args.push("--dangerously-skip-permissions".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[derive(Debug, Error)]
pub enum AssistantStreamError {
    #[error("invalid assistant configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to spawn assistant '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("assistant output could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("assistant timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },
    #[error("assistant exited with status {status}: {stderr}")]
    Exited { status: String, stderr: String },
}

/// Running assistant subprocess read line by line.
///
/// The process is killed on timeout, on read failure, and when the source is dropped.
pub struct ClaudeStreamSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    line: Vec<u8>,
    deadline: Instant,
    timeout_ms: u64,
    finished: bool,
}

async fn spawn_with_text_file_busy_retry(
    command: &mut Command,
    executable: &str,
) -> Result<Child, AssistantStreamError> {
    const MAX_TEXT_FILE_BUSY_RETRIES: u32 = 5;
    const TEXT_FILE_BUSY_ERRNO: i32 = 26;
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(error)
                if error.raw_os_error() == Some(TEXT_FILE_BUSY_ERRNO)
                    && attempt < MAX_TEXT_FILE_BUSY_RETRIES =>
            {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            Err(source) => {
                return Err(AssistantStreamError::Spawn {
                    command: executable.to_string(),
                    source,
                })
            }
        }
    }
}

impl ClaudeStreamSource {
    pub async fn spawn(
        config: &ClaudeStreamConfig,
        prompt: &str,
    ) -> Result<Self, AssistantStreamError> {
        if config.command.trim().is_empty() {
            return Err(AssistantStreamError::InvalidConfig(
                "assistant command is empty".to_string(),
            ));
        }
        if config.timeout_ms == 0 {
            return Err(AssistantStreamError::InvalidConfig(
                "assistant timeout must be greater than 0ms".to_string(),
            ));
        }

        let mut command = Command::new(&config.command);
        command.kill_on_drop(true);
        command.args(config.command_args(prompt));
        if let Some(base_url) = config.anthropic_base_url.as_deref() {
            command.env("ANTHROPIC_BASE_URL", base_url);
        }
        if let Some(auth_token) = config.anthropic_auth_token.as_deref() {
            command.env("ANTHROPIC_AUTH_TOKEN", auth_token);
        }
        if let Some(project_dir) = &config.project_dir {
            command.current_dir(project_dir);
        }
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = spawn_with_text_file_busy_retry(&mut command, &config.command).await?;
        let stdout = child.stdout.take().ok_or_else(|| {
            AssistantStreamError::Io(std::io::Error::other("assistant stdout was not captured"))
        })?;
        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut bytes = Vec::new();
                let _ = stderr.read_to_end(&mut bytes).await;
                String::from_utf8_lossy(&bytes).into_owned()
            })
        });
        tracing::debug!(
            command = config.command.as_str(),
            timeout_ms = config.timeout_ms,
            "assistant subprocess spawned"
        );

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stderr,
            line: Vec::new(),
            deadline: Instant::now() + Duration::from_millis(config.timeout_ms),
            timeout_ms: config.timeout_ms,
            finished: false,
        })
    }

    /// Kills the subprocess unless it already exited. Repeated calls are no-ops.
    pub fn terminate(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        if let Err(error) = self.child.start_kill() {
            tracing::debug!(%error, "assistant subprocess already gone");
        }
    }

    fn abort(&mut self, error: AssistantStreamError) -> AssistantStreamError {
        self.finished = true;
        self.terminate();
        tracing::warn!(%error, "assistant stream aborted");
        error
    }

    async fn wait_for_exit(&mut self) -> Result<(), AssistantStreamError> {
        let status = self.child.wait().await?;
        let stderr = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        if status.success() {
            return Ok(());
        }
        let status = status
            .code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let stderr = stderr.trim();
        Err(AssistantStreamError::Exited {
            status,
            stderr: if stderr.is_empty() {
                "no error output".to_string()
            } else {
                truncate_for_error(stderr, 240)
            },
        })
    }

    async fn next_record(&mut self) -> Result<Option<String>, AssistantStreamError> {
        if self.finished {
            return Ok(None);
        }
        let deadline = self.deadline;
        loop {
            self.line.clear();
            let read =
                tokio::time::timeout_at(deadline, self.stdout.read_until(b'\n', &mut self.line))
                    .await;
            match read {
                Err(_) => {
                    return Err(self.abort(AssistantStreamError::TimedOut {
                        timeout_ms: self.timeout_ms,
                    }))
                }
                Ok(Err(error)) => return Err(self.abort(AssistantStreamError::Io(error))),
                Ok(Ok(0)) => {
                    self.finished = true;
                    return match tokio::time::timeout_at(deadline, self.wait_for_exit()).await {
                        Ok(Ok(())) => Ok(None),
                        Ok(Err(error)) => Err(error),
                        Err(_) => Err(self.abort(AssistantStreamError::TimedOut {
                            timeout_ms: self.timeout_ms,
                        })),
                    };
                }
                Ok(Ok(_)) => {
                    if let Some(fragment) = parse_stream_record(&String::from_utf8_lossy(&self.line))
                    {
                        return Ok(Some(fragment));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl TextFragmentSource for ClaudeStreamSource {
    async fn next_fragment(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.next_record().await?)
    }
}
