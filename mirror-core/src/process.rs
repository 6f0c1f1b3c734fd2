//! External process invocation
//!
//! Every git command goes through [`CommandRunner`], so the pipeline can be
//! driven by a scripted fake in tests. A runner returns the exit status
//! instead of failing on it; [`run_checked`] is the strict variant.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{Error, Result};

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Working directory for the command
    pub dir: PathBuf,
    /// Program name or path
    pub program: String,
    /// Arguments, not including the program
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(dir: impl AsRef<Path>, program: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent result
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    /// A successful result with the given stdout
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Capability to run external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    ///
    /// Returns `Ok` for any exit status; `Err` only if the program could not
    /// be started at all.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!(dir = %invocation.dir.display(), "$ {}", invocation);

        if !invocation.dir.is_dir() {
            return Err(Error::WorkingDirectory {
                dir: invocation.dir.clone(),
            });
        }

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.stderr.trim().is_empty() {
            tracing::debug!(program = %invocation.program, "{}", result.stderr.trim_end());
        }

        Ok(result)
    }
}

/// Run a command and treat a non-zero exit as an error
pub async fn run_checked<R>(runner: &R, invocation: &Invocation) -> Result<CommandOutput>
where
    R: CommandRunner + ?Sized,
{
    let output = runner.run(invocation).await?;

    if !output.success() {
        return Err(Error::CommandFailed {
            command: invocation.to_string(),
            dir: invocation.dir.clone(),
            status: output.status_label(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}

/// Bounded retry for commands that talk to a remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

impl RetryPolicy {
    /// `attempts` is clamped to at least one
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Run exactly once
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run a command, retrying failures until attempts are exhausted
    pub async fn run<R>(&self, runner: &R, invocation: &Invocation) -> Result<CommandOutput>
    where
        R: CommandRunner + ?Sized,
    {
        let mut attempt = 1;
        loop {
            match run_checked(runner, invocation).await {
                Ok(output) => return Ok(output),
                Err(e) if attempt < self.attempts => {
                    tracing::warn!(
                        attempt,
                        attempts = self.attempts,
                        "`{}` failed: {}. Retrying in {:?}",
                        invocation,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
