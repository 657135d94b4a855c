//! Process execution utilities
//!
//! External tools are described by a [`CommandLine`] and run on tokio:
//! - [`output`] captures stdout/stderr
//! - [`status`] inherits the terminal
//! - the `_checked` variants turn a non-zero exit into [`Error::command_failed`]
//!
//! Children are killed when their future is dropped, which is how pipeline
//! cancellation reaches a running tool.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Get combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// An external command: program, arguments, directory and extra environment
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    dir: Option<PathBuf>,
    env: Vec<(String, String)>,
    stdin: Option<String>,
    secret: Vec<usize>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            env: Vec::new(),
            stdin: None,
            secret: Vec::new(),
        }
    }

    /// `sh -c <script>` (or `cmd /C` on Windows)
    pub fn shell(script: impl Into<String>) -> Self {
        if cfg!(windows) {
            Self::new("cmd").arg("/C").arg(script)
        } else {
            Self::new("sh").arg("-c").arg(script)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Argument masked as `***` whenever the command is displayed
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Extra environment variable; values are never displayed
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Text written to the child's stdin
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Shell-like rendering for logs; environment keys only
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = self.env.iter().map(|(k, _)| format!("{}=…", k)).collect();
        parts.push(self.program.clone());
        parts.extend(self.args.iter().enumerate().map(|(i, a)| {
            if self.secret.contains(&i) {
                "***".to_string()
            } else if a.contains(char::is_whitespace) || a.is_empty() {
                format!("'{}'", a)
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::command_not_found(program)
    } else {
        Error::process(format!("Failed to execute {}: {}", program, err)).with_source(err)
    }
}

/// Run a command and capture output
pub async fn output(command: &CommandLine) -> Result<CommandResult> {
    tracing::debug!(command = %command, "capturing");
    let mut cmd = command.to_command();
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let output = match &command.stdin {
        Some(input) => {
            cmd.stdin(Stdio::piped());
            let mut child = cmd.spawn().map_err(|e| spawn_error(&command.program, e))?;
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes()).await?;
            }
            child.wait_with_output().await?
        }
        None => {
            cmd.stdin(Stdio::null());
            cmd.output().await.map_err(|e| spawn_error(&command.program, e))?
        }
    };

    Ok(CommandResult::from_output(output))
}

/// Run a command, capture output, fail on non-zero exit
pub async fn output_checked(command: &CommandLine) -> Result<CommandResult> {
    let result = output(command).await?;
    if result.success {
        Ok(result)
    } else {
        Err(Error::command_failed(
            &command.display(),
            result.exit_code,
            &result.combined_output(),
        ))
    }
}

/// Run a command with inherited stdio and return its exit code
pub async fn status(command: &CommandLine) -> Result<i32> {
    tracing::debug!(command = %command, "streaming");
    let mut cmd = command.to_command();
    cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    if command.stdin.is_none() {
        cmd.stdin(Stdio::inherit());
    }

    let status = cmd
        .status()
        .await
        .map_err(|e| spawn_error(&command.program, e))?;
    Ok(status.code().unwrap_or(-1))
}

/// Run a command with inherited stdio, fail on non-zero exit
pub async fn status_checked(command: &CommandLine) -> Result<()> {
    match status(command).await? {
        0 => Ok(()),
        code => Err(Error::command_failed(&command.display(), code, "")),
    }
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Get the path to a command
pub fn which_command(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
