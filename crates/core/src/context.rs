//! Execution context shared by every step of one invocation

use crate::cancel::CancelToken;
use crate::config::{Config, MissingInputPolicy};
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::process::{self, CommandLine, CommandResult};
use std::path::{Path, PathBuf};

/// Command-line overrides that steps may consult
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// Build a release variant instead of the configured default
    pub release: Option<bool>,
    /// Build an app bundle instead of the configured default
    pub bundle: Option<bool>,
    /// adb serial to target
    pub device: Option<String>,
}

/// Working directory, configuration, logger and flags for one run
#[derive(Debug, Clone)]
pub struct Context {
    pub cwd: PathBuf,
    pub config: Config,
    pub logger: Logger,
    pub debug: bool,
    pub flags: Flags,
    cancel: CancelToken,
}

impl Context {
    pub fn new(cwd: impl Into<PathBuf>, config: Config, logger: Logger) -> Self {
        Self {
            cwd: cwd.into(),
            config,
            logger,
            debug: false,
            flags: Flags::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Resolve a project-relative path, expanding a leading `~`
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        let raw = relative.as_ref().to_string_lossy();
        let expanded = PathBuf::from(shellexpand::tilde(&raw).as_ref());
        if expanded.is_absolute() {
            expanded
        } else {
            self.cwd.join(expanded)
        }
    }

    /// Run a command in the terminal, failing on non-zero exit
    pub async fn run(&self, command: CommandLine) -> Result<()> {
        let command = self.in_project(command);
        self.logger.command(&command);
        process::status_checked(&command).await
    }

    /// Run a command and capture its output, whatever the exit status
    pub async fn capture(&self, command: CommandLine) -> Result<CommandResult> {
        let command = self.in_project(command);
        self.logger.command(&command);
        process::output(&command).await
    }

    /// Run a command and capture its output, failing on non-zero exit
    pub async fn capture_checked(&self, command: CommandLine) -> Result<CommandResult> {
        let command = self.in_project(command);
        self.logger.command(&command);
        process::output_checked(&command).await
    }

    fn in_project(&self, command: CommandLine) -> CommandLine {
        if command.dir().is_some() {
            command
        } else {
            command.current_dir(&self.cwd)
        }
    }

    /// Apply the missing-input policy to an absent optional input
    ///
    /// Returns `Ok(())` after a warning under `warnAndSkip`; the caller is
    /// expected to skip the work that needed the file.
    pub fn missing_input(&self, path: &Path, what: &str) -> Result<()> {
        match self.config.on_missing_input {
            MissingInputPolicy::Abort => Err(Error::file_not_found(path).with_context(what.to_string())),
            MissingInputPolicy::WarnAndSkip => {
                self.logger
                    .warn(format!("{} not found at {}, skipping", what, path.display()));
                Ok(())
            }
        }
    }
}
