//! Structured error handling with codes, context and recovery suggestions
//!
//! Every failure in the toolchain is carried by [`Error`]:
//! - a numeric [`ErrorCode`] grouped by category
//! - a human-readable message
//! - optional context and a recovery suggestion
//! - the underlying source error, when there is one

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Stable numeric codes, grouped by thousands into categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Cancelled = 1003,

    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,
    DirectoryNotFound = 2004,

    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    /// A step needs a configuration field that is not set
    MissingField = 3003,

    StepNotFound = 4000,
    InvalidStepPackage = 4001,

    ProcessError = 5000,
    CommandNotFound = 5001,
    CommandFailed = 5002,

    ValidationError = 6000,

    /// Icon decoding or rendering
    AssetError = 8001,
    DeviceNotFound = 8003,
    TemplateError = 8004,
}

impl ErrorCode {
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Category name; also decides the process exit code
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "Cancelled",
            2 => "IO",
            3 => "Configuration",
            4 => "Resolution",
            5 => "Process",
            6 => "Validation",
            8 => "Native",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// A failure anywhere in the toolchain
///
/// Rendered as `[E2001] message`, followed by indented `Context:` and
/// `Suggestion:` lines when present.
#[derive(Error, Debug)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    /// What was being attempted, or the tail of a failed command's output
    pub context: Option<String>,
    /// What the user can do about it
    pub suggestion: Option<String>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        for (label, value) in [("Context", &self.context), ("Suggestion", &self.suggestion)] {
            if let Some(value) = value {
                write!(f, "\n  {}: {}", label, value)?;
            }
        }
        Ok(())
    }
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        Self {
            suggestion: Some(suggestion.into()),
            ..self
        }
    }

    pub fn with_source(self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..self
        }
    }

    /// Process exit status for this error
    ///
    /// Cancellation and a missing executable keep their shell conventions
    /// (130 and 127); configuration and resolution problems get their own
    /// codes so scripts can tell them apart from tool failures.
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.code.category()) {
            (ErrorCode::Cancelled, _) => exit_codes::CANCELLED,
            (ErrorCode::CommandNotFound, _) => exit_codes::COMMAND_NOT_FOUND,
            (_, "Configuration") => exit_codes::CONFIG_ERROR,
            (_, "Resolution") => exit_codes::RESOLUTION_ERROR,
            _ => exit_codes::FAILURE,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IoError, message)
    }

    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Check that the file exists and you have read permissions")
    }

    pub fn directory_not_found(path: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::DirectoryNotFound,
            format!("Directory not found: {}", path.as_ref().display()),
        )
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn config_not_found(dir: impl AsRef<Path>, candidates: &[&str]) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("No configuration found in {}", dir.as_ref().display()),
        )
        .with_context(format!("Looked for: {}", candidates.join(", ")))
        .with_suggestion("Run `deploid init` to create a deploid.config.toml")
    }

    pub fn config_parse(path: impl AsRef<Path>, detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse {}: {}", path.as_ref().display(), detail),
        )
    }

    /// A field a step depends on is absent from the configuration
    pub fn missing_field(field: &str, step: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Step '{}' requires `{}` in the configuration", step, field),
        )
        .with_suggestion(format!("Add `{}` to deploid.config.toml", field))
    }

    pub fn step_not_found(name: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::StepNotFound, format!("Step not found: {}", name))
            .with_context(reason)
            .with_suggestion(format!(
                "Install it with `deploid plugin add {}` or check the step name",
                name
            ))
    }

    pub fn invalid_step_package(name: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidStepPackage,
            format!("Step package '{}' is not usable", name),
        )
        .with_context(reason)
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessError, message)
    }

    pub fn command_not_found(cmd: &str) -> Self {
        Self::new(
            ErrorCode::CommandNotFound,
            format!("Command not found: {}", cmd),
        )
        .with_suggestion(format!("Install {} and ensure it's in your PATH", cmd))
    }

    pub fn command_failed(cmd: &str, exit_code: i32, output: &str) -> Self {
        let err = Self::new(
            ErrorCode::CommandFailed,
            format!("`{}` exited with status {}", cmd, exit_code),
        );
        let output = output.trim();
        if output.is_empty() {
            err
        } else {
            err.with_context(output.to_string())
        }
    }

    pub fn cancelled(step: &str) -> Self {
        Self::new(ErrorCode::Cancelled, format!("Cancelled during step '{}'", step))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn native(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 3;
    pub const RESOLUTION_ERROR: i32 = 4;
    pub const COMMAND_NOT_FOUND: i32 = 127;
    pub const CANCELLED: i32 = 130;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("JSON parse error: {}", err))
            .with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::new(ErrorCode::ValidationError, format!("Regex error: {}", err)).with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::StepNotFound.to_string(), "E4000");
    }

    #[test]
    fn test_regex_error_converts() {
        fn compile(pattern: &str) -> Result<regex::Regex> {
            Ok(regex::Regex::new(pattern)?)
        }
        let err = compile("(unclosed").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.starts_with("Regex error:"));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::ConfigNotFound.category(), "Configuration");
        assert_eq!(ErrorCode::StepNotFound.category(), "Resolution");
        assert_eq!(ErrorCode::DeviceNotFound.category(), "Native");
        assert_eq!(ErrorCode::Cancelled.category(), "Cancelled");
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::file_not_found("/path/to/logo.svg").with_context("While generating assets");

        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_step_not_found_names_step() {
        let err = Error::step_not_found("packager-ionic", "no bundled step with that name");
        let text = err.to_string();
        assert!(text.contains("packager-ionic"));
        assert!(text.contains("no bundled step"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::cancelled("build").exit_code(), exit_codes::CANCELLED);
        assert_eq!(Error::config_not_found(".", &["a"]).exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(Error::command_not_found("adb").exit_code(), exit_codes::COMMAND_NOT_FOUND);
        assert_eq!(Error::io("boom").exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_command_failed_keeps_output() {
        let err = Error::command_failed("./gradlew assembleDebug", 1, "\nBUILD FAILED\n");
        assert_eq!(err.context.as_deref(), Some("BUILD FAILED"));

        let quiet = Error::command_failed("adb devices", 1, "   ");
        assert!(quiet.context.is_none());
    }
}
