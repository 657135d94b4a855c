//! Leveled user-facing logger
//!
//! A [`Logger`] is constructed once per invocation and handed to every step
//! through the execution context. Records below the configured minimum level
//! are dropped. The diagnostic helpers (`env_dump`, `command`, `file_check`)
//! only print at debug level.

use crate::process::CommandLine;
use once_cell::sync::Lazy;
use owo_colors::{OwoColorize, Stream};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Environment variable selecting the minimum log level
pub const LOG_LEVEL_ENV: &str = "DEPLOID_LOG_LEVEL";

static SECRET_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(TOKEN|PASSWORD|SECRET|KEY)").expect("valid secret-key pattern"));

/// Log levels, ordered `Debug < Info < Warn < Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// All levels in ascending order
    pub const ALL: [LogLevel; 4] = [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

#[derive(Clone)]
enum Sink {
    Stdio,
    Buffer(Arc<Mutex<Vec<u8>>>),
}

/// Captured log output, for tests and embedding
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).to_string())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

/// Leveled logger writing to stdout/stderr or a capture buffer
#[derive(Clone)]
pub struct Logger {
    level: LogLevel,
    sink: Sink,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl Logger {
    /// Logger writing to the terminal
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            sink: Sink::Stdio,
        }
    }

    /// Logger whose level comes from `DEPLOID_LOG_LEVEL`, defaulting to info
    pub fn from_env() -> Self {
        Self::new(Self::level_from_env(std::env::var(LOG_LEVEL_ENV).ok().as_deref()))
    }

    /// Resolve a level from an optional environment value
    pub fn level_from_env(value: Option<&str>) -> LogLevel {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Logger writing plain lines into a shared buffer
    pub fn capture(level: LogLevel) -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        let logger = Self {
            level,
            sink: Sink::Buffer(buffer.0.clone()),
        };
        (logger, buffer)
    }

    /// Same sink, different minimum level
    pub fn with_level(&self, level: LogLevel) -> Self {
        Self {
            level,
            sink: self.sink.clone(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether a record at `level` would be emitted
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message.as_ref());
    }

    /// Info-level completion message
    pub fn success(&self, message: impl AsRef<str>) {
        if !self.enabled(LogLevel::Info) {
            return;
        }
        match &self.sink {
            Sink::Stdio => println!("{} {}", "✓".if_supports_color(Stream::Stdout, |s| s.green()), message.as_ref()),
            Sink::Buffer(buf) => write_line(buf, &format!("info: {}", message.as_ref())),
        }
    }

    /// Write a record if `level` is at or above the minimum
    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        match &self.sink {
            Sink::Stdio => match level {
                LogLevel::Debug => println!(
                    "{} {}",
                    "›".if_supports_color(Stream::Stdout, |s| s.dimmed()),
                    message.if_supports_color(Stream::Stdout, |s| s.dimmed())
                ),
                LogLevel::Info => println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |s| s.blue()), message),
                LogLevel::Warn => eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |s| s.yellow()), message),
                LogLevel::Error => eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |s| s.red()), message),
            },
            Sink::Buffer(buf) => write_line(buf, &format!("{}: {}", level, message)),
        }
    }

    /// Dump process and environment facts (debug only)
    pub fn env_dump(&self, cwd: &Path) {
        if !self.enabled(LogLevel::Debug) {
            return;
        }
        self.debug(format!("deploid {}", env!("CARGO_PKG_VERSION")));
        self.debug(format!("platform: {} {}", std::env::consts::OS, std::env::consts::ARCH));
        self.debug(format!("cwd: {}", cwd.display()));
        self.debug(format!("time: {}", chrono::Local::now().to_rfc3339()));

        let mut vars: Vec<(String, String)> = std::env::vars()
            .filter(|(k, _)| {
                k.starts_with("DEPLOID_")
                    || k.starts_with("ANDROID_")
                    || k.starts_with("JAVA_")
                    || k.starts_with("FIREBASE_")
            })
            .collect();
        vars.sort();
        for (key, value) in vars {
            self.debug(format!("env {}={}", key, redact(&key, &value)));
        }
    }

    /// Echo a subprocess invocation before it runs (debug only)
    pub fn command(&self, command: &CommandLine) {
        if !self.enabled(LogLevel::Debug) {
            return;
        }
        match command.dir() {
            Some(dir) => self.debug(format!("$ {}  (in {})", command.display(), dir.display())),
            None => self.debug(format!("$ {}", command.display())),
        }
    }

    /// Echo a path and whether it exists (debug only)
    pub fn file_check(&self, label: &str, path: &Path) {
        if !self.enabled(LogLevel::Debug) {
            return;
        }
        let state = if path.exists() { "exists" } else { "missing" };
        self.debug(format!("{}: {} ({})", label, path.display(), state));
    }
}

fn write_line(buf: &Arc<Mutex<Vec<u8>>>, line: &str) {
    if let Ok(mut buf) = buf.lock() {
        let _ = writeln!(buf, "{}", line);
    }
}

/// Hide values of variables that look like credentials
pub fn redact(key: &str, value: &str) -> String {
    if SECRET_KEY.is_match(key) {
        "<redacted>".to_string()
    } else {
        value.to_string()
    }
}
