//! Fixtures for tests in this and dependent crates
//!
//! Enabled for this crate's own tests and, elsewhere, through the
//! `test-support` feature.

use crate::config::Config;
use crate::context::Context;
use crate::logger::{LogBuffer, LogLevel, Logger};
use serde_json::{json, Value};
use std::path::Path;

/// Smallest valid configuration, as JSON
pub fn demo_config_json() -> Value {
    json!({
        "appName": "Demo",
        "appId": "com.x.demo",
        "web": { "framework": "vite", "buildCommand": "echo ok", "webDir": "dist" },
        "android": { "packaging": "capacitor" }
    })
}

/// Smallest valid configuration
pub fn demo_config() -> Config {
    config_from(demo_config_json())
}

/// Deserialize a configuration from a JSON value, panicking on bad input
pub fn config_from(value: Value) -> Config {
    match serde_json::from_value(value) {
        Ok(config) => config,
        Err(e) => panic!("invalid test configuration: {}", e),
    }
}

/// Context over `cwd` with a debug-level capturing logger
pub fn demo_context(cwd: &Path) -> (Context, LogBuffer) {
    context_with(cwd, demo_config())
}

/// Context over `cwd` with the given configuration
pub fn context_with(cwd: &Path, config: Config) -> (Context, LogBuffer) {
    let (logger, buffer) = Logger::capture(LogLevel::Debug);
    (Context::new(cwd, config, logger), buffer)
}
