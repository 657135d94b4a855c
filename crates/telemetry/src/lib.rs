//! Telemetry for deploid runs
//!
//! Installs the `tracing` subscriber used for internal diagnostics and keeps
//! an in-process record of how long each step took. Nothing leaves the
//! machine; the record is only printed under `--debug`.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Crates whose diagnostics `--debug` turns on
const DEBUG_TARGETS: &[&str] = &[
    "deploid",
    "deploid_core",
    "deploid_assets",
    "deploid_web",
    "deploid_android",
    "deploid_ios",
];

static METRICS: Lazy<RunMetrics> = Lazy::new(RunMetrics::new);

static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Install the global subscriber; `RUST_LOG` wins over `config.filter`
///
/// Fails when a subscriber is already installed.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .compact(),
    );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(session = %session_id(), version = env!("CARGO_PKG_VERSION"), "tracing ready");
    Ok(())
}

/// Random id of this process, attached to the run summary
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// `--debug`: every deploid crate at debug level, with targets
    pub fn debug() -> Self {
        let filter = DEBUG_TARGETS
            .iter()
            .map(|target| format!("{}=debug", target))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            filter,
            show_target: true,
        }
    }
}

/// One finished timer
#[derive(Debug, Clone, Serialize)]
pub struct Timing {
    pub name: String,
    pub millis: f64,
}

#[derive(Debug, Default)]
struct Record {
    counters: BTreeMap<String, u64>,
    timings: Vec<Timing>,
}

/// Counters and timings of the current run, in completion order
pub struct RunMetrics {
    record: Mutex<Record>,
    started: Instant,
}

impl RunMetrics {
    fn new() -> Self {
        Self {
            record: Mutex::new(Record::default()),
            started: Instant::now(),
        }
    }

    pub fn increment(&self, name: &str) {
        if let Ok(mut record) = self.record.lock() {
            *record.counters.entry(name.to_string()).or_insert(0) += 1;
        }
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.record
            .lock()
            .ok()
            .and_then(|r| r.counters.get(name).copied())
            .unwrap_or(0)
    }

    fn record_timing(&self, name: &str, elapsed: Duration) {
        if let Ok(mut record) = self.record.lock() {
            record.timings.push(Timing {
                name: name.to_string(),
                millis: elapsed.as_secs_f64() * 1000.0,
            });
        }
    }

    /// Timings recorded under `name`
    pub fn timings(&self, name: &str) -> Vec<Timing> {
        self.record
            .lock()
            .map(|r| r.timings.iter().filter(|t| t.name == name).cloned().collect())
            .unwrap_or_default()
    }

    /// Session id, elapsed time, counters and timings as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let (counters, timings) = self
            .record
            .lock()
            .map(|r| (r.counters.clone(), r.timings.clone()))
            .unwrap_or_default();

        serde_json::json!({
            "session": session_id(),
            "elapsed_ms": self.started.elapsed().as_millis() as u64,
            "counters": counters,
            "timings": timings,
        })
    }
}

/// The process-wide run record
pub fn metrics() -> &'static RunMetrics {
    &METRICS
}

/// Measures one operation; recorded on `stop` or when dropped
pub struct Timer {
    name: String,
    start: Instant,
    stopped: bool,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            stopped: false,
        }
    }

    pub fn stop(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        self.finish(elapsed);
        elapsed
    }

    fn finish(&mut self, elapsed: Duration) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        metrics().record_timing(&self.name, elapsed);
        tracing::trace!(timer = %self.name, ms = elapsed.as_millis() as u64, "timer stopped");
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.finish(elapsed);
    }
}
