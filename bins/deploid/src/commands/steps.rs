//! Commands that resolve step names and run them as a pipeline

use crate::registry::Builtins;
use deploid_cli::format_duration;
use deploid_core::{config, CancelToken, Context, Flags, Logger, PluginLoader, Result};
use deploid_telemetry::{metrics, Timer};
use std::path::Path;

/// Which steps a command runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The steps implied by the configuration (`assets`, then the packager)
    Configured,
    /// Steps by name, in the order given
    Named(Vec<String>),
}

/// Load the configuration, resolve the selection and run it
pub async fn run(
    cwd: &Path,
    selection: Selection,
    flags: Flags,
    debug: bool,
    logger: Logger,
) -> Result<()> {
    let loaded = config::load(cwd)?;
    logger.debug(format!("config: {}", loaded.path.display()));
    logger.env_dump(cwd);

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received");
            on_interrupt.cancel();
        }
    });

    let ctx = Context::new(cwd, loaded.config, logger)
        .with_debug(debug)
        .with_flags(flags)
        .with_cancel(cancel);

    let loader = PluginLoader::new(Builtins::default());
    let pipeline = match &selection {
        Selection::Configured => loader.load_from_config(&ctx)?,
        Selection::Named(names) => loader.load_all(names.as_slice(), &ctx)?,
    };
    ctx.logger
        .debug(format!("pipeline: {}", pipeline.names().join(" -> ")));

    let timer = Timer::start("pipeline");
    let outcome = pipeline.run(&ctx).await;
    let elapsed = timer.stop();
    ctx.logger.debug(format!("pipeline finished in {}", format_duration(elapsed)));
    if debug {
        tracing::debug!(metrics = %metrics().export_json(), "session metrics");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploid_core::{ErrorCode, LogLevel};
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
appName = "Demo"
appId = "com.x.demo"

[web]
framework = "vite"
buildCommand = "true"

[android]
packaging = "tauri"
"#;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("deploid.config.toml"), CONFIG).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_missing_config_fails() {
        let dir = TempDir::new().unwrap();
        let (logger, _) = Logger::capture(LogLevel::Debug);
        let err = run(dir.path(), Selection::Configured, Flags::default(), false, logger)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[tokio::test]
    async fn test_configured_unsupported_engine_warns() {
        let dir = project();
        let (logger, buffer) = Logger::capture(LogLevel::Debug);
        run(dir.path(), Selection::Configured, Flags::default(), false, logger)
            .await
            .unwrap();
        let out = buffer.contents();
        assert!(out.contains("pipeline: packager-tauri"));
        assert!(out.contains("Packaging engine 'tauri' is not supported yet"));
    }

    #[tokio::test]
    async fn test_unknown_step_stops_before_running() {
        let dir = project();
        let (logger, buffer) = Logger::capture(LogLevel::Debug);
        let names = vec!["packager-tauri".to_string(), "teleport".to_string()];
        let err = run(dir.path(), Selection::Named(names), Flags::default(), false, logger)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StepNotFound);
        assert!(!buffer.contents().contains("not supported yet"));
    }
}
