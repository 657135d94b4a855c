//! Running the configured web build

use crate::bundle::{analyze, BundleReport};
use crate::presets::preset;
use deploid_core::process::CommandLine;
use deploid_core::{Context, Error, Result};

/// Run `web.buildCommand` in the project root and check `web.webDir`
///
/// The command goes through the platform shell so `npm run build && ...`
/// style commands work. Returns the bundle report of the output directory.
pub async fn build_web(ctx: &Context) -> Result<BundleReport> {
    let web = &ctx.config.web;
    ctx.logger.info(format!("Building web app ({})", web.framework));
    ctx.run(CommandLine::shell(web.build_command.clone())).await?;

    let web_dir = ctx.path(&web.web_dir);
    ctx.logger.file_check("web output", &web_dir);
    if !web_dir.is_dir() {
        let mut err = Error::directory_not_found(&web_dir)
            .with_context(format!("`{}` finished but produced no output there", web.build_command));
        if let Some(p) = preset(&web.framework) {
            err = err.with_suggestion(format!(
                "{} builds usually land in `{}`; set web.webDir accordingly",
                p.framework, p.web_dir
            ));
        }
        return Err(err);
    }

    let report = analyze(&web_dir)?;
    tracing::debug!(files = report.file_count, bytes = report.total_size, "web bundle analyzed");
    report.log(&ctx.logger);
    Ok(report)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use deploid_core::testing::{config_from, context_with, demo_config_json};
    use deploid_core::ErrorCode;
    use tempfile::TempDir;

    fn context_for(dir: &TempDir, build_command: &str) -> (Context, deploid_core::logger::LogBuffer) {
        let mut json = demo_config_json();
        json["web"]["buildCommand"] = build_command.into();
        context_with(dir.path(), config_from(json))
    }

    #[tokio::test]
    async fn test_build_reports_bundle() {
        let dir = TempDir::new().unwrap();
        let (ctx, buffer) = context_for(&dir, "mkdir -p dist && printf 'hello' > dist/index.html");

        let report = build_web(&ctx).await.unwrap();
        assert_eq!(report.file_count, 1);
        assert_eq!(report.total_size, 5);
        assert!(buffer.contents().contains("Web bundle: 5 B in 1 file"));
    }

    #[tokio::test]
    async fn test_missing_output_suggests_preset_dir() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = context_for(&dir, "true");

        let err = build_web(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DirectoryNotFound);
        assert!(err.suggestion.unwrap().contains("`dist`"));
    }

    #[tokio::test]
    async fn test_failing_build_command_stops() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = context_for(&dir, "exit 2");

        let err = build_web(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CommandFailed);
    }
}
