//! `publish`: GitHub release and Play Console upload

use crate::gradle::{find_artifact, GradleTask};
use crate::project::AndroidProject;
use crate::tools::Toolbox;
use async_trait::async_trait;
use deploid_core::process::CommandLine;
use deploid_core::{Context, Error, Result, Step};
use std::path::Path;

/// Play service account key: a file path or the JSON itself
pub const PLAY_JSON_KEY_ENV: &str = "DEPLOID_PLAY_JSON_KEY";

const DEFAULT_TRACK: &str = "internal";

#[derive(Debug, Clone)]
pub struct PublishStep {
    tools: Toolbox,
    play_key: Option<String>,
}

impl Default for PublishStep {
    fn default() -> Self {
        Self::new(Toolbox::default())
    }
}

impl PublishStep {
    /// Reads the Play key from `DEPLOID_PLAY_JSON_KEY`
    pub fn new(tools: Toolbox) -> Self {
        Self {
            tools,
            play_key: std::env::var(PLAY_JSON_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn with_play_key(mut self, key: Option<String>) -> Self {
        self.play_key = key;
        self
    }

    fn github_release(&self, ctx: &Context, repo: &str, artifact: &Path) -> Result<CommandLine> {
        let version = ctx
            .config
            .android
            .version_name
            .as_deref()
            .ok_or_else(|| Error::missing_field("android.versionName", self.name()))?;
        Ok(self.tools.gh.command().args([
            "release".to_string(),
            "create".to_string(),
            format!("v{}", version),
            artifact.to_string_lossy().into_owned(),
            "--repo".to_string(),
            repo.to_string(),
            "--title".to_string(),
            format!("{} {}", ctx.config.app_name, version),
            "--generate-notes".to_string(),
        ]))
    }

    fn play_upload(&self, ctx: &Context, key: &str, bundle: &Path) -> CommandLine {
        let track = ctx
            .config
            .publish
            .as_ref()
            .map_or(DEFAULT_TRACK, |p| p.track.as_str());
        let aab = bundle.to_string_lossy();
        let command = self.tools.fastlane.command().args([
            "supply",
            "--aab",
            aab.as_ref(),
            "--track",
            track,
            "--package_name",
            ctx.config.app_id.as_str(),
        ]);
        if key.trim_start().starts_with('{') {
            command.arg("--json_key_data").secret_arg(key)
        } else {
            command.arg("--json_key").arg(key)
        }
    }
}

#[async_trait]
impl Step for PublishStep {
    fn name(&self) -> &str {
        "publish"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let repo = ctx.config.publish.as_ref().and_then(|p| p.repo.as_deref());
        if repo.is_none() && self.play_key.is_none() {
            return Err(Error::validation("Nothing to publish to")
                .with_suggestion(format!(
                    "Set publish.repo for GitHub releases or export {} for Google Play",
                    PLAY_JSON_KEY_ENV
                )));
        }

        let project = AndroidProject::for_context(ctx);

        if let Some(repo) = repo {
            let bundle = ctx
                .flags
                .bundle
                .unwrap_or(ctx.config.android.build.bundle);
            let artifact = find_artifact(project.root(), GradleTask::select(true, bundle))?;
            ctx.run(self.github_release(ctx, repo, &artifact)?).await?;
            ctx.logger
                .success(format!("Published {} to {}", artifact.display(), repo));
        }

        if let Some(key) = &self.play_key {
            let bundle = find_artifact(project.root(), GradleTask::BundleRelease)?;
            let command = self.play_upload(ctx, key, &bundle);
            ctx.run(command).await?;
            ctx.logger.success(format!(
                "Uploaded {} to Google Play",
                bundle.file_name().map_or_else(
                    || bundle.display().to_string(),
                    |n| n.to_string_lossy().into_owned()
                )
            ));
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tools::testing::{calls, recording_toolbox};
    use deploid_core::testing::{config_from, context_with, demo_config_json, demo_context};
    use deploid_core::ErrorCode;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn artifacts(root: &Path) {
        for (dir, file) in [
            ("apk/release", "app-release.apk"),
            ("bundle/release", "app-release.aab"),
        ] {
            let dir = root.join("android/app/build/outputs").join(dir);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(file), "x").unwrap();
        }
    }

    fn with_repo(root: &Path) -> Context {
        let mut json = demo_config_json();
        json["android"]["versionName"] = json!("1.2.0");
        json["publish"] = json!({ "repo": "acme/demo", "track": "beta" });
        context_with(root, config_from(json)).0
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = demo_context(dir.path());
        let err = PublishStep::new(recording_toolbox(&dir.path().join("calls.log")))
            .with_play_key(None)
            .run(&ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.suggestion.unwrap().contains(PLAY_JSON_KEY_ENV));
    }

    #[tokio::test]
    async fn test_github_release() {
        let dir = TempDir::new().unwrap();
        artifacts(dir.path());
        let log = dir.path().join("calls.log");
        let ctx = with_repo(dir.path());

        PublishStep::new(recording_toolbox(&log))
            .with_play_key(None)
            .run(&ctx)
            .await
            .unwrap();

        let calls = calls(&log);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("gh release create v1.2.0 "));
        assert!(calls[0].contains("app-release.apk --repo acme/demo --title Demo 1.2.0 --generate-notes"));
    }

    #[tokio::test]
    async fn test_github_release_needs_version_name() {
        let dir = TempDir::new().unwrap();
        artifacts(dir.path());
        let mut json = demo_config_json();
        json["publish"] = json!({ "repo": "acme/demo" });
        let (ctx, _) = context_with(dir.path(), config_from(json));

        let err = PublishStep::new(recording_toolbox(&dir.path().join("calls.log")))
            .with_play_key(None)
            .run(&ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
    }

    #[tokio::test]
    async fn test_play_upload_masks_inline_key() {
        let dir = TempDir::new().unwrap();
        artifacts(dir.path());
        let log = dir.path().join("calls.log");
        let mut json = demo_config_json();
        json["publish"] = json!({ "track": "beta" });
        let (ctx, buffer) = context_with(dir.path(), config_from(json));

        PublishStep::new(recording_toolbox(&log))
            .with_play_key(Some(r#"{"private_key":"k"}"#.to_string()))
            .run(&ctx)
            .await
            .unwrap();

        let calls = calls(&log);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("fastlane supply --aab "));
        assert!(calls[0].contains("app-release.aab --track beta --package_name com.x.demo --json_key_data"));
        assert!(buffer.contents().contains("--json_key_data ***"));
        assert!(!buffer.contents().contains("private_key"));
    }

    #[tokio::test]
    async fn test_play_upload_with_key_file() {
        let dir = TempDir::new().unwrap();
        artifacts(dir.path());
        let log = dir.path().join("calls.log");
        let (ctx, _) = demo_context(dir.path());

        PublishStep::new(recording_toolbox(&log))
            .with_play_key(Some("/secrets/play.json".to_string()))
            .run(&ctx)
            .await
            .unwrap();

        assert!(calls(&log)[0].ends_with("--track internal --package_name com.x.demo --json_key /secrets/play.json"));
    }
}
