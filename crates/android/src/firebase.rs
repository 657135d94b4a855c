//! `firebase`: register the Android app and wire up google-services

use crate::gradle::{GoogleServicesClasspath, GoogleServicesPlugin};
use crate::patch::patch_file;
use crate::project::AndroidProject;
use crate::tools::Toolbox;
use async_trait::async_trait;
use deploid_core::process::CommandLine;
use deploid_core::{Context, Error, Result, ResultExt, Step};
use serde::Deserialize;

/// CI token for the Firebase CLI
pub const FIREBASE_TOKEN_ENV: &str = "FIREBASE_TOKEN";

/// Envelope of `firebase ... --json` output
#[derive(Debug, Deserialize)]
struct Response<T> {
    result: T,
}

/// An app registered in a Firebase project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseApp {
    pub app_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
}

/// Apps listed by `firebase apps:list ANDROID --json`
pub fn parse_app_list(json: &str) -> Result<Vec<FirebaseApp>> {
    let response: Response<Vec<FirebaseApp>> = serde_json::from_str(json)
        .map_err(Error::from)
        .context("unexpected output from `firebase apps:list`")?;
    Ok(response.result)
}

/// App created by `firebase apps:create ANDROID --json`
pub fn parse_created_app(json: &str) -> Result<FirebaseApp> {
    let response: Response<FirebaseApp> = serde_json::from_str(json)
        .map_err(Error::from)
        .context("unexpected output from `firebase apps:create`")?;
    Ok(response.result)
}

#[derive(Debug, Clone)]
pub struct FirebaseStep {
    tools: Toolbox,
    token: Option<String>,
}

impl Default for FirebaseStep {
    fn default() -> Self {
        Self::new(Toolbox::default())
    }
}

impl FirebaseStep {
    /// Reads the CI token from `FIREBASE_TOKEN`
    pub fn new(tools: Toolbox) -> Self {
        Self {
            tools,
            token: std::env::var(FIREBASE_TOKEN_ENV)
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn firebase<I, S>(&self, args: I, project_id: &str) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = self
            .tools
            .firebase
            .command()
            .args(args)
            .args(["--project", project_id]);
        match &self.token {
            Some(token) => command.arg("--token").secret_arg(token.clone()),
            None => command,
        }
    }

    async fn find_or_create_app(&self, ctx: &Context, project_id: &str) -> Result<String> {
        let app_id = ctx.config.app_id.as_str();
        let listed = ctx
            .capture_checked(self.firebase(["apps:list", "ANDROID", "--json"], project_id))
            .await?;
        let existing = parse_app_list(&listed.stdout)?
            .into_iter()
            .find(|app| app.package_name.as_deref() == Some(app_id));

        if let Some(app) = existing {
            ctx.logger
                .info(format!("Using Firebase app {} for {}", app.app_id, app_id));
            return Ok(app.app_id);
        }

        ctx.logger
            .info(format!("Registering {} in Firebase project {}", app_id, project_id));
        let created = ctx
            .capture_checked(self.firebase(
                [
                    "apps:create",
                    "ANDROID",
                    ctx.config.app_name.as_str(),
                    "--package-name",
                    app_id,
                    "--json",
                ],
                project_id,
            ))
            .await?;
        Ok(parse_created_app(&created.stdout)?.app_id)
    }
}

#[async_trait]
impl Step for FirebaseStep {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let project_id = ctx
            .config
            .firebase
            .as_ref()
            .map(|f| f.project_id.trim())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field("firebase.projectId", self.name()))?;

        let project = AndroidProject::for_context(ctx);
        if !project.exists() {
            return Err(Error::directory_not_found(project.root())
                .with_suggestion("Run `deploid package` before `deploid firebase`"));
        }

        let firebase_app = self.find_or_create_app(ctx, project_id).await?;
        let out = project.google_services();
        ctx.run(self.firebase(
            [
                "apps:sdkconfig".to_string(),
                "ANDROID".to_string(),
                firebase_app,
                "--out".to_string(),
                out.to_string_lossy().into_owned(),
            ],
            project_id,
        ))
        .await?;
        ctx.logger.file_check("google-services.json", &out);

        patch_file(ctx, &project.root_gradle(), &GoogleServicesClasspath)?;
        patch_file(ctx, &project.app_gradle(), &GoogleServicesPlugin)?;

        ctx.logger
            .success(format!("Firebase configured for project {}", project_id));
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tools::testing::{calls, recording_toolbox};
    use crate::tools::Tool;
    use deploid_core::testing::{config_from, context_with, demo_config_json, demo_context};
    use deploid_core::ErrorCode;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const LISTED: &str = r#"{"status":"success","result":[{"appId":"1:42:android:abc","displayName":"Demo","platform":"ANDROID","packageName":"com.x.demo"}]}"#;
    const CREATED: &str = r#"{"status":"success","result":{"appId":"1:42:android:new","packageName":"com.x.demo"}}"#;

    /// firebase stand-in answering `apps:list` with `listing`
    fn fake_firebase(log: &Path, listing: &str) -> Toolbox {
        let script = format!(
            r#"echo "firebase $*" >> '{log}'
case "$1" in
  apps:list) printf '%s' '{listing}' ;;
  apps:create) printf '%s' '{created}' ;;
esac"#,
            log = log.display(),
            listing = listing,
            created = CREATED
        );
        let mut tools = recording_toolbox(log);
        tools.firebase = Tool::with_prefix(["sh".to_string(), "-c".to_string(), script, "firebase".to_string()]);
        tools
    }

    fn configured(root: &Path) -> (Context, deploid_core::logger::LogBuffer) {
        let mut json = demo_config_json();
        json["firebase"] = json!({ "projectId": "demo-proj" });
        context_with(root, config_from(json))
    }

    fn scaffold(root: &Path) {
        fs::create_dir_all(root.join("android/app")).unwrap();
        fs::write(
            root.join("android/build.gradle"),
            "buildscript {\n    dependencies {\n        classpath 'com.android.tools.build:gradle:8.2.1'\n    }\n}\n",
        )
        .unwrap();
        fs::write(
            root.join("android/app/build.gradle"),
            "apply plugin: 'com.android.application'\n\nandroid {\n}\n",
        )
        .unwrap();
    }

    #[test]
    fn test_parse_app_list() {
        let apps = parse_app_list(LISTED).unwrap();
        assert_eq!(apps[0].app_id, "1:42:android:abc");
        assert_eq!(apps[0].package_name.as_deref(), Some("com.x.demo"));
        assert!(parse_app_list(r#"{"result":[]}"#).unwrap().is_empty());

        let err = parse_app_list("Error: not logged in").unwrap_err();
        assert!(err.context.unwrap().contains("apps:list"));
    }

    #[tokio::test]
    async fn test_requires_project_id() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = demo_context(dir.path());
        let err = FirebaseStep::new(recording_toolbox(&dir.path().join("calls.log")))
            .run(&ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("firebase.projectId"));
    }

    #[tokio::test]
    async fn test_existing_app_is_reused() {
        let dir = TempDir::new().unwrap();
        scaffold(dir.path());
        let log = dir.path().join("calls.log");
        let (ctx, buffer) = configured(dir.path());

        FirebaseStep::new(fake_firebase(&log, LISTED))
            .with_token(Some("tok-123".to_string()))
            .run(&ctx)
            .await
            .unwrap();

        let calls = calls(&log);
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            "firebase apps:list ANDROID --json --project demo-proj --token tok-123"
        );
        assert!(calls[1].starts_with("firebase apps:sdkconfig ANDROID 1:42:android:abc --out "));
        assert!(calls[1].contains("android/app/google-services.json"));

        let root = fs::read_to_string(dir.path().join("android/build.gradle")).unwrap();
        assert!(root.contains("com.google.gms:google-services"));
        let app = fs::read_to_string(dir.path().join("android/app/build.gradle")).unwrap();
        assert!(app.contains("com.google.gms.google-services"));

        let out = buffer.contents();
        assert!(out.contains("--token ***"));
        assert!(!out.contains("tok-123"));
    }

    #[tokio::test]
    async fn test_missing_app_is_created() {
        let dir = TempDir::new().unwrap();
        scaffold(dir.path());
        let log = dir.path().join("calls.log");
        let (ctx, _) = configured(dir.path());

        FirebaseStep::new(fake_firebase(&log, r#"{"result":[]}"#))
            .with_token(None)
            .run(&ctx)
            .await
            .unwrap();

        let calls = calls(&log);
        assert_eq!(
            calls[1],
            "firebase apps:create ANDROID Demo --package-name com.x.demo --json --project demo-proj"
        );
        assert!(calls[2].contains("1:42:android:new"));
    }
}
