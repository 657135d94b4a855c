//! `build`: web build, native sync, Gradle packaging

use crate::capacitor;
use crate::gradle::{find_artifact, task_command, GradleTask, KEYSTORE_PASSWORD_ENV, KEY_PASSWORD_ENV};
use crate::project::AndroidProject;
use crate::tools::Toolbox;
use async_trait::async_trait;
use deploid_cli::format_size;
use deploid_core::{Context, Error, Result, ResultExt, Step};
use std::path::PathBuf;

/// Keystore and key passwords for release signing
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SigningPasswords {
    pub keystore: Option<String>,
    pub key: Option<String>,
}

impl SigningPasswords {
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            keystore: read(KEYSTORE_PASSWORD_ENV),
            key: read(KEY_PASSWORD_ENV),
        }
    }

    /// Both passwords; the key password defaults to the keystore password
    fn resolve(&self) -> Result<(String, String)> {
        let keystore = self.keystore.clone().ok_or_else(|| {
            Error::validation("Release signing is configured but no keystore password is set")
                .with_suggestion(format!(
                    "Export {} (and {} if the key password differs)",
                    KEYSTORE_PASSWORD_ENV, KEY_PASSWORD_ENV
                ))
        })?;
        let key = self.key.clone().unwrap_or_else(|| keystore.clone());
        Ok((keystore, key))
    }
}

impl std::fmt::Debug for SigningPasswords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningPasswords")
            .field("keystore", &self.keystore.as_ref().map(|_| "***"))
            .field("key", &self.key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Builds the APK or AAB selected by flags and config
#[derive(Debug, Clone, Default)]
pub struct BuildStep {
    tools: Toolbox,
    passwords: Option<SigningPasswords>,
}

impl BuildStep {
    pub fn new(tools: Toolbox) -> Self {
        Self {
            tools,
            passwords: None,
        }
    }

    /// Use these passwords instead of reading the environment
    pub fn with_passwords(mut self, passwords: SigningPasswords) -> Self {
        self.passwords = Some(passwords);
        self
    }

    /// Task for the current flags, falling back to `android.build`
    pub fn task(ctx: &Context) -> GradleTask {
        let defaults = &ctx.config.android.build;
        GradleTask::select(
            ctx.flags.release.unwrap_or(defaults.release),
            ctx.flags.bundle.unwrap_or(defaults.bundle),
        )
    }

    /// Run the Gradle task and return the artifact it produced
    pub async fn package(&self, ctx: &Context, project: &AndroidProject) -> Result<PathBuf> {
        let task = Self::task(ctx);
        let mut command = task_command(project.root(), task);

        if task.is_release() {
            if ctx.config.android.signing.is_some() {
                let passwords = self.passwords.clone().unwrap_or_else(SigningPasswords::from_env);
                let (keystore, key) = passwords.resolve()?;
                command = command
                    .env(KEYSTORE_PASSWORD_ENV, keystore)
                    .env(KEY_PASSWORD_ENV, key);
            } else {
                ctx.logger
                    .warn("No android.signing configured, the release artifact will be unsigned");
            }
        }

        ctx.logger.info(format!("Running Gradle {}", task.name()));
        ctx.run(command)
            .await
            .with_suggestion("Check the Gradle output above; `deploid --debug build` shows the full command")?;
        find_artifact(project.root(), task)
    }
}

#[async_trait]
impl Step for BuildStep {
    fn name(&self) -> &str {
        "build"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        deploid_web::build_web(ctx).await?;

        let project = AndroidProject::for_context(ctx);
        if !project.exists() {
            return Err(Error::directory_not_found(project.root())
                .with_context("the native Android project has not been generated")
                .with_suggestion("Run `deploid package` first"));
        }
        capacitor::sync(ctx, &self.tools.capacitor, "android").await?;

        let artifact = self.package(ctx, &project).await?;
        let size = artifact.metadata().map(|m| m.len()).unwrap_or(0);
        ctx.logger.success(format!(
            "Built {} ({})",
            artifact.display(),
            format_size(size)
        ));
        Ok(())
    }
}
