//! Step resolution
//!
//! A step name resolves in two tiers:
//!
//! 1. a project-local package under `node_modules/@deploid/<name>`, run as an
//!    external command ([`ExternalStep`])
//! 2. the bundled implementation registered for the matching [`StepId`]
//!
//! Anything else is a `StepNotFound` error naming the step.

use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::process::CommandLine;
use crate::step::{BoxedStep, Step, StepId, StepOrigin};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory holding project-local step packages
pub const LOCAL_PACKAGE_DIR: &str = "node_modules/@deploid";

/// Table of compiled-in step implementations
pub trait BundledSteps: Send + Sync {
    /// Implementation for `id`, or `None` when this build has none
    fn resolve(&self, id: &StepId) -> Option<BoxedStep>;
}

impl<F> BundledSteps for F
where
    F: Fn(&StepId) -> Option<BoxedStep> + Send + Sync,
{
    fn resolve(&self, id: &StepId) -> Option<BoxedStep> {
        self(id)
    }
}

/// Resolves step names to runnable steps
pub struct PluginLoader {
    bundled: Box<dyn BundledSteps>,
}

impl PluginLoader {
    pub fn new(bundled: impl BundledSteps + 'static) -> Self {
        Self {
            bundled: Box::new(bundled),
        }
    }

    /// Resolve one step by name, project-local package first
    pub fn load(&self, name: &str, ctx: &Context) -> Result<BoxedStep> {
        check_step_name(name)?;

        for package in local_package_names(name) {
            if let Some(step) = load_local(name, &package, &ctx.cwd)? {
                tracing::debug!(step = name, package = %package, "resolved project-local step");
                return Ok(Box::new(step));
            }
        }

        let id = StepId::parse(name).ok_or_else(|| {
            Error::step_not_found(
                name,
                format!(
                    "no package at {} and no bundled step with that name",
                    local_package_dir(&ctx.cwd, name).display()
                ),
            )
        })?;

        self.bundled
            .resolve(&id)
            .ok_or_else(|| Error::step_not_found(name, "no bundled implementation in this build"))
    }

    /// Resolve several names into a pipeline, preserving order
    pub fn load_all<S: AsRef<str>>(&self, names: &[S], ctx: &Context) -> Result<Pipeline> {
        let mut pipeline = Pipeline::default();
        for name in names {
            pipeline.push(self.load(name.as_ref(), ctx)?);
        }
        Ok(pipeline)
    }

    /// Resolve the steps implied by the configuration
    pub fn load_from_config(&self, ctx: &Context) -> Result<Pipeline> {
        self.load_all(&step_names_from_config(&ctx.config), ctx)
    }
}

/// Step names derived from configuration: `assets` when an asset source is
/// configured, then the packager for the configured engine
pub fn step_names_from_config(config: &Config) -> Vec<String> {
    let mut names = Vec::new();
    if config.assets.is_some() {
        names.push(StepId::Assets.name());
    }
    names.push(StepId::packager(&config.android.packaging).name());
    names
}

/// Where a project-local package for `name` would live
pub fn local_package_dir(cwd: &Path, name: &str) -> PathBuf {
    cwd.join(LOCAL_PACKAGE_DIR).join(name)
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    deploid: Option<DeploidSection>,
}

#[derive(Debug, Deserialize)]
struct DeploidSection {
    #[serde(default)]
    entry: Option<String>,
    #[serde(default)]
    command: Option<Vec<String>>,
}

/// Step names address a directory under the package scope and never leave it
fn check_step_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', ':']) {
        return Err(Error::step_not_found(
            name,
            "step names cannot be empty, start with `.` or contain path separators",
        ));
    }
    Ok(())
}

/// Package directories to probe: the name as given, then the bundled
/// spelling (`ios_init` also finds `@deploid/ios-init`)
fn local_package_names(name: &str) -> Vec<String> {
    let given = name.trim().to_string();
    match StepId::parse(name).map(|id| id.name()) {
        Some(canonical) if canonical != given => vec![given, canonical],
        _ => vec![given],
    }
}

fn load_local(name: &str, package: &str, cwd: &Path) -> Result<Option<ExternalStep>> {
    let package_dir = local_package_dir(cwd, package);
    let manifest_path = package_dir.join("package.json");
    if !manifest_path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&manifest_path)?;
    let manifest: PackageManifest = serde_json::from_str(&content)
        .map_err(|e| Error::invalid_step_package(name, format!("{}: {}", manifest_path.display(), e)))?;

    let section = manifest.deploid.unwrap_or(DeploidSection {
        entry: None,
        command: None,
    });

    let command = match section.command {
        Some(command) if !command.is_empty() => command,
        Some(_) => return Err(Error::invalid_step_package(name, "`deploid.command` is empty")),
        None => {
            let entry = section
                .entry
                .or(manifest.main)
                .unwrap_or_else(|| "index.js".to_string());
            let entry_path = package_dir.join(&entry);
            if !entry_path.is_file() {
                return Err(Error::invalid_step_package(
                    name,
                    format!("entry point {} does not exist", entry_path.display()),
                ));
            }
            vec!["node".to_string(), entry_path.to_string_lossy().to_string()]
        }
    };

    Ok(Some(ExternalStep {
        name: name.to_string(),
        package_dir,
        command,
    }))
}

/// A step implemented by a project-local package, run as a subprocess
///
/// The child runs in the project root and receives the configuration as JSON
/// in `DEPLOID_CONFIG`, plus `DEPLOID_STEP`, `DEPLOID_CWD`, `DEPLOID_DEBUG`
/// and `DEPLOID_PACKAGE_DIR`.
#[derive(Debug, Clone)]
pub struct ExternalStep {
    name: String,
    package_dir: PathBuf,
    command: Vec<String>,
}

impl ExternalStep {
    pub fn command(&self) -> &[String] {
        &self.command
    }
}

#[async_trait]
impl Step for ExternalStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> StepOrigin {
        StepOrigin::Local(self.package_dir.clone())
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::invalid_step_package(&self.name, "empty command"))?;

        let config_json = serde_json::to_string(&ctx.config)?;
        let command = CommandLine::new(program.clone())
            .args(args.iter().cloned())
            .current_dir(&ctx.cwd)
            .env("DEPLOID_CONFIG", config_json)
            .env("DEPLOID_STEP", self.name.clone())
            .env("DEPLOID_CWD", ctx.cwd.to_string_lossy())
            .env("DEPLOID_DEBUG", if ctx.debug { "1" } else { "0" })
            .env("DEPLOID_PACKAGE_DIR", self.package_dir.to_string_lossy());

        ctx.run(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{demo_config, demo_context};
    use crate::error::ErrorCode;
    use std::fs;
    use tempfile::TempDir;

    struct Sentinel(String);

    #[async_trait]
    impl Step for Sentinel {
        fn name(&self) -> &str {
            &self.0
        }

        async fn run(&self, ctx: &Context) -> Result<()> {
            ctx.logger.info("bundled sentinel ran");
            Ok(())
        }
    }

    fn bundled_loader() -> PluginLoader {
        PluginLoader::new(|id: &StepId| match id {
            StepId::Assets | StepId::Build => Some(Box::new(Sentinel(id.name())) as BoxedStep),
            _ => None,
        })
    }

    fn write_package(cwd: &Path, name: &str, manifest: &str) -> PathBuf {
        let dir = local_package_dir(cwd, name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
        dir
    }

    #[test]
    fn test_bundled_fallback() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = demo_context(dir.path());
        let step = bundled_loader().load("assets", &ctx).unwrap();
        assert_eq!(step.origin(), StepOrigin::Bundled);
        assert_eq!(step.name(), "assets");
    }

    #[tokio::test]
    async fn test_local_package_wins_over_bundled() {
        let dir = TempDir::new().unwrap();
        let package_dir = write_package(
            dir.path(),
            "assets",
            r#"{ "name": "@deploid/assets", "deploid": { "command": ["sh", "-c", "echo $DEPLOID_STEP > local-ran.txt"] } }"#,
        );
        let (ctx, buffer) = demo_context(dir.path());

        let step = bundled_loader().load("assets", &ctx).unwrap();
        assert_eq!(step.origin(), StepOrigin::Local(package_dir));

        if cfg!(unix) {
            step.run(&ctx).await.unwrap();
            let marker = fs::read_to_string(dir.path().join("local-ran.txt")).unwrap();
            assert_eq!(marker.trim(), "assets");
            assert!(!buffer.contents().contains("bundled sentinel ran"));
        }
    }

    #[test]
    fn test_local_package_uses_main_entry() {
        let dir = TempDir::new().unwrap();
        let package_dir = write_package(dir.path(), "lint", r#"{ "main": "lib/step.js" }"#);
        fs::create_dir_all(package_dir.join("lib")).unwrap();
        fs::write(package_dir.join("lib/step.js"), "").unwrap();
        let (ctx, _) = demo_context(dir.path());

        let step = bundled_loader().load("lint", &ctx).unwrap();
        assert!(matches!(step.origin(), StepOrigin::Local(_)));
        assert_eq!(step.name(), "lint");
    }

    #[test]
    fn test_local_package_with_missing_entry_is_error() {
        let dir = TempDir::new().unwrap();
        write_package(dir.path(), "build", r#"{ "name": "@deploid/build" }"#);
        let (ctx, _) = demo_context(dir.path());

        let err = bundled_loader().load("build", &ctx).err().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidStepPackage);
        assert!(err.context.unwrap().contains("index.js"));
    }

    #[test]
    fn test_path_like_names_are_rejected() {
        let dir = TempDir::new().unwrap();
        let outside = dir.path().join("x");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("package.json"), r#"{ "deploid": { "command": ["true"] } }"#).unwrap();
        let cwd = dir.path().join("app");
        fs::create_dir_all(&cwd).unwrap();
        let (ctx, _) = demo_context(&cwd);

        for name in ["../../x", "../x", "..", "a/b", "a\\b", ".hidden", ""] {
            let err = bundled_loader().load(name, &ctx).err().unwrap();
            assert_eq!(err.code, ErrorCode::StepNotFound, "{}", name);
            assert!(err.context.unwrap().contains("path separators"));
        }
    }

    #[test]
    fn test_local_package_found_by_bundled_spelling() {
        let dir = TempDir::new().unwrap();
        let package_dir = write_package(
            dir.path(),
            "ios-init",
            r#"{ "deploid": { "command": ["true"] } }"#,
        );
        let (ctx, _) = demo_context(dir.path());

        let step = bundled_loader().load("ios_init", &ctx).unwrap();
        assert_eq!(step.origin(), StepOrigin::Local(package_dir));
        assert_eq!(step.name(), "ios_init");
    }

    #[test]
    fn test_unknown_step_names_the_step() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = demo_context(dir.path());

        let err = bundled_loader().load("teleport", &ctx).err().unwrap();
        assert_eq!(err.code, ErrorCode::StepNotFound);
        assert!(err.message.contains("teleport"));

        let err = bundled_loader().load("publish", &ctx).err().unwrap();
        assert_eq!(err.code, ErrorCode::StepNotFound);
        assert!(err.message.contains("publish"));
    }

    #[test]
    fn test_step_names_from_config() {
        let mut config = demo_config();
        assert_eq!(step_names_from_config(&config), vec!["packager-capacitor"]);

        config.assets = Some(Default::default());
        config.android.packaging = "Tauri".to_string();
        assert_eq!(step_names_from_config(&config), vec!["assets", "packager-tauri"]);
    }

    #[test]
    fn test_load_all_keeps_order() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = demo_context(dir.path());
        let pipeline = bundled_loader().load_all(&["build", "assets"], &ctx).unwrap();
        assert_eq!(pipeline.names(), vec!["build", "assets"]);
    }
}
