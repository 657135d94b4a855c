//! `deploid plugin`: manage project-local step packages
//!
//! Packages live under `node_modules/@deploid/<name>` and take precedence
//! over bundled steps of the same name.

use clap::Subcommand;
use deploid_cli::{format_count, Status};
use deploid_core::loader::LOCAL_PACKAGE_DIR;
use deploid_core::process::{self, CommandLine};
use deploid_core::{Error, Logger, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

const SCOPE: &str = "@deploid";

#[derive(Subcommand, Debug, Clone)]
pub enum PluginAction {
    /// Install a step package as a dev dependency
    Add { name: String },
    /// Uninstall a step package
    Remove { name: String },
    /// List installed step packages
    List,
}

/// An installed package as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    pub step: String,
    pub version: String,
    pub runner: String,
}

pub async fn run(cwd: &Path, action: PluginAction, logger: &Logger) -> Result<()> {
    match action {
        PluginAction::Add { name } => {
            let package = package_name(&name)?;
            npm(cwd, logger, &["install", "--save-dev", &package]).await?;
            Status::success(&format!("Installed {}", package));
        }
        PluginAction::Remove { name } => {
            let package = package_name(&name)?;
            npm(cwd, logger, &["uninstall", &package]).await?;
            Status::success(&format!("Removed {}", package));
        }
        PluginAction::List => {
            let plugins = installed(cwd)?;
            if plugins.is_empty() {
                Status::info(&format!("No step packages under {}", LOCAL_PACKAGE_DIR));
                return Ok(());
            }
            Status::header(&format!(
                "{} installed",
                format_count(plugins.len(), "step package", "step packages")
            ));
            let width = plugins.iter().map(|p| p.step.len()).max().unwrap_or(0);
            for plugin in &plugins {
                Status::row(
                    &plugin.step,
                    &format!("{}  {}", plugin.version, plugin.runner),
                    width,
                );
            }
        }
    }
    Ok(())
}

/// `@deploid/<name>` for a bare step name
fn package_name(name: &str) -> Result<String> {
    let bare = name.strip_prefix("@deploid/").unwrap_or(name).trim();
    let valid = !bare.is_empty()
        && bare
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.');
    if !valid {
        return Err(Error::validation(format!("Invalid step package name '{}'", name))
            .with_suggestion("Use the step name, e.g. `deploid plugin add sentry-upload`"));
    }
    Ok(format!("{}/{}", SCOPE, bare))
}

async fn npm(cwd: &Path, logger: &Logger, args: &[&str]) -> Result<()> {
    let command = CommandLine::new("npm").args(args.iter().copied()).current_dir(cwd);
    logger.command(&command);
    process::status_checked(&command).await
}

/// Step packages installed in the project, sorted by name
pub fn installed(cwd: &Path) -> Result<Vec<InstalledPlugin>> {
    let scope_dir = cwd.join(LOCAL_PACKAGE_DIR);
    if !scope_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut plugins = Vec::new();
    for entry in fs::read_dir(&scope_dir)? {
        let entry = entry?;
        let manifest_path = entry.path().join("package.json");
        if !manifest_path.is_file() {
            continue;
        }
        let step = entry.file_name().to_string_lossy().into_owned();
        let manifest: Value = match fs::read_to_string(&manifest_path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
        {
            Some(value) => value,
            None => {
                tracing::warn!(path = %manifest_path.display(), "unreadable package.json");
                continue;
            }
        };

        let version = manifest
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        let runner = match manifest.pointer("/deploid/command").and_then(Value::as_array) {
            Some(argv) => argv
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            None => {
                let entry = manifest
                    .pointer("/deploid/entry")
                    .or_else(|| manifest.get("main"))
                    .and_then(Value::as_str)
                    .unwrap_or("index.js");
                format!("node {}", entry)
            }
        };
        plugins.push(InstalledPlugin {
            step,
            version,
            runner,
        });
    }
    plugins.sort_by(|a, b| a.step.cmp(&b.step));
    Ok(plugins)
}
