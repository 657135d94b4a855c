//! The step contract and the closed set of bundled step identifiers

use crate::context::Context;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// Prefix joining `packager-` with a packaging engine tag
pub const PACKAGER_PREFIX: &str = "packager-";

/// Where a resolved step came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOrigin {
    /// Compiled into the toolchain
    Bundled,
    /// A package installed in the project
    Local(PathBuf),
}

/// One unit of pipeline work
#[async_trait]
pub trait Step: Send + Sync {
    /// Name used in logs and diagnostics
    fn name(&self) -> &str;

    fn origin(&self) -> StepOrigin {
        StepOrigin::Bundled
    }

    /// Perform the step against the shared context
    async fn run(&self, ctx: &Context) -> Result<()>;
}

/// Boxed step as produced by the plugin loader
pub type BoxedStep = Box<dyn Step>;

/// Identifiers of the steps shipped with the toolchain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepId {
    Assets,
    /// Native-wrapper packaging for the given engine tag
    Packager(String),
    Build,
    Debug,
    Deploy,
    Devices,
    Logs,
    Uninstall,
    Ios,
    IosInit,
    IosAssets,
    IosHandoff,
    Firebase,
    Publish,
}

impl StepId {
    /// Every fixed identifier; `Packager` is listed with the capacitor engine
    pub fn all() -> Vec<StepId> {
        vec![
            StepId::Assets,
            StepId::Packager("capacitor".to_string()),
            StepId::Build,
            StepId::Debug,
            StepId::Deploy,
            StepId::Devices,
            StepId::Logs,
            StepId::Uninstall,
            StepId::Ios,
            StepId::IosInit,
            StepId::IosAssets,
            StepId::IosHandoff,
            StepId::Firebase,
            StepId::Publish,
        ]
    }

    /// Parse a step name; hyphens, underscores and case are ignored
    pub fn parse(name: &str) -> Option<StepId> {
        let key = export_key(name);
        let id = match key.as_str() {
            "assets" => StepId::Assets,
            "build" => StepId::Build,
            "debug" => StepId::Debug,
            "deploy" => StepId::Deploy,
            "devices" => StepId::Devices,
            "logs" => StepId::Logs,
            "uninstall" => StepId::Uninstall,
            "ios" => StepId::Ios,
            "iosinit" => StepId::IosInit,
            "iosassets" => StepId::IosAssets,
            "ioshandoff" => StepId::IosHandoff,
            "firebase" => StepId::Firebase,
            "publish" => StepId::Publish,
            other => {
                let engine = other.strip_prefix("packager")?;
                if engine.is_empty() {
                    return None;
                }
                StepId::Packager(engine.to_string())
            }
        };
        Some(id)
    }

    /// Packaging step for an engine tag
    pub fn packager(engine: &str) -> StepId {
        StepId::Packager(export_key(engine))
    }

    /// Canonical hyphenated name
    pub fn name(&self) -> String {
        match self {
            StepId::Assets => "assets".to_string(),
            StepId::Packager(engine) => format!("{}{}", PACKAGER_PREFIX, engine),
            StepId::Build => "build".to_string(),
            StepId::Debug => "debug".to_string(),
            StepId::Deploy => "deploy".to_string(),
            StepId::Devices => "devices".to_string(),
            StepId::Logs => "logs".to_string(),
            StepId::Uninstall => "uninstall".to_string(),
            StepId::Ios => "ios".to_string(),
            StepId::IosInit => "ios-init".to_string(),
            StepId::IosAssets => "ios-assets".to_string(),
            StepId::IosHandoff => "ios-handoff".to_string(),
            StepId::Firebase => "firebase".to_string(),
            StepId::Publish => "publish".to_string(),
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Lookup key for a step name: lowercase with `-` and `_` removed
pub fn export_key(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
