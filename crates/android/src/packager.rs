//! Native wrapper packaging
//!
//! `packager-capacitor` generates or refreshes the Android project and applies
//! the configured manifest, Gradle and icon changes. Other engine tags resolve
//! to [`UnsupportedEngineStep`], which does nothing.

use crate::capacitor::{self, CAPACITOR_CONFIG};
use crate::gradle::{AppGradlePatch, SdkVersionsPatch};
use crate::manifest::{FullscreenPatch, ManifestPatch};
use crate::patch::{patch_file, PatchOutcome};
use crate::project::{AndroidProject, MIPMAP_DENSITIES};
use crate::tools::Toolbox;
use async_trait::async_trait;
use deploid_core::{Context, Result, Step};
use std::fs;
use std::path::Path;

/// Capacitor-based packaging
#[derive(Debug, Clone, Default)]
pub struct CapacitorPackager {
    tools: Toolbox,
}

impl CapacitorPackager {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }

    fn write_capacitor_config(&self, ctx: &Context) -> Result<()> {
        let path = ctx.path(CAPACITOR_CONFIG);
        let existing = capacitor::read_config(&path)?;
        let created = existing.is_none();
        let merged = capacitor::merged_config(existing, &ctx.config);
        capacitor::write_config(&path, &merged)?;
        ctx.logger.info(if created {
            format!("Created {}", CAPACITOR_CONFIG)
        } else {
            format!("Updated {}", CAPACITOR_CONFIG)
        });
        Ok(())
    }

    fn apply_patches(&self, ctx: &Context, project: &AndroidProject) -> Result<usize> {
        let android = &ctx.config.android;
        let mut outcomes = vec![
            patch_file(ctx, &project.manifest(), &ManifestPatch::from_config(android))?,
            patch_file(
                ctx,
                &project.variables_gradle(),
                &SdkVersionsPatch::from_config(android),
            )?,
            patch_file(
                ctx,
                &project.app_gradle(),
                &AppGradlePatch::from_config(android, &ctx.cwd)?,
            )?,
        ];
        if android.display.fullscreen {
            outcomes.push(patch_file(ctx, &project.styles(), &FullscreenPatch)?);
        }
        Ok(outcomes
            .into_iter()
            .filter(|o| *o == PatchOutcome::Changed)
            .count())
    }
}

#[async_trait]
impl Step for CapacitorPackager {
    fn name(&self) -> &str {
        "packager-capacitor"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        self.write_capacitor_config(ctx)?;

        let project = AndroidProject::for_context(ctx);
        if !project.exists() {
            capacitor::add_platform(ctx, &self.tools.capacitor, "android").await?;
        }
        capacitor::sync(ctx, &self.tools.capacitor, "android").await?;

        let patched = self.apply_patches(ctx, &project)?;
        ctx.logger.debug(format!("{} native files patched", patched));

        let copied = copy_launcher_icons(ctx, &project)?;
        if copied > 0 {
            ctx.logger
                .info(format!("Copied launcher icons for {} densities", copied));
        }

        ctx.logger.success(format!(
            "Android project ready at {}",
            project.root().display()
        ));
        Ok(())
    }
}

/// Copy generated `ic_launcher.png` files into the native resources
///
/// Each density is written as both `ic_launcher.png` and
/// `ic_launcher_round.png`. Returns the number of densities copied; a
/// project without an `assets` section keeps Capacitor's default icons.
pub fn copy_launcher_icons(ctx: &Context, project: &AndroidProject) -> Result<usize> {
    let Some(assets) = &ctx.config.assets else {
        ctx.logger
            .debug("no assets configured, keeping the default launcher icons");
        return Ok(0);
    };
    let generated = ctx.path(&assets.output).join("android");

    let mut copied = 0;
    for density in MIPMAP_DENSITIES {
        let source = generated
            .join(format!("mipmap-{}", density))
            .join("ic_launcher.png");
        if !source.is_file() {
            ctx.missing_input(&source, "Launcher icon")?;
            continue;
        }
        let target_dir = project.res_dir().join(format!("mipmap-{}", density));
        copy_icon(&source, &target_dir)?;
        copied += 1;
    }
    Ok(copied)
}

fn copy_icon(source: &Path, target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    for name in ["ic_launcher.png", "ic_launcher_round.png"] {
        fs::copy(source, target_dir.join(name))?;
    }
    Ok(())
}

/// Placeholder for packaging engines without an implementation
#[derive(Debug, Clone)]
pub struct UnsupportedEngineStep {
    name: String,
    engine: String,
}

impl UnsupportedEngineStep {
    pub fn new(engine: impl Into<String>) -> Self {
        let engine = engine.into();
        Self {
            name: format!("packager-{}", engine),
            engine,
        }
    }
}

#[async_trait]
impl Step for UnsupportedEngineStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        ctx.logger.warn(format!(
            "Packaging engine '{}' is not supported yet, nothing to do",
            self.engine
        ));
        Ok(())
    }
}
