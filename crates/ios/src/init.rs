//! `ios-init`: add the Capacitor iOS platform

use crate::project::IosProject;
use async_trait::async_trait;
use deploid_android::capacitor::{self, CAPACITOR_CONFIG};
use deploid_android::Tool;
use deploid_core::{Context, Result, Step};

#[derive(Debug, Clone)]
pub struct IosInitStep {
    capacitor: Tool,
}

impl Default for IosInitStep {
    fn default() -> Self {
        Self::new(Tool::capacitor())
    }
}

impl IosInitStep {
    pub fn new(capacitor: Tool) -> Self {
        Self { capacitor }
    }
}

#[async_trait]
impl Step for IosInitStep {
    fn name(&self) -> &str {
        "ios-init"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let project = IosProject::for_context(ctx);
        if project.exists() {
            ctx.logger.info(format!(
                "iOS project already present at {}",
                project.root().display()
            ));
            return Ok(());
        }

        // `cap add` refuses to run without a config
        let config_path = ctx.path(CAPACITOR_CONFIG);
        if capacitor::read_config(&config_path)?.is_none() {
            let value = capacitor::merged_config(None, &ctx.config);
            capacitor::write_config(&config_path, &value)?;
            ctx.logger.info(format!("Created {}", CAPACITOR_CONFIG));
        }

        capacitor::add_platform(ctx, &self.capacitor, "ios").await?;
        ctx.logger.success("iOS platform added");
        Ok(())
    }
}
