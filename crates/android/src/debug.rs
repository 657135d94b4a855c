//! `debug`: enable WebView inspection for the Android build

use crate::capacitor::{self, CAPACITOR_CONFIG};
use crate::project::AndroidProject;
use crate::tools::Toolbox;
use async_trait::async_trait;
use deploid_core::{Context, Result, Step};

#[derive(Debug, Clone, Default)]
pub struct DebugStep {
    tools: Toolbox,
}

impl DebugStep {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Step for DebugStep {
    fn name(&self) -> &str {
        "debug"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let path = ctx.path(CAPACITOR_CONFIG);
        let existing = capacitor::read_config(&path)?;
        let mut value = capacitor::merged_config(existing, &ctx.config);
        capacitor::enable_debugging(&mut value);
        capacitor::write_config(&path, &value)?;
        ctx.logger.info("WebView debugging enabled in capacitor.config.json");

        if AndroidProject::for_context(ctx).exists() {
            capacitor::sync(ctx, &self.tools.capacitor, "android").await?;
        } else {
            ctx.logger
                .info("No android/ project yet; the setting applies on the next `deploid package`");
        }

        ctx.logger
            .success("Open chrome://inspect on the desktop to attach to the app's WebView");
        Ok(())
    }
}
