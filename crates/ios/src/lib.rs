//! iOS steps for deploid
//!
//! Deploid stops short of an iOS build: it adds the Capacitor platform,
//! fills the app icon set and writes instructions for finishing in Xcode.
//! - `ios-init`: `cap add ios`
//! - `ios-assets`: `AppIcon.appiconset`
//! - `ios-handoff`: `ios/DEPLOID_IOS.md`
//! - `ios`: all three, in that order

pub mod handoff;
pub mod icons;
pub mod init;
pub mod project;

pub use handoff::IosHandoffStep;
pub use icons::IosAssetsStep;
pub use init::IosInitStep;
pub use project::IosProject;

use async_trait::async_trait;
use deploid_android::Tool;
use deploid_core::{BoxedStep, Context, Pipeline, Result, Step};

/// The three iOS sub-steps as one step
pub struct IosStep {
    pipeline: Pipeline,
}

impl Default for IosStep {
    fn default() -> Self {
        Self::new(Tool::capacitor())
    }
}

impl IosStep {
    pub fn new(capacitor: Tool) -> Self {
        let steps: Vec<BoxedStep> = vec![
            Box::new(IosInitStep::new(capacitor)),
            Box::new(IosAssetsStep),
            Box::new(IosHandoffStep),
        ];
        Self {
            pipeline: Pipeline::new(steps),
        }
    }

    pub fn step_names(&self) -> Vec<String> {
        self.pipeline.names()
    }
}

#[async_trait]
impl Step for IosStep {
    fn name(&self) -> &str {
        "ios"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        self.pipeline.run(ctx).await?;
        ctx.logger.success("iOS skeleton ready");
        Ok(())
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testing::{calls, recorder};
    use deploid_core::testing::demo_context;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sub_step_order() {
        assert_eq!(
            IosStep::default().step_names(),
            ["ios-init", "ios-assets", "ios-handoff"]
        );
    }

    #[tokio::test]
    async fn test_runs_all_sub_steps() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let (ctx, buffer) = demo_context(dir.path());

        IosStep::new(recorder("cap", &log)).run(&ctx).await.unwrap();

        assert_eq!(calls(&log), ["cap add ios"]);
        assert!(fs::read_to_string(dir.path().join("ios/DEPLOID_IOS.md"))
            .unwrap()
            .contains("Demo on iOS"));
        let out = buffer.contents();
        assert!(out.contains("warn: Icon source not found"));
        assert!(out.contains("iOS skeleton ready"));
    }
}
