//! Table of the steps compiled into the binary

use deploid_android::{
    BuildStep, CapacitorPackager, DebugStep, DeployStep, DevicesStep, FirebaseStep, LogsStep,
    PublishStep, Toolbox, UninstallStep, UnsupportedEngineStep,
};
use deploid_assets::AssetsStep;
use deploid_core::{BoxedStep, BundledSteps, StepId};
use deploid_ios::{IosAssetsStep, IosHandoffStep, IosInitStep, IosStep};

/// Packaging engine with a real implementation
const CAPACITOR: &str = "capacitor";

/// Maps every [`StepId`] to its implementation
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    tools: Toolbox,
}

impl BundledSteps for Builtins {
    fn resolve(&self, id: &StepId) -> Option<BoxedStep> {
        let tools = self.tools.clone();
        let step: BoxedStep = match id {
            StepId::Assets => Box::new(AssetsStep),
            StepId::Packager(engine) if engine == CAPACITOR => {
                Box::new(CapacitorPackager::new(tools))
            }
            StepId::Packager(engine) => Box::new(UnsupportedEngineStep::new(engine.clone())),
            StepId::Build => Box::new(BuildStep::new(tools)),
            StepId::Debug => Box::new(DebugStep::new(tools)),
            StepId::Deploy => Box::new(DeployStep::new(tools)),
            StepId::Devices => Box::new(DevicesStep::new(tools)),
            StepId::Logs => Box::new(LogsStep::new(tools)),
            StepId::Uninstall => Box::new(UninstallStep::new(tools)),
            StepId::Ios => Box::new(IosStep::new(tools.capacitor)),
            StepId::IosInit => Box::new(IosInitStep::new(tools.capacitor)),
            StepId::IosAssets => Box::new(IosAssetsStep),
            StepId::IosHandoff => Box::new(IosHandoffStep),
            StepId::Firebase => Box::new(FirebaseStep::new(tools)),
            StepId::Publish => Box::new(PublishStep::new(tools)),
        };
        Some(step)
    }
}
