//! Paths inside the Capacitor iOS project

use deploid_core::Context;
use std::path::{Path, PathBuf};

/// Native project directory, relative to the project root
pub const IOS_DIR: &str = "ios";

/// Hand-off notes written next to the Xcode project
pub const HANDOFF_FILE: &str = "DEPLOID_IOS.md";

#[derive(Debug, Clone)]
pub struct IosProject {
    root: PathBuf,
}

impl IosProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn for_context(ctx: &Context) -> Self {
        Self::new(ctx.path(IOS_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// `ios/App/App.xcworkspace`
    pub fn workspace(&self) -> PathBuf {
        self.root.join("App").join("App.xcworkspace")
    }

    pub fn app_icon_set(&self) -> PathBuf {
        self.root
            .join("App")
            .join("App")
            .join("Assets.xcassets")
            .join("AppIcon.appiconset")
    }

    pub fn handoff(&self) -> PathBuf {
        self.root.join(HANDOFF_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let project = IosProject::new("/p/ios");
        assert_eq!(
            project.app_icon_set(),
            PathBuf::from("/p/ios/App/App/Assets.xcassets/AppIcon.appiconset")
        );
        assert_eq!(project.handoff(), PathBuf::from("/p/ios/DEPLOID_IOS.md"));
    }
}
