//! Well-known paths inside the generated Android project

use deploid_core::Context;
use std::path::{Path, PathBuf};

/// Native project directory, relative to the project root
pub const ANDROID_DIR: &str = "android";

/// Launcher densities shared with the asset generator
pub const MIPMAP_DENSITIES: [&str; 5] = ["mdpi", "hdpi", "xhdpi", "xxhdpi", "xxxhdpi"];

/// Layout of `android/` as created by `cap add android`
#[derive(Debug, Clone)]
pub struct AndroidProject {
    root: PathBuf,
}

impl AndroidProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn for_context(ctx: &Context) -> Self {
        Self::new(ctx.path(ANDROID_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn manifest(&self) -> PathBuf {
        self.main_dir().join("AndroidManifest.xml")
    }

    pub fn styles(&self) -> PathBuf {
        self.res_dir().join("values").join("styles.xml")
    }

    pub fn res_dir(&self) -> PathBuf {
        self.main_dir().join("res")
    }

    pub fn variables_gradle(&self) -> PathBuf {
        self.root.join("variables.gradle")
    }

    pub fn root_gradle(&self) -> PathBuf {
        self.root.join("build.gradle")
    }

    pub fn app_gradle(&self) -> PathBuf {
        self.root.join("app").join("build.gradle")
    }

    pub fn google_services(&self) -> PathBuf {
        self.root.join("app").join("google-services.json")
    }

    fn main_dir(&self) -> PathBuf {
        self.root.join("app").join("src").join("main")
    }
}
